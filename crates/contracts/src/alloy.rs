use alloy::primitives::{Address, address};

/// Factory that deploys contracts at addresses derived only from a salt, the
/// same on every network it is deployed on.
pub const DEPLOY_FACTORY: Address = address!("0x6258e4d2950757A749a4d4683A7342261ce12471");

alloy::sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IDeployFactory {
        function deploy(bytes32 salt, bytes memory creationCode, uint256 value) external;
        function getAddress(bytes32 salt) external view returns (address);
    }
}

alloy::sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface LightNode {
        function initialize(uint256 chainId, address controller, address mptVerify) external;
        function updateBlockHeader(bytes memory blockHeader) external;
        function verifyProofData(bytes memory receiptProof)
            external
            view
            returns (bool success, string memory message, bytes memory logs);
    }
}

alloy::sol! {
    #[allow(missing_docs)]
    contract LightNodeProxy {
        constructor(address logic, bytes data);
    }
}

/// Names of the compiled artifacts the light client is bootstrapped from.
pub mod artifacts {
    pub const MPT_VERIFY: &str = "MPTVerify";
    pub const LIGHT_NODE: &str = "LightNode";
    pub const LIGHT_NODE_PROXY: &str = "LightNodeProxy";
}

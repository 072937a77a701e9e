//! Deploys contracts at salt-derived addresses through a deploy factory and
//! skips deployments whose address is already occupied.

use {
    crate::{
        error::Error,
        transaction::{self, TxOutcome},
    },
    alloy::{
        primitives::{Address, B256, Bytes, U256, keccak256},
        providers::{DynProvider, Provider},
    },
    contracts::alloy::IDeployFactory,
    std::{sync::Arc, time::Duration},
};

/// The on-chain factory that deploys contracts at addresses derived from a
/// salt alone.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DeployFactory: Send + Sync {
    /// Address of the factory contract itself.
    fn address(&self) -> Address;

    /// Returns the address a deployment with `salt` ends up at. Read only.
    async fn get_address(&self, salt: B256) -> Result<Address, Error>;

    /// Submits a deployment of `creation_code` and waits for its receipt.
    async fn deploy(&self, salt: B256, creation_code: Bytes) -> Result<TxOutcome, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CodeFetching: Send + Sync {
    /// Fetches the runtime code at the specified address.
    async fn code(&self, address: Address) -> Result<Bytes, Error>;
}

#[async_trait::async_trait]
impl CodeFetching for DynProvider {
    async fn code(&self, address: Address) -> Result<Bytes, Error> {
        Ok(self.get_code_at(address).await?)
    }
}

pub struct OnchainFactory {
    instance: IDeployFactory::IDeployFactoryInstance<DynProvider>,
    receipt_timeout: Duration,
}

impl OnchainFactory {
    pub fn new(address: Address, provider: DynProvider, receipt_timeout: Duration) -> Self {
        Self {
            instance: IDeployFactory::new(address, provider),
            receipt_timeout,
        }
    }
}

#[async_trait::async_trait]
impl DeployFactory for OnchainFactory {
    fn address(&self) -> Address {
        *self.instance.address()
    }

    async fn get_address(&self, salt: B256) -> Result<Address, Error> {
        Ok(self.instance.getAddress(salt).call().await?)
    }

    async fn deploy(&self, salt: B256, creation_code: Bytes) -> Result<TxOutcome, Error> {
        let pending = self
            .instance
            .deploy_call(salt, creation_code, U256::ZERO)
            .send()
            .await?;
        transaction::wait_for_outcome(pending, self.receipt_timeout).await
    }
}

/// Hashes an operator chosen salt into the 32 bytes the factory expects.
pub fn salt_hash(salt: &str) -> B256 {
    keccak256(salt.as_bytes())
}

/// Result of [`DeterministicDeployer::deploy_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    /// Whether this call deployed the contract, as opposed to finding it
    /// already deployed.
    pub redeployed: bool,
}

pub struct DeterministicDeployer {
    factory: Arc<dyn DeployFactory>,
    code: Arc<dyn CodeFetching>,
}

impl DeterministicDeployer {
    pub fn new(factory: Arc<dyn DeployFactory>, code: Arc<dyn CodeFetching>) -> Self {
        Self { factory, code }
    }

    /// Deploys `creation_code || constructor_params` at the address derived
    /// from `salt` unless that address already holds code.
    ///
    /// Never submits a transaction for an occupied address. Errors are not
    /// retried; rerunning after any failure is safe because the existence
    /// check runs again.
    pub async fn deploy_if_absent(
        &self,
        salt: &str,
        creation_code: &[u8],
        constructor_params: &[u8],
    ) -> Result<Deployment, Error> {
        if salt.is_empty() {
            return Err(Error::EmptySalt);
        }
        let salt_hash = salt_hash(salt);
        tracing::info!(factory = ?self.factory.address(), salt, "deploying");

        let address = self.factory.get_address(salt_hash).await?;
        tracing::debug!(salt, ?address, "derived deployment address");

        let code = self.code.code(address).await?;
        if !code.is_empty() {
            tracing::info!(
                salt,
                ?address,
                "already deployed, change the salt to deploy another contract"
            );
            return Ok(Deployment {
                address,
                redeployed: false,
            });
        }

        let payload: Bytes = [creation_code, constructor_params].concat().into();
        let outcome = self
            .factory
            .deploy(salt_hash, payload)
            .await
            .map_err(|source| Error::DeploymentRejected {
                salt: salt.to_string(),
                address,
                source: Box::new(source),
            })?;
        match outcome {
            TxOutcome::Success(tx_hash) => {
                tracing::info!(salt, ?address, ?tx_hash, "deployed");
                Ok(Deployment {
                    address,
                    redeployed: true,
                })
            }
            TxOutcome::Reverted(tx_hash) => {
                tracing::error!(salt, ?address, ?tx_hash, "deployment reverted");
                Err(Error::DeploymentFailed {
                    salt: salt.to_string(),
                    address,
                    tx_hash,
                })
            }
            TxOutcome::Timeout { tx_hash, after } => {
                tracing::warn!(salt, ?address, ?tx_hash, "deployment not mined in time");
                Err(Error::ReceiptTimeout {
                    tx_hash,
                    timeout: after,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::{TxHash, address},
            sol_types::SolCall,
        },
        mockall::{Sequence, predicate::eq},
        std::sync::Mutex,
    };

    const DERIVED: Address = address!("0xAbc0000000000000000000000000000000000001");
    const CREATION_CODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];
    const PARAMS: [u8; 2] = [0xbe, 0xef];

    fn factory_deriving(address: Address) -> MockDeployFactory {
        let mut factory = MockDeployFactory::new();
        factory.expect_address().return_const(Address::repeat_byte(0xfa));
        factory
            .expect_get_address()
            .with(eq(salt_hash("impl-v1")))
            .returning(move |_| Ok(address));
        factory
    }

    fn deployer(factory: MockDeployFactory, code: MockCodeFetching) -> DeterministicDeployer {
        DeterministicDeployer::new(Arc::new(factory), Arc::new(code))
    }

    #[test]
    fn salt_hash_is_keccak_of_utf8() {
        assert_eq!(salt_hash("impl-v1"), keccak256(b"impl-v1"));
        assert_ne!(salt_hash("impl-v1"), salt_hash("impl-v2"));
    }

    #[test]
    fn onchain_factory_encodes_deploy_call() {
        // First anvil development account.
        let signer = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap();
        let provider = ethrpc::alloy::provider_with_signer(
            &"http://localhost:8545".parse().unwrap(),
            "test",
            signer,
        );
        let factory = OnchainFactory::new(
            contracts::alloy::DEPLOY_FACTORY,
            provider,
            Duration::from_secs(1),
        );
        assert_eq!(factory.address(), contracts::alloy::DEPLOY_FACTORY);

        let call = factory.instance.deploy_call(
            salt_hash("impl-v1"),
            Bytes::from_static(&CREATION_CODE),
            U256::ZERO,
        );
        assert_eq!(
            IDeployFactory::deployCall::SIGNATURE,
            "deploy(bytes32,bytes,uint256)"
        );
        assert_eq!(
            &call.calldata()[..4],
            IDeployFactory::deployCall::SELECTOR.as_slice()
        );
    }

    #[tokio::test]
    async fn deploys_when_address_is_empty() {
        let mut factory = factory_deriving(DERIVED);
        factory
            .expect_deploy()
            .times(1)
            .withf(|salt, payload| {
                *salt == salt_hash("impl-v1")
                    && *payload == Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0xbe, 0xef])
            })
            .returning(|_, _| Ok(TxOutcome::Success(TxHash::repeat_byte(1))));
        let mut code = MockCodeFetching::new();
        code.expect_code()
            .with(eq(DERIVED))
            .returning(|_| Ok(Bytes::new()));

        let deployment = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &PARAMS)
            .await
            .unwrap();
        assert_eq!(
            deployment,
            Deployment {
                address: DERIVED,
                redeployed: true
            }
        );
    }

    #[tokio::test]
    async fn never_deploys_over_existing_code() {
        let mut factory = factory_deriving(DERIVED);
        factory.expect_deploy().never();
        let mut code = MockCodeFetching::new();
        code.expect_code()
            .with(eq(DERIVED))
            .returning(|_| Ok(Bytes::from_static(&[0x60, 0x80])));

        let deployment = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &[])
            .await
            .unwrap();
        assert_eq!(
            deployment,
            Deployment {
                address: DERIVED,
                redeployed: false
            }
        );
    }

    #[tokio::test]
    async fn second_call_is_idempotent() {
        // The chain starts out empty and holds code after the first deployment.
        let deployed = Arc::new(Mutex::new(false));

        let mut factory = factory_deriving(DERIVED);
        let flag = deployed.clone();
        factory.expect_deploy().times(1).returning(move |_, _| {
            *flag.lock().unwrap() = true;
            Ok(TxOutcome::Success(TxHash::repeat_byte(1)))
        });
        let mut code = MockCodeFetching::new();
        let flag = deployed.clone();
        code.expect_code().times(2).returning(move |_| {
            Ok(if *flag.lock().unwrap() {
                Bytes::from_static(&[0x60])
            } else {
                Bytes::new()
            })
        });

        let deployer = deployer(factory, code);
        let first = deployer
            .deploy_if_absent("impl-v1", &CREATION_CODE, &PARAMS)
            .await
            .unwrap();
        let second = deployer
            .deploy_if_absent("impl-v1", &CREATION_CODE, &PARAMS)
            .await
            .unwrap();
        assert_eq!(first.address, second.address);
        assert!(first.redeployed);
        assert!(!second.redeployed);
    }

    #[tokio::test]
    async fn reverted_receipt_is_a_deployment_failure() {
        let mut factory = factory_deriving(DERIVED);
        factory
            .expect_deploy()
            .returning(|_, _| Ok(TxOutcome::Reverted(TxHash::repeat_byte(2))));
        let mut code = MockCodeFetching::new();
        code.expect_code().returning(|_| Ok(Bytes::new()));

        let err = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DeploymentFailed { ref salt, address, tx_hash }
                if salt == "impl-v1" && address == DERIVED && tx_hash == TxHash::repeat_byte(2)
        ));
    }

    #[tokio::test]
    async fn missing_receipt_is_retryable() {
        let mut factory = factory_deriving(DERIVED);
        factory.expect_deploy().returning(|_, _| {
            Ok(TxOutcome::Timeout {
                tx_hash: TxHash::repeat_byte(3),
                after: Duration::from_secs(300),
            })
        });
        let mut code = MockCodeFetching::new();
        code.expect_code().returning(|_| Ok(Bytes::new()));

        let err = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReceiptTimeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn rejected_submission_names_salt_and_address() {
        let mut factory = factory_deriving(DERIVED);
        factory.expect_deploy().times(1).returning(|_, _| {
            Err(Error::Contract(anyhow::anyhow!("execution reverted")))
        });
        let mut code = MockCodeFetching::new();
        code.expect_code().returning(|_| Ok(Bytes::new()));

        let err = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &PARAMS)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DeploymentRejected { ref salt, address, .. }
                if salt == "impl-v1" && address == DERIVED
        ));
        assert!(!err.is_retryable());
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert!(chain.contains("\"impl-v1\""), "{chain}");
        assert!(chain.contains(&DERIVED.to_string()), "{chain}");
        assert!(chain.contains("execution reverted"), "{chain}");
    }

    #[tokio::test]
    async fn submission_node_errors_stay_retryable() {
        let mut factory = factory_deriving(DERIVED);
        factory.expect_deploy().returning(|_, _| {
            Err(Error::NetworkUnavailable(anyhow::anyhow!("connection reset")))
        });
        let mut code = MockCodeFetching::new();
        code.expect_code().returning(|_| Ok(Bytes::new()));

        let err = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeploymentRejected { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn node_errors_are_propagated_before_any_submission() {
        let mut factory = factory_deriving(DERIVED);
        factory.expect_deploy().never();
        let mut code = MockCodeFetching::new();
        code.expect_code()
            .returning(|_| Err(Error::NetworkUnavailable(anyhow::anyhow!("connection refused"))));

        let err = deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn checks_existence_before_submitting() {
        let mut seq = Sequence::new();
        let mut factory = MockDeployFactory::new();
        factory.expect_address().return_const(Address::ZERO);
        factory
            .expect_get_address()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(DERIVED));
        let mut code = MockCodeFetching::new();
        code.expect_code()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Bytes::new()));
        factory
            .expect_deploy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(TxOutcome::Success(TxHash::ZERO)));

        deployer(factory, code)
            .deploy_if_absent("impl-v1", &CREATION_CODE, &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_empty_salt() {
        let mut factory = MockDeployFactory::new();
        factory.expect_get_address().never();
        factory.expect_deploy().never();
        let err = deployer(factory, MockCodeFetching::new())
            .deploy_if_absent("", &CREATION_CODE, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptySalt));
    }
}

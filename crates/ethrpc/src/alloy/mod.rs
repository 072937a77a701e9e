pub mod errors;
mod instrumentation;

use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::{ClientBuilder, RpcClient},
        signers::local::PrivateKeySigner,
    },
    instrumentation::{InstrumentationLayer, LabelingLayer},
    url::Url,
};

fn client(url: &Url, label: &str) -> RpcClient {
    ClientBuilder::default()
        .layer(LabelingLayer {
            label: label.into(),
        })
        .layer(InstrumentationLayer)
        .http(url.clone())
}

/// Creates a provider that fills in nonce, gas and chain id and signs every
/// transaction it sends with `signer`.
pub fn provider_with_signer(url: &Url, label: &str, signer: PrivateKeySigner) -> AlloyProvider {
    let wallet = EthereumWallet::new(signer);
    ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(client(url, label))
        .erased()
}

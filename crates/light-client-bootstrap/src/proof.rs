//! Retrieval of receipt proofs for transactions on the chain the light client
//! follows.

use {
    crate::error::Error,
    alloy::primitives::{Bytes, TxHash},
    anyhow::Context,
    serde::Deserialize,
    url::Url,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProofSource: Send + Sync {
    /// Returns the serialized Merkle-Patricia-Trie proof for the receipt of
    /// `tx_hash`, built from the node at `rpc`.
    async fn get_proof(&self, tx_hash: TxHash, rpc: &Url) -> Result<Bytes, Error>;
}

/// Fetches proofs from an HTTP proof service:
/// `GET {url}?tx_hash=<hash>&rpc=<node url>` answering `{"proof": "0x.."}`.
pub struct HttpProofSource {
    client: reqwest::Client,
    url: Url,
}

#[derive(Deserialize)]
struct ProofResponse {
    proof: Bytes,
}

impl HttpProofSource {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    fn request_url(&self, tx_hash: TxHash, rpc: &Url) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("tx_hash", &tx_hash.to_string())
            .append_pair("rpc", rpc.as_str());
        url
    }
}

#[async_trait::async_trait]
impl ProofSource for HttpProofSource {
    async fn get_proof(&self, tx_hash: TxHash, rpc: &Url) -> Result<Bytes, Error> {
        let url = self.request_url(tx_hash, rpc);
        tracing::debug!(?tx_hash, %url, "fetching proof");
        let fetch = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .context("sending request")?
                .error_for_status()
                .context("proof service status")?;
            let response: ProofResponse = response.json().await.context("decoding response")?;
            anyhow::Ok(response.proof)
        };
        fetch.await.map_err(Error::ProofUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_request_parameters() {
        let source = HttpProofSource::new(
            reqwest::Client::new(),
            "http://localhost:8080/proof".parse().unwrap(),
        );
        let url = source.request_url(
            TxHash::repeat_byte(0x11),
            &"https://rpc.example.org/".parse().unwrap(),
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("tx_hash".to_string(), TxHash::repeat_byte(0x11).to_string()),
                ("rpc".to_string(), "https://rpc.example.org/".to_string()),
            ]
        );
    }

    #[test]
    fn decodes_response() {
        let response: ProofResponse = serde_json::from_str(r#"{"proof": "0x0102"}"#).unwrap();
        assert_eq!(response.proof, Bytes::from_static(&[1, 2]));
    }
}

use {
    crate::error::Error,
    alloy::{
        network::Ethereum,
        primitives::TxHash,
        providers::{PendingTransactionBuilder, PendingTransactionError, WatchTxError},
    },
    std::time::Duration,
};

/// How a submitted transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Success(TxHash),
    Reverted(TxHash),
    /// No receipt arrived within the configured wait.
    Timeout { tx_hash: TxHash, after: Duration },
}

/// Waits for the receipt of a submitted transaction for at most `timeout`.
pub(crate) async fn wait_for_outcome(
    pending: PendingTransactionBuilder<Ethereum>,
    timeout: Duration,
) -> Result<TxOutcome, Error> {
    let tx_hash = *pending.tx_hash();
    tracing::debug!(?tx_hash, ?timeout, "waiting for receipt");
    match pending.with_timeout(Some(timeout)).get_receipt().await {
        Ok(receipt) if receipt.status() => Ok(TxOutcome::Success(tx_hash)),
        Ok(_) => Ok(TxOutcome::Reverted(tx_hash)),
        Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout)) => Ok(TxOutcome::Timeout {
            tx_hash,
            after: timeout,
        }),
        Err(err) => Err(Error::NetworkUnavailable(err.into())),
    }
}

//! Waiting for transactions to be mined, bounded by a timeout and an external
//! cancellation signal.

use {
    crate::blockchain::{Blockchain, TransactionStatus},
    alloy::primitives::TxHash,
    std::{future::Future, time::Duration},
    thiserror::Error,
    tokio::sync::watch,
};

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[error("cancelled")]
pub struct Cancelled;

/// Triggers the [`Cancellation`]s created with it.
#[derive(Debug)]
pub struct CancellationHandle(watch::Sender<bool>);

impl CancellationHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Observes whether the surrounding operation was abandoned. Cancelling only
/// stops waiting, it never undoes transactions that were already sent.
#[derive(Debug, Clone)]
pub struct Cancellation(watch::Receiver<bool>);

impl Cancellation {
    pub fn new() -> (CancellationHandle, Self) {
        let (sender, receiver) = watch::channel(false);
        (CancellationHandle(sender), Self(receiver))
    }

    /// A cancellation that never triggers.
    pub fn never() -> Self {
        Self::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle was dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut receiver = self.0.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            futures::future::pending::<()>().await;
        }
    }

    /// Runs `future` unless cancelled first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Cancelled> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("transaction {tx} not mined within {timeout:?}")]
    Timeout { tx: TxHash, timeout: Duration },
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("stopped waiting for transaction {0}")]
    Cancelled(TxHash),
    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

#[derive(Clone, Copy, Debug)]
pub struct Confirmation {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Confirmation {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl Confirmation {
    /// Polls the receipt of `tx` until it is mined.
    pub async fn wait(
        &self,
        chain: &dyn Blockchain,
        tx: TxHash,
        cancellation: &Cancellation,
    ) -> Result<(), WaitError> {
        let poll = async {
            loop {
                match chain.transaction_status(tx).await? {
                    TransactionStatus::Mined => return Ok(()),
                    TransactionStatus::Reverted => return Err(WaitError::Reverted(tx)),
                    TransactionStatus::Pending => {
                        tracing::trace!(%tx, "transaction pending");
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        };
        match cancellation.run(tokio::time::timeout(self.timeout, poll)).await {
            Ok(Ok(result)) => result,
            Ok(Err(_elapsed)) => Err(WaitError::Timeout {
                tx,
                timeout: self.timeout,
            }),
            Err(Cancelled) => Err(WaitError::Cancelled(tx)),
        }
    }
}

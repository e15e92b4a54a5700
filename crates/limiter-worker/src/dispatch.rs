//! Dispatch channel
//!
//! A zero-capacity handoff between the producer and the workers. The producer
//! waits in [`DispatchSender::dispatch`] until some worker has taken the task,
//! so production pauses while every worker is busy.

use std::sync::Arc;

use limiter_core::Task;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};

/// A task travelling to a worker, with the handle used to confirm receipt
struct Handoff {
    task: Task,
    accepted: oneshot::Sender<()>,
}

/// Dispatch failed because no worker is left to receive
#[derive(Error, Debug)]
#[error("no worker accepted task {sequence_id}")]
pub struct DispatchError {
    pub sequence_id: usize,
}

/// Create a connected sender/receiver pair
pub fn channel() -> (DispatchSender, DispatchReceiver) {
    // One buffered slot holds the handoff while the producer waits for the
    // acknowledgement, so the task never sits unclaimed once dispatch returns.
    let (tx, rx) = mpsc::channel(1);
    (
        DispatchSender { tx },
        DispatchReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side; dropping it (or calling [`close`](Self::close)) closes the channel
pub struct DispatchSender {
    tx: mpsc::Sender<Handoff>,
}

impl DispatchSender {
    /// Hand `task` to a worker and wait until one has accepted it
    pub async fn dispatch(&self, task: Task) -> Result<(), DispatchError> {
        let sequence_id = task.sequence_id;
        let (accepted, on_accept) = oneshot::channel();

        self.tx
            .send(Handoff { task, accepted })
            .await
            .map_err(|_| DispatchError { sequence_id })?;

        on_accept.await.map_err(|_| DispatchError { sequence_id })
    }

    /// Close the channel; workers drain and stop
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer side, shared by all workers
#[derive(Clone)]
pub struct DispatchReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Handoff>>>,
}

impl DispatchReceiver {
    /// Wait for the next task.
    ///
    /// Returns `None` once the sender is closed and nothing is left.
    pub async fn recv(&self) -> Option<Task> {
        let handoff = {
            let mut rx = self.rx.lock().await;
            rx.recv().await?
        };
        // The producer may have given up waiting; the task still runs.
        let _ = handoff.accepted.send(());
        Some(handoff.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatch_waits_for_receiver() {
        let (tx, rx) = channel();

        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            tx.dispatch(Task::new(0, 1, "echo a")),
        )
        .await;
        assert!(pending.is_err(), "dispatch returned without a receiver");

        let producer = tokio::spawn(async move {
            tx.dispatch(Task::new(1, 2, "echo b")).await.unwrap();
        });

        // The timed-out handoff was left in the slot; it is received first.
        assert_eq!(rx.recv().await.unwrap().command, "echo a");
        assert_eq!(rx.recv().await.unwrap().command, "echo b");
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_ends_receivers() {
        let (tx, rx) = channel();
        let other = rx.clone();

        let producer = tokio::spawn(async move {
            tx.dispatch(Task::new(0, 1, "only")).await.unwrap();
            tx.close();
        });

        let first = rx.recv().await;
        producer.await.unwrap();
        assert_eq!(first.unwrap().command, "only");
        assert!(rx.recv().await.is_none());
        assert!(other.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_fails_without_workers() {
        let (tx, rx) = channel();
        drop(rx);

        let err = tx.dispatch(Task::new(7, 9, "echo")).await.unwrap_err();
        assert_eq!(err.sequence_id, 7);
    }
}

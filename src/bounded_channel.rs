// SPDX-License-Identifier: Apache-2.0

use flume::{Receiver, Sender};
use std::fmt;

/// Sending half of a bounded channel between pipeline components. Sends wait
/// for capacity, which is how back pressure reaches a receiver.
pub struct BoundedSender<T> {
    tx: Sender<T>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendError {
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Disconnected => write!(f, "channel disconnected"),
        }
    }
}

impl std::error::Error for SendError {}

impl<T> BoundedSender<T> {
    pub async fn send(&self, item: T) -> Result<(), SendError> {
        self.tx
            .send_async(item)
            .await
            .map_err(|_| SendError::Disconnected) // receiver closed
    }

    pub fn is_disconnected(&self) -> bool {
        self.tx.is_disconnected()
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl<T> Clone for BoundedSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for BoundedSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedSender")
            .field("len", &self.tx.len())
            .field("capacity", &self.tx.capacity())
            .finish()
    }
}

pub struct BoundedReceiver<T> {
    rx: Receiver<T>,
}

impl<T> BoundedReceiver<T> {
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }

    /// Returns immediately with None when nothing is queued or the channel is
    /// disconnected.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

pub fn bounded<T>(size: usize) -> (BoundedSender<T>, BoundedReceiver<T>) {
    let (tx, rx) = flume::bounded::<T>(size);

    (BoundedSender { tx }, BoundedReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::{SendError, bounded};
    use tokio_test::{assert_ok, assert_pending, assert_ready, task::spawn};

    #[tokio::test]
    async fn send_then_receive() {
        let (tx, mut rx) = bounded(2);

        assert_ok!(tx.send(1).await);
        assert_ok!(tx.send(2).await);
        assert_eq!(2, rx.len());

        assert_eq!(Some(1), rx.next().await);
        assert_eq!(Some(2), rx.try_recv());
        assert!(rx.is_empty());

        drop(tx);
        assert_eq!(None, rx.next().await);
    }

    #[tokio::test]
    async fn sender_waits_for_capacity() {
        let (tx, mut rx) = bounded(1);

        assert_ok!(tx.send(10).await);

        let mut send2 = spawn(async { tx.send(11).await });
        assert_pending!(send2.poll());

        assert_eq!(Some(10), rx.next().await);
        assert_ok!(assert_ready!(send2.poll()));
    }

    #[tokio::test]
    async fn sender_fails_on_rx_close() {
        let (tx, rx) = bounded(1);
        drop(rx);

        assert!(tx.is_disconnected());
        assert_eq!(Err(SendError::Disconnected), tx.send(10).await);
    }
}

// SPDX-License-Identifier: Apache-2.0

use crate::bounded_channel::BoundedSender;
use thiserror::Error;

/// Distributes each batch to every downstream consumer of a stage.
///
/// Batches are sent to consumers one at a time, in the order they were
/// configured. Every consumer but the last gets a clone; the last one takes
/// the original batch.
#[derive(Debug)]
pub struct Fanout<T> {
    consumers: Vec<BoundedSender<Vec<T>>>,
}

impl<T> Clone for Fanout<T> {
    fn clone(&self) -> Self {
        Self {
            consumers: self.consumers.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FanoutError {
    #[error("At least one consumer must be added to the fanout")]
    NoConsumers,

    /// Index of the first consumer that failed. Later consumers were not sent to.
    #[error("Consumer at index {0} is disconnected")]
    Disconnected(usize),
}

impl<T: Clone> Fanout<T> {
    pub fn new(consumers: Vec<BoundedSender<Vec<T>>>) -> Result<Self, FanoutError> {
        if consumers.is_empty() {
            return Err(FanoutError::NoConsumers);
        }

        Ok(Self { consumers })
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub async fn send(&self, batch: Vec<T>) -> Result<(), FanoutError> {
        let last = self.consumers.len() - 1;
        let mut batch = Some(batch);

        for (idx, tx) in self.consumers.iter().enumerate() {
            let item = if idx == last {
                batch.take().unwrap_or_default()
            } else {
                batch.as_ref().cloned().unwrap_or_default()
            };

            if tx.send(item).await.is_err() {
                return Err(FanoutError::Disconnected(idx));
            }
        }

        Ok(())
    }
}

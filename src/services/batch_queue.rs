//! Bounded hand-off between the detection worker and the overlay renderer.
//!
//! The producer never blocks: when the queue is full the batch being published
//! is discarded and the ones already queued stay. The consumer drains
//! everything that is queued and keeps only the newest batch.

use crate::model::DetectionBatch;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::debug_if_enabled;

/// Ёмкость очереди по умолчанию
pub const DEFAULT_CAPACITY: usize = 3;

/// Результат неблокирующей публикации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Очередь заполнена, новый батч отброшен
    Dropped,
    /// Потребитель закрыт
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct BatchSender {
    inner: Sender<DetectionBatch>,
}

#[derive(Debug, Clone)]
pub struct BatchReceiver {
    inner: Receiver<DetectionBatch>,
}

/// Создать очередь; нулевая ёмкость заменяется на 1, чтобы очередь не стала rendezvous-каналом
pub fn bounded(capacity: usize) -> (BatchSender, BatchReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (BatchSender { inner: tx }, BatchReceiver { inner: rx })
}

impl BatchSender {
    pub fn try_publish(&self, batch: DetectionBatch) -> PublishOutcome {
        match self.inner.try_send(batch) {
            Ok(()) => PublishOutcome::Published,
            Err(TrySendError::Full(batch)) => {
                debug_if_enabled!(
                    "Очередь детекций заполнена ({}), батч кадра {} отброшен",
                    self.inner.len(),
                    batch.sequence()
                );
                PublishOutcome::Dropped
            }
            Err(TrySendError::Disconnected(_)) => PublishOutcome::Disconnected,
        }
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl BatchReceiver {
    /// Забрать всё из очереди и вернуть только последний батч
    pub fn drain_latest(&self) -> Option<DetectionBatch> {
        self.inner.try_iter().last()
    }
}

use crate::config::Config;
use crate::model::WindowHandle;
use crate::services::batch_queue::{self, BatchReceiver, BatchSender};
use crate::services::window_tracker::WindowTracker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Однонаправленный флаг остановки: выставляется UI-контекстом, читается воркером
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Общее состояние конвейера, которое передаётся явно, а не через глобальные переменные
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Arc<Config>,
    pub tracker: Arc<dyn WindowTracker>,
    pub target: WindowHandle,
    pub overlay: WindowHandle,
    pub stop: StopSignal,
    sender: BatchSender,
    receiver: BatchReceiver,
}

impl PipelineContext {
    pub fn new(
        config: Arc<Config>,
        tracker: Arc<dyn WindowTracker>,
        target: WindowHandle,
        overlay: WindowHandle,
    ) -> Self {
        let (sender, receiver) = batch_queue::bounded(config.pipeline.queue_capacity);
        Self {
            config,
            tracker,
            target,
            overlay,
            stop: StopSignal::new(),
            sender,
            receiver,
        }
    }

    /// Конец очереди для воркера
    pub fn publisher(&self) -> BatchSender {
        self.sender.clone()
    }

    /// Конец очереди для рендерера
    pub fn subscriber(&self) -> BatchReceiver {
        self.receiver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DetectionBatch;
    use crate::services::batch_queue::PublishOutcome;
    use crate::services::window_tracker::DryRunTracker;

    #[test]
    fn test_stop_signal_is_shared() {
        let stop = StopSignal::new();
        let observer = stop.clone();
        assert!(!observer.is_set());
        stop.signal();
        assert!(observer.is_set());
    }

    #[test]
    fn test_queue_ends_are_connected() {
        let tracker = Arc::new(DryRunTracker::new());
        let target = tracker.resolve("abc.png").unwrap();
        let overlay = tracker.resolve("balls-overlay").unwrap();
        let ctx = PipelineContext::new(Arc::new(Config::default()), tracker, target, overlay);

        let outcome = ctx.publisher().try_publish(DetectionBatch::new(Vec::new(), 4));
        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(ctx.subscriber().drain_latest().map(|b| b.sequence()), Some(4));
    }
}

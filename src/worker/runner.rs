use flume::{Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{ServiceWorker, WorkerEvent};
use crate::errors::{AppError, AppResult};

/// Sending side of a running worker
#[derive(Clone)]
pub struct WorkerHandle {
    events: Sender<WorkerEvent>,
    shutdown: Sender<()>,
}

impl WorkerHandle {
    pub fn dispatch(&self, event: WorkerEvent) -> AppResult<()> {
        self.events
            .send(event)
            .map_err(|_| AppError::internal("service worker is not running"))
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}

/// Event loop feeding a `ServiceWorker` from a channel until shutdown
pub struct WorkerRunner {
    worker: Arc<ServiceWorker>,
    events: Receiver<WorkerEvent>,
    shutdown: Receiver<()>,
}

impl WorkerRunner {
    pub fn new(worker: Arc<ServiceWorker>) -> (Self, WorkerHandle) {
        let (event_tx, event_rx) = flume::unbounded();
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);
        let runner = Self {
            worker,
            events: event_rx,
            shutdown: shutdown_rx,
        };
        let handle = WorkerHandle {
            events: event_tx,
            shutdown: shutdown_tx,
        };
        (runner, handle)
    }

    /// Run until shutdown or until every handle is dropped; returns events handled
    pub async fn run(self) -> usize {
        info!("Service worker loop started");
        let mut handled = 0;

        loop {
            tokio::select! {
                event = self.events.recv_async() => {
                    match event {
                        Ok(event) => {
                            self.process(event).await;
                            handled += 1;
                        }
                        Err(_) => {
                            debug!("All worker handles dropped");
                            break;
                        }
                    }
                }

                _ = self.shutdown.recv_async() => {
                    info!("Received shutdown signal, stopping service worker loop");
                    break;
                }
            }
        }

        // Events queued before shutdown still run
        for event in self.events.drain() {
            self.process(event).await;
            handled += 1;
        }

        info!("Service worker loop stopped after {} event(s)", handled);
        handled
    }

    async fn process(&self, event: WorkerEvent) {
        let name = event.name();
        if let Err(e) = self.worker.handle(event).await {
            error!("Failed to handle {} event: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingHost;

    #[tokio::test]
    async fn test_events_processed_until_shutdown() {
        let host = Arc::new(RecordingHost::default());
        let (runner, handle) = WorkerRunner::new(Arc::new(ServiceWorker::new(host.clone())));
        let task = tokio::spawn(runner.run());

        handle.dispatch(WorkerEvent::Install).unwrap();
        handle.dispatch(WorkerEvent::Activate).unwrap();
        handle.dispatch(WorkerEvent::Push { payload: None }).unwrap();
        crate::test_support::wait_until(|| host.shown().len() == 1).await;
        handle.shutdown();

        assert_eq!(task.await.unwrap(), 3);
        assert_eq!(host.calls(), vec!["skip_waiting", "claim_clients", "show_notification"]);
    }

    #[tokio::test]
    async fn test_loop_ends_when_handles_dropped() {
        let host = Arc::new(RecordingHost::default());
        let (runner, handle) = WorkerRunner::new(Arc::new(ServiceWorker::new(host)));
        handle.dispatch(WorkerEvent::Install).unwrap();
        drop(handle);

        assert_eq!(runner.run().await, 1);
    }

    #[tokio::test]
    async fn test_failed_event_does_not_stop_loop() {
        let host = Arc::new(RecordingHost::default());
        host.fail_show("quota exceeded");
        let (runner, handle) = WorkerRunner::new(Arc::new(ServiceWorker::new(host.clone())));

        handle.dispatch(WorkerEvent::Push { payload: None }).unwrap();
        handle.dispatch(WorkerEvent::Install).unwrap();
        drop(handle);

        assert_eq!(runner.run().await, 2);
        assert!(host.calls().contains(&"skip_waiting"));
    }

    #[tokio::test]
    async fn test_dispatch_after_stop_fails() {
        let host = Arc::new(RecordingHost::default());
        let (runner, handle) = WorkerRunner::new(Arc::new(ServiceWorker::new(host)));
        drop(runner);
        assert!(handle.dispatch(WorkerEvent::Install).is_err());
    }
}

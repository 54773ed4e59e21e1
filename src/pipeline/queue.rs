//! Shared work queues between pipeline stages.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

/// Multi-consumer view over one `mpsc` receiver.
///
/// Workers race on `recv`; each item goes to exactly one worker. `None`
/// means the queue is closed and drained, which is the only termination
/// signal a worker observes.
pub(crate) struct WorkQueue<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> WorkQueue<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Dequeue the next item, waiting while the queue is open but empty.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

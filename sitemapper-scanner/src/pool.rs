use crate::fetcher::Fetcher;
use crate::page::Page;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Queue of pages waiting to be fetched, shared by every worker.
type Frontier = Arc<Mutex<mpsc::Receiver<Page>>>;

/// A fixed set of workers pulling pages from the frontier, visiting them and
/// pushing them onto the completed queue.
///
/// Workers only talk to each other through the two queues.
pub struct WorkerPool {
    stop: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers on the current tokio runtime.
    pub fn start(
        count: usize,
        fetcher: Fetcher,
        frontier: mpsc::Receiver<Page>,
        completed: mpsc::Sender<Page>,
    ) -> Self {
        let stop = CancellationToken::new();
        let frontier: Frontier = Arc::new(Mutex::new(frontier));

        let handles = (0..count)
            .map(|worker_id| {
                tokio::spawn(work(
                    worker_id,
                    fetcher.clone(),
                    frontier.clone(),
                    completed.clone(),
                    stop.clone(),
                ))
            })
            .collect();

        Self { stop, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Tell every worker to stop. Returns immediately: in-flight fetches are
    /// abandoned and pages still queued on the frontier are never visited.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Stop the workers and wait for their tasks to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        join_all(self.handles.drain(..)).await;
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

async fn work(
    worker_id: usize,
    fetcher: Fetcher,
    frontier: Frontier,
    completed: mpsc::Sender<Page>,
    stop: CancellationToken,
) {
    debug!("Worker {} started", worker_id);

    loop {
        let next = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            page = next_page(&frontier) => page,
        };
        // Frontier closed, nothing more will arrive.
        let Some(mut page) = next else { break };

        debug!("[Worker {}] Visiting {}", worker_id, page.url);
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = fetcher.visit(&mut page) => {}
        }

        let sent = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            sent = completed.send(page) => sent,
        };
        if sent.is_err() {
            break;
        }
    }

    debug!("Worker {} finished", worker_id);
}

async fn next_page(frontier: &Frontier) -> Option<Page> {
    frontier.lock().await.recv().await
}

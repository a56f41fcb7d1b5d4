use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::Result;
use tracing::debug;

type Message<T> = (u64, Result<T>);

/// Runs fetch jobs on background threads. Every request bumps a generation
/// counter and only the result of the latest request is ever handed out.
pub(super) struct Loader<T> {
    generation: u64,
    pending: bool,
    tx: Sender<Message<T>>,
    rx: Receiver<Message<T>>,
}

impl<T: Send + 'static> Loader<T> {
    pub(super) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            generation: 0,
            pending: false,
            tx,
            rx,
        }
    }

    pub(super) fn request<F>(&mut self, job: F) -> u64
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.generation += 1;
        self.pending = true;

        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send((generation, job()));
        });

        generation
    }

    pub(super) fn is_pending(&self) -> bool {
        self.pending
    }

    pub(super) fn poll(&mut self) -> Option<Result<T>> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if let Some(result) = self.accept(message) {
                        return Some(result);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    fn accept(&mut self, (generation, result): Message<T>) -> Option<Result<T>> {
        if generation != self.generation {
            debug!(
                generation,
                latest = self.generation,
                "discarding stale load result"
            );
            return None;
        }

        self.pending = false;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;

    use super::*;

    fn wait_for<T: Send + 'static>(loader: &mut Loader<T>) -> Option<Result<T>> {
        let message = loader.rx.recv_timeout(Duration::from_secs(5)).ok()?;
        loader.accept(message)
    }

    #[test]
    fn latest_request_wins() {
        let mut loader = Loader::new();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        let first = loader.request(move || {
            let _ = gate_rx.recv();
            Ok("first")
        });
        let second = loader.request(|| Ok("second"));
        assert!(second > first);

        let result = wait_for(&mut loader).unwrap().unwrap();
        assert_eq!(result, "second");
        assert!(!loader.is_pending());

        gate_tx.send(()).unwrap();
        assert!(wait_for(&mut loader).is_none());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn errors_are_delivered_like_results() {
        let mut loader: Loader<()> = Loader::new();
        loader.request(|| Err(anyhow!("boom")));
        assert!(loader.is_pending());

        let error = wait_for(&mut loader).unwrap().unwrap_err();
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn poll_without_requests_is_empty() {
        let mut loader: Loader<u8> = Loader::new();
        assert!(loader.poll().is_none());
        assert!(!loader.is_pending());
    }
}

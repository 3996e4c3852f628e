use std::thread;

use crate::shared::error::ClientError;

/// A self-contained recognition request: encode, submit, report back.
pub type RecognitionJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs recognition jobs without blocking the render loop.
///
/// A job handed to `dispatch` must eventually run exactly once unless
/// `dispatch` returns an error.
pub trait RequestDispatcher: Send {
    fn dispatch(&self, job: RecognitionJob) -> Result<(), ClientError>;
}

/// Runs each job on its own short-lived worker thread.
pub struct ThreadRequestDispatcher;

impl ThreadRequestDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadRequestDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDispatcher for ThreadRequestDispatcher {
    fn dispatch(&self, job: RecognitionJob) -> Result<(), ClientError> {
        thread::Builder::new()
            .name("facelens-recognize".to_string())
            .spawn(job)
            .map(|_| ())
            .map_err(|e| ClientError::Network(format!("failed to spawn request worker: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_thread_dispatcher_runs_job() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let dispatcher = ThreadRequestDispatcher::new();
        dispatcher
            .dispatch(Box::new(move || {
                tx.send(thread::current().name().map(str::to_string)).unwrap();
            }))
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("facelens-recognize"));
    }
}

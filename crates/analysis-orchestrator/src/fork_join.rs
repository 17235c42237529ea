//! Run independent operations on separate tasks and wait for all of them.
//!
//! Every operation runs to completion even when a peer fails. The first error
//! in submission order is returned once all have finished.

use analysis_core::AnalysisError;
use futures_util::future::{join_all, BoxFuture};
use tokio::task::JoinHandle;

pub type TaskResult<T> = Result<T, AnalysisError>;

/// One unit of work for [`fork_join`].
pub enum Task<T> {
    /// Runs on the async worker pool
    Async(BoxFuture<'static, TaskResult<T>>),
    /// Runs on the blocking pool; for CPU-bound work
    Blocking(Box<dyn FnOnce() -> TaskResult<T> + Send + 'static>),
}

impl<T> Task<T> {
    pub fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = TaskResult<T>> + Send + 'static,
    {
        Task::Async(Box::pin(future))
    }

    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        Task::Blocking(Box::new(f))
    }
}

/// Results are returned in submission order.
pub async fn fork_join<T>(tasks: Vec<Task<T>>) -> TaskResult<Vec<T>>
where
    T: Send + 'static,
{
    let handles: Vec<JoinHandle<TaskResult<T>>> = tasks
        .into_iter()
        .map(|task| match task {
            Task::Async(future) => tokio::spawn(future),
            Task::Blocking(f) => tokio::task::spawn_blocking(f),
        })
        .collect();

    let outcomes = join_all(handles).await;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(join_error) => {
                first_error.get_or_insert(AnalysisError::Internal(format!(
                    "worker task failed: {}",
                    join_error
                )));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

/// Dedicated pool for the CPU-bound prediction scoring
///
/// Large uploads must not tie up the actix HTTP workers, so each batch
/// runs here via `spawn_blocking`.

use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::runtime::Runtime;

lazy_static! {
    /// Pool for prediction batches
    ///
    /// - 4 worker threads
    /// - named threads for debugging
    pub static ref PREDICTION_POOL: Arc<Runtime> = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .thread_name("prediction-worker")
            .enable_all()
            .build()
            .expect("Failed to create prediction thread pool")
    );
}

/// Runs a blocking closure on the prediction pool
///
/// # Example
/// ```ignore
/// let results = spawn_prediction_blocking(move || score_batch(&rows)).await?;
/// ```
pub async fn spawn_prediction_blocking<F, R>(f: F) -> Result<R, tokio::task::JoinError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    PREDICTION_POOL.spawn_blocking(f).await
}

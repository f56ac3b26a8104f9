//! Progress reporting for the executors

use async_trait::async_trait;

/// Receives human-readable progress from landing and update execution
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A step started or finished
    async fn on_message(&self, message: &str);

    /// Something went wrong but execution continues
    async fn on_warning(&self, message: &str);
}

/// Progress sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}

    async fn on_warning(&self, _message: &str) {}
}

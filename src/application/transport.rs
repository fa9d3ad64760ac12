// Transport traits for the observation stream
use crate::application::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ObservationTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn ObservationConnection>>;
}

#[async_trait]
pub trait ObservationConnection: Send {
    /// Next text frame, `None` once the peer has gone away.
    async fn next_frame(&mut self) -> Option<Result<String>>;

    async fn send(&mut self, text: &str) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

use async_trait::async_trait;

use crate::Result;

/// An external source of records: one outbound call per `fetch`, no retries.
#[async_trait]
pub trait Provider<Q, T>: Send + Sync
where
    Q: Sync,
    T: Send,
{
    fn name(&self) -> &str;

    async fn fetch(&self, query: &Q) -> Result<Vec<T>>;
}

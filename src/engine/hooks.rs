//! Hooks invoked by the engine between preparing a generation and writing it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::document::Versioned;

/// Runs once per generation, after mutation and guard evaluation and right
/// before the conditional writes are dispatched.
///
/// `batch` holds the snapshots about to be written, each still carrying the
/// version token it was read with.
#[async_trait]
pub trait BeforeWrite<T>: Send + Sync {
    async fn before_write(&self, generation: u32, batch: &[Versioned<T>]);
}

#[async_trait]
impl<T, H> BeforeWrite<T> for Arc<H>
where
    T: Sync,
    H: BeforeWrite<T> + ?Sized,
{
    async fn before_write(&self, generation: u32, batch: &[Versioned<T>]) {
        (**self).before_write(generation, batch).await
    }
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

#[async_trait]
impl<T: Sync> BeforeWrite<T> for NoopHook {
    async fn before_write(&self, _generation: u32, _batch: &[Versioned<T>]) {}
}

/// Holds every generation open for a fixed window before writing, giving
/// other writers a chance to race the bulk update.
#[derive(Debug, Clone, Copy)]
pub struct SettleDelay {
    delay: Duration,
}

impl SettleDelay {
    pub fn new(delay: Duration) -> Self {
        SettleDelay { delay }
    }
}

#[async_trait]
impl<T: Sync> BeforeWrite<T> for SettleDelay {
    async fn before_write(&self, generation: u32, batch: &[Versioned<T>]) {
        tracing::info!(
            generation,
            pending = batch.len(),
            delay_ms = self.delay.as_millis() as u64,
            "holding writes open before dispatch"
        );
        tokio::time::sleep(self.delay).await;
    }
}

//! A before-write hook that plays a concurrent writer.

use std::sync::Mutex;

use bulk_graph::{async_trait, BeforeWrite, CancelHandle, InMemoryRecordStore, RecordStore, Versioned, Vertex};

use super::FLEET;

/// Before the engine dispatches a generation's writes, adds `bump` to the
/// temperature of each target directly in the store, so the engine's
/// snapshots go stale.
pub struct RacingWriter {
    store: InMemoryRecordStore,
    targets: Vec<String>,
    bump: i64,
    rounds: Option<u32>,
    cancel_after: Option<CancelHandle>,
    batches: Mutex<Vec<(u32, Vec<String>)>>,
}

impl RacingWriter {
    pub fn new(store: &InMemoryRecordStore, targets: &[&str], bump: i64) -> Self {
        RacingWriter {
            store: store.clone(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            bump,
            rounds: None,
            cancel_after: None,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Only race the first `rounds` generations.
    pub fn for_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Request cancellation after racing.
    pub fn then_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel_after = Some(handle);
        self
    }

    /// Ids of each batch the engine was about to write, by generation.
    pub fn batches(&self) -> Vec<(u32, Vec<String>)> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BeforeWrite<Vertex> for RacingWriter {
    async fn before_write(&self, generation: u32, batch: &[Versioned<Vertex>]) {
        self.batches.lock().unwrap().push((
            generation,
            batch.iter().map(|v| v.data.id.clone()).collect(),
        ));

        if self.rounds.map_or(true, |rounds| generation < rounds) {
            for id in &self.targets {
                let mut current = self.store.read::<Vertex>(id, FLEET).await.unwrap();
                let temp = current.data.number("temp").unwrap();
                current.data.set_number("temp", temp + self.bump);
                self.store.upsert(&current.data).await.unwrap();
            }
        }

        if let Some(handle) = &self.cancel_after {
            handle.cancel();
        }
    }
}

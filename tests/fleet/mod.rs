//! Shared fixtures for the bulk update suites: a seeded device fleet, a hook
//! that races the engine with external writes, and a store wrapper that
//! records traffic and injects faults.

#![allow(dead_code)]

pub mod instrumented;
pub mod racing;

use bulk_graph::{
    IncrementNumber, InMemoryRecordStore, MutationPlan, NumberBelow, RecordStore, Vertex,
};

pub const FLEET: &str = "fleet1";

pub fn device(id: &str, temp: i64) -> Vertex {
    Vertex::new(id, FLEET, "device")
        .with_property("model", "TX-100")
        .with_property("temp", temp)
        .with_property("status", "off")
}

/// Store seeded with one device per `(id, temp)` pair.
pub async fn fleet(devices: &[(&str, i64)]) -> InMemoryRecordStore {
    let store = InMemoryRecordStore::new();
    for (id, temp) in devices {
        store.insert(&device(id, *temp)).await.unwrap();
    }
    store
}

/// The fleet intent: raise temperature by 20, never to 140 or beyond.
pub fn raise_temp() -> MutationPlan<Vertex> {
    MutationPlan::new(IncrementNumber::new("temp", 20)).with_guard(NumberBelow::new("temp", 140))
}

pub async fn temp_of(store: &InMemoryRecordStore, id: &str) -> i64 {
    store
        .read::<Vertex>(id, FLEET)
        .await
        .unwrap()
        .data
        .number("temp")
        .unwrap()
}

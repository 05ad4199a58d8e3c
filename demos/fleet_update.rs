//! Raise the temperature of every device in `fleet1` by 20, never past 140,
//! while a second writer races the bulk update.
//!
//! ```text
//! RUST_LOG=bulk_graph=debug,fleet_update=info cargo run --example fleet_update
//! ```

use std::time::Duration;

use bulk_graph::{
    BulkUpdate, BulkUpdateConfig, BulkUpdater, IncrementNumber, InMemoryRecordStore,
    MutationPlan, NumberBelow, QueryFilter, RecordStore, SettleDelay, StoreError, Vertex,
};
use tracing_subscriber::EnvFilter;

const FLEET: &str = "fleet1";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "bulk update failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryRecordStore::new();
    seed(&store).await?;

    // Another process bumps dev-2 while the bulk update holds its writes open
    let racer = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Err(err) = bump(&racer, "dev-2", 3).await {
            tracing::warn!(error = %err, "concurrent writer failed");
        } else {
            tracing::info!("concurrent writer updated dev-2");
        }
    });

    let plan = MutationPlan::new(IncrementNumber::new("temp", 20))
        .with_guard(NumberBelow::new("temp", 140));
    let update = BulkUpdate::new(FLEET, plan)
        .with_before_write(SettleDelay::new(Duration::from_millis(200)));

    tracing::info!("bulk updating nodes in graph");
    let report = BulkUpdater::new(store.clone())
        .with_config(BulkUpdateConfig::new().with_max_generations(8))
        .execute(&update)
        .await?;

    for generation in &report.generations {
        tracing::info!(
            generation = generation.generation,
            applied = ?generation.applied,
            conflicted = ?generation.conflicted,
            guard_rejected = ?generation.guard_rejected,
            "generation summary"
        );
    }

    let page = store
        .query_page::<Vertex>(FLEET, &QueryFilter::all(), None, 100)
        .await?;
    for vertex in page.items {
        tracing::info!(id = %vertex.data.id, temp = ?vertex.data.number("temp"), "final state");
    }

    tracing::info!(
        generations = report.generation_count(),
        applied = report.applied_count(),
        "update done"
    );
    Ok(())
}

async fn seed(store: &InMemoryRecordStore) -> Result<(), StoreError> {
    for (id, temp) in [("dev-1", 100), ("dev-2", 110), ("dev-3", 125), ("dev-4", 90)] {
        let vertex = Vertex::new(id, FLEET, "device")
            .with_property("model", "TX-100")
            .with_property("temp", temp)
            .with_property("status", "off");
        store.insert(&vertex).await?;
    }
    Ok(())
}

async fn bump(store: &InMemoryRecordStore, id: &str, by: i64) -> Result<(), StoreError> {
    let mut current = store.read::<Vertex>(id, FLEET).await?;
    let temp = current.data.number("temp").unwrap_or_default();
    current.data.set_number("temp", temp + by);
    store.replace_if_match(&current.data, &current.version).await?;
    Ok(())
}

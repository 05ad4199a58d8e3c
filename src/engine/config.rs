use std::time::Duration;

use serde::Deserialize;

/// Tuning knobs for one bulk update invocation.
///
/// Deserializes from JSON with any field omitted falling back to its
/// default:
///
/// ```ignore
/// let config = BulkUpdateConfig::from_json(r#"{ "max_generations": 4 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BulkUpdateConfig {
    /// Upper bound on select-mutate-write passes, the first one included.
    pub max_generations: u32,
    /// Wall-clock budget in milliseconds, checked before each retry generation.
    pub deadline_ms: Option<u64>,
    /// Page size requested from the store while draining the working-set query.
    pub page_size: usize,
}

impl Default for BulkUpdateConfig {
    fn default() -> Self {
        Self {
            max_generations: 16,
            deadline_ms: None,
            page_size: 100,
        }
    }
}

impl BulkUpdateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the maximum number of generations (clamped to at least one).
    pub fn with_max_generations(mut self, max: u32) -> Self {
        self.max_generations = max;
        self
    }

    /// Set the wall-clock deadline for retries.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the query page size (clamped to at least one).
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn generation_limit(&self) -> u32 {
        self.max_generations.max(1)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

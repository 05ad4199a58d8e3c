/// What happened to the documents of one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Zero for the initial query pass, then one per retry pass.
    pub generation: u32,
    /// Ids in the generation's working set.
    pub selected: Vec<String>,
    /// Ids whose mutated value failed the guard. Never written.
    pub guard_rejected: Vec<String>,
    /// Ids whose conditional write was accepted.
    pub applied: Vec<String>,
    /// Ids whose conditional write lost to a newer version, sorted.
    pub conflicted: Vec<String>,
}

impl GenerationReport {
    pub fn new(generation: u32) -> Self {
        GenerationReport {
            generation,
            ..Default::default()
        }
    }

    pub fn written(&self) -> usize {
        self.applied.len() + self.conflicted.len()
    }
}

/// Outcome of a bulk update across all generations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateReport {
    pub generations: Vec<GenerationReport>,
}

impl BulkUpdateReport {
    pub fn generation_count(&self) -> usize {
        self.generations.len()
    }

    /// Every applied id, in generation order.
    pub fn applied(&self) -> impl Iterator<Item = &str> {
        self.generations
            .iter()
            .flat_map(|g| g.applied.iter().map(String::as_str))
    }

    pub fn applied_count(&self) -> usize {
        self.generations.iter().map(|g| g.applied.len()).sum()
    }

    pub fn guard_rejected_count(&self) -> usize {
        self.generations.iter().map(|g| g.guard_rejected.len()).sum()
    }

    /// Ids still conflicted after the last completed generation.
    pub fn pending(&self) -> &[String] {
        self.generations
            .last()
            .map(|g| g.conflicted.as_slice())
            .unwrap_or(&[])
    }

    /// True when at least one generation ran and the last left no conflicts.
    pub fn converged(&self) -> bool {
        !self.generations.is_empty() && self.pending().is_empty()
    }

    /// The generation in which `id` was applied, if it was.
    pub fn applied_in(&self, id: &str) -> Option<u32> {
        self.generations
            .iter()
            .find(|g| g.applied.iter().any(|a| a == id))
            .map(|g| g.generation)
    }
}

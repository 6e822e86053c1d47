//! Random partitioning of spans into subsets, e.g. train/test splits or folds.

use super::Dataset;
use crate::entity::EntityId;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Absorbs float error in `n * p` so that e.g. `10 * 0.7` floors to 7.
const ROUNDING_TOLERANCE: f64 = 1e-9;

/// Configuration for [`Dataset::create_subsets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetConfig {
    /// Share of the spans per subset, in output order. Must sum to at most 1.
    pub proportions: Vec<f64>,
    /// Add the spans left over by rounding to the last subset.
    pub use_all_data: bool,
    /// Seed for a reproducible split. `None` draws fresh randomness.
    pub seed: Option<u64>,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            proportions: vec![0.8, 0.2],
            use_all_data: true,
            seed: None,
        }
    }
}

impl SubsetConfig {
    /// Split with the given proportions.
    #[must_use]
    pub fn new(proportions: impl Into<Vec<f64>>) -> Self {
        Self {
            proportions: proportions.into(),
            ..Default::default()
        }
    }

    /// Set whether leftover spans go to the last subset.
    #[must_use]
    pub fn with_use_all_data(mut self, use_all_data: bool) -> Self {
        self.use_all_data = use_all_data;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the proportions.
    pub fn validate(&self) -> Result<()> {
        validate_proportions(&self.proportions)
    }
}

fn validate_proportions(proportions: &[f64]) -> Result<()> {
    if proportions.is_empty() {
        return Err(Error::invalid_input("at least one proportion is required"));
    }
    if let Some(p) = proportions
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(Error::invalid_input(format!(
            "proportion {p} is outside [0, 1]"
        )));
    }
    let total: f64 = proportions.iter().sum();
    if total > 1.0 + ROUNDING_TOLERANCE {
        return Err(Error::invalid_input(format!(
            "proportions sum to {total}, more than 1"
        )));
    }
    Ok(())
}

/// Shuffle `spans` with `rng` and cut them into consecutive blocks.
///
/// Block `i` receives `floor(n * proportions[i])` spans. With
/// `use_all_data`, whatever rounding leaves over is added to the last block;
/// otherwise it is dropped.
pub fn create_subsets<R: Rng>(
    spans: &BTreeSet<EntityId>,
    proportions: &[f64],
    use_all_data: bool,
    rng: &mut R,
) -> Result<Vec<BTreeSet<EntityId>>> {
    validate_proportions(proportions)?;
    if spans.is_empty() {
        return Err(Error::invalid_input("cannot divide an empty set of spans"));
    }

    let mut keyed: Vec<(f64, EntityId)> = spans
        .iter()
        .map(|&id| (rng.random::<f64>(), id))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let shuffled: Vec<EntityId> = keyed.into_iter().map(|(_, id)| id).collect();

    let n = shuffled.len();
    let mut subsets: Vec<BTreeSet<EntityId>> = Vec::with_capacity(proportions.len());
    let mut taken = 0;
    for &p in proportions {
        let size = ((n as f64 * p + ROUNDING_TOLERANCE).floor() as usize).min(n - taken);
        subsets.push(shuffled[taken..taken + size].iter().copied().collect());
        taken += size;
    }
    if use_all_data {
        if let Some(last) = subsets.last_mut() {
            last.extend(shuffled[taken..].iter().copied());
        }
    }

    for (i, subset) in subsets.iter().enumerate() {
        log::debug!("Subset {}: {} of {} spans", i, subset.len(), n);
    }
    Ok(subsets)
}

impl Dataset {
    /// Randomly divide the spans of one type into subsets.
    ///
    /// # Errors
    ///
    /// Invalid proportions, or no span of `span_type` in the dataset.
    pub fn create_subsets(&self, span_type: &str, config: &SubsetConfig) -> Result<Vec<BTreeSet<EntityId>>> {
        let spans = self.spans_of_type(span_type);
        if spans.is_empty() {
            return Err(Error::invalid_input(format!(
                "no spans of type '{span_type}' to divide"
            )));
        }
        match config.seed {
            Some(seed) => create_subsets(
                spans,
                &config.proportions,
                config.use_all_data,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => create_subsets(spans, &config.proportions, config.use_all_data, &mut rand::rng()),
        }
    }
}

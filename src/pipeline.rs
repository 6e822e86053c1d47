//! Processing components and the checks that guard them.
//!
//! A component performs one [`NlpTask`] over the spans of one type and may
//! require other tasks to have run first. [`process`] enforces that
//! contract before handing the dataset to the component, and records the
//! task once the component succeeds.
//!
//! ```rust
//! use annostore::{Dataset, Pipeline, Lowercaser, WhitespaceTokenizer};
//!
//! let mut ds = Dataset::new("review");
//! let unit = ds.add_textual_unit();
//! ds.put_annotation(unit, "text", "Great Pizza").unwrap();
//!
//! Pipeline::new()
//!     .with(WhitespaceTokenizer::new())
//!     .with(Lowercaser::new())
//!     .run(&mut ds, "review")
//!     .unwrap();
//! assert_eq!(ds.span_text(unit).unwrap(), "great pizza");
//! ```

use crate::error::Result;
use annostore_core::{Dataset, NlpTask};
use std::collections::BTreeSet;

/// A processing stage that reads and writes a [`Dataset`].
pub trait NlpComponent: Send + Sync {
    /// The task this component performs.
    fn task(&self) -> NlpTask;

    /// Tasks that must have been performed before this one.
    fn prerequisites(&self) -> BTreeSet<NlpTask> {
        BTreeSet::new()
    }

    /// Whether the component may run again on a dataset that already has
    /// its task recorded. Elementary stages such as tokenization must not.
    fn allows_rerun(&self) -> bool {
        false
    }

    /// Name for logs.
    fn name(&self) -> &'static str {
        "unknown"
    }

    /// Do the work. Only called by [`process`] once every check passed.
    fn validated_process(&self, dataset: &mut Dataset, span_type: &str) -> Result<()>;
}

/// Run `component` over the spans of `span_type` if the dataset allows it.
///
/// # Errors
///
/// - [`AlreadyPerformed`](annostore_core::Error::AlreadyPerformed) when the
///   task was already recorded and the component does not allow re-runs
/// - [`MissingPrerequisite`](annostore_core::Error::MissingPrerequisite)
///   naming every prerequisite that has not run
/// - whatever the component itself returns; the task is not recorded then
pub fn process<C: NlpComponent + ?Sized>(component: &C, dataset: &mut Dataset, span_type: &str) -> Result<()> {
    let task = component.task();
    if !component.allows_rerun() && dataset.has_performed(&task) {
        log::warn!("{}: task {} has already been performed", component.name(), task);
        return Err(annostore_core::Error::AlreadyPerformed(task).into());
    }
    if let Err(e) = dataset.check_prerequisites(&task, &component.prerequisites()) {
        log::warn!("{}: {}", component.name(), e);
        return Err(e.into());
    }

    log::debug!("{}: processing '{}' spans", component.name(), span_type);
    component.validated_process(dataset, span_type)?;
    dataset.mark_performed(task);
    Ok(())
}

/// Components run in sequence over one span type.
#[derive(Default)]
pub struct Pipeline {
    components: Vec<Box<dyn NlpComponent>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component.
    #[must_use]
    pub fn with(mut self, component: impl NlpComponent + 'static) -> Self {
        self.push(component);
        self
    }

    /// Append a component.
    pub fn push(&mut self, component: impl NlpComponent + 'static) {
        self.components.push(Box::new(component));
    }

    /// Tasks performed by the components, in run order.
    #[must_use]
    pub fn tasks(&self) -> Vec<NlpTask> {
        self.components.iter().map(|c| c.task()).collect()
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the pipeline has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Run every component, stopping at the first error.
    pub fn run(&self, dataset: &mut Dataset, span_type: &str) -> Result<()> {
        for component in &self.components {
            process(component.as_ref(), dataset, span_type)?;
        }
        log::info!(
            "Pipeline of {} components done, performed tasks: {:?}",
            self.components.len(),
            dataset.performed_tasks()
        );
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.components.iter().map(|c| c.name()))
            .finish()
    }
}

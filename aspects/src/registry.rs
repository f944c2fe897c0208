//! Aspect Registry
//!
//! Maps aspect names to descriptors: a compute function plus the ordered
//! list of [`ContextKey`]s it needs. The registry is built once at start-up
//! (see [`crate::catalog::register_all`]) and shared read-only afterwards.
//!
//! Registering a function whose output is array-like also registers
//! `"<name> mean"`, which reduces the array to its arithmetic mean and
//! requires the same keys.

use crate::context::{Bindings, ContextKey};
use crate::error::Result;
use crate::types::{AspectOutput, AspectValue};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Suffix of derived mean aspects
pub const MEAN_SUFFIX: &str = " mean";

/// Type-erased aspect compute function
pub type ComputeFn = Arc<dyn Fn(&Bindings<'_>) -> Result<AspectValue> + Send + Sync>;

/// Registry entry for one aspect
#[derive(Clone)]
pub struct AspectDescriptor {
    compute: ComputeFn,
    requires: Vec<ContextKey>,
}

impl AspectDescriptor {
    /// Context values the compute function draws on, in declared order
    pub fn requires(&self) -> &[ContextKey] {
        &self.requires
    }

    /// Invoke the compute function against bound context values
    pub fn compute(&self, bindings: &Bindings<'_>) -> Result<AspectValue> {
        (self.compute)(bindings)
    }
}

impl fmt::Debug for AspectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AspectDescriptor")
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

/// Name to descriptor mapping
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: BTreeMap<String, AspectDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `compute` under `name`
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register<F, R>(&mut self, name: &str, requires: &[ContextKey], compute: F)
    where
        F: Fn(&Bindings<'_>) -> Result<R> + Send + Sync + 'static,
        R: AspectOutput,
    {
        let compute = Arc::new(compute);

        if R::ARRAY_LIKE {
            let inner = Arc::clone(&compute);
            let derived: ComputeFn = Arc::new(move |bindings: &Bindings<'_>| {
                inner(bindings).map(|r| AspectValue::Number(r.mean()))
            });
            self.insert(format!("{}{}", name, MEAN_SUFFIX), requires, derived);
        }

        let erased: ComputeFn =
            Arc::new(move |bindings: &Bindings<'_>| compute(bindings).map(R::into_value));
        self.insert(name.to_string(), requires, erased);
    }

    fn insert(&mut self, name: String, requires: &[ContextKey], compute: ComputeFn) {
        let descriptor = AspectDescriptor {
            compute,
            requires: requires.to_vec(),
        };
        if self.descriptors.insert(name.clone(), descriptor).is_some() {
            warn!(aspect = %name, "Aspect registration replaced an existing descriptor");
        }
    }

    /// Every registered name, sorted lexicographically
    pub fn names(&self) -> Vec<String> {
        self.descriptors.keys().cloned().collect()
    }

    /// Look up a descriptor
    pub fn resolve(&self, name: &str) -> Option<&AspectDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

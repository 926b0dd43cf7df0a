//! Invariant checking for simulation runs.
//!
//! Invariants are properties of a whole [`Trace`] that must hold no matter
//! which sequence of routes, publications and injected messages produced it.
//! Unlike example-based tests that check specific scenarios, they are
//! checked after every step of randomized runs.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(page.trace())?;
//! ```

mod checks;

pub use checks::{HandshakeOrder, NoPostsToDeadWorkers, PostsTargetRecipientOrigin};

use crate::Trace;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property that must hold for every trace.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a trace.
    fn check(&self, trace: &Trace) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the bus-wide invariants.
    ///
    /// Includes:
    /// - [`PostsTargetRecipientOrigin`]: host posts name the frame's origin
    /// - [`HandshakeOrder`]: `env_init` only answers `client_started`
    /// - [`NoPostsToDeadWorkers`]: terminated workers are never addressed
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(PostsTargetRecipientOrigin);
        registry.add(HandshakeOrder);
        registry.add(NoPostsToDeadWorkers);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given trace.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, trace: &Trace) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(trace).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with the trace on violation.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, trace: &Trace, context: &str) {
        if let Err(violations) = self.check_all(trace) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!(
                "Invariant violation {context}:\n  {}\ntrace:\n  {}",
                messages.join("\n  "),
                trace.lines().join("\n  ")
            );
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn empty_trace_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&Trace::new()).is_ok());
    }
}

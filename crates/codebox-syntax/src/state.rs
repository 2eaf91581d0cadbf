//! Opaque lexer resume state.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Snapshot of a backend's internals taken right after a token.
///
/// The cache only stores and threads these handles through; the backend that
/// produced a state is the only one able to look inside it. Cloning is a
/// reference-count bump, so backends may hand the same state to many tokens.
#[derive(Clone)]
pub struct ResumeState(Arc<dyn Any + Send + Sync>);

impl ResumeState {
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self(Arc::new(state))
    }

    /// Returns the backend state if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// True if both handles point at the same snapshot.
    pub fn ptr_eq(&self, other: &ResumeState) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ResumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResumeState(..)")
    }
}

//! Current-model holder that gates transitions on structural equality.

use tracing::trace;

use crate::model::Model;
use crate::registry::Outcome;

/// Holds the dispatcher's current snapshot.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    current: Model,
    revision: u64,
}

impl ModelStore {
    /// Empty store. The dispatcher proposes its initial model right after.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Model {
        &self.current
    }

    /// Number of accepted transitions so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Accept `candidate` if it differs from the current model.
    ///
    /// Returns `true` only when the held model was replaced. A candidate
    /// that is structurally equal to the current model is dropped even if
    /// it is a distinct snapshot.
    pub fn propose(&mut self, candidate: Outcome) -> bool {
        let candidate = match candidate {
            Outcome::NoChange => return false,
            Outcome::Replace(model) => model,
        };

        if candidate == self.current {
            trace!(revision = self.revision, "candidate equals current model");
            return false;
        }

        self.current = candidate;
        self.revision += 1;
        true
    }
}

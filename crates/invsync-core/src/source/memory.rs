// In-process source store for tests and offline rehearsal.

use indexmap::IndexMap;

use super::{Projection, SourceStore};
use crate::error::CoreError;
use crate::model::{EntityKind, FieldMap};

/// Canned rows per kind, with optional per-kind query failures.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: IndexMap<EntityKind, Vec<FieldMap>>,
    failures: IndexMap<EntityKind, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rows(mut self, kind: EntityKind, rows: Vec<FieldMap>) -> Self {
        self.rows.insert(kind, rows);
        self
    }

    /// Make every fetch of `kind` fail with `message`.
    #[must_use]
    pub fn with_failure(mut self, kind: EntityKind, message: &str) -> Self {
        self.failures.insert(kind, message.to_owned());
        self
    }
}

impl SourceStore for MemorySource {
    async fn fetch(
        &self,
        kind: EntityKind,
        _projection: &Projection,
    ) -> Result<Vec<FieldMap>, CoreError> {
        if let Some(message) = self.failures.get(&kind) {
            return Err(CoreError::SourceQuery {
                message: message.clone(),
            });
        }
        Ok(self.rows.get(&kind).cloned().unwrap_or_default())
    }
}

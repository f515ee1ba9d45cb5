use uuid::Uuid;

/// Unique id for a [`crate::WorkUnit`], stable for its whole lifetime.
///
/// A `Report` (kiln-report) keys its open-workunit map on this, the same
/// role pants' `workunit.id` plays for `Report._workunits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkUnitId(Uuid);

impl WorkUnitId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WorkUnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

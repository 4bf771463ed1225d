//! Static routine metadata handed to recorders once per routine.

use std::time::Duration;

/// Kind of background routine, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    /// Invokes a handler on an interval ([`PeriodicRoutine`](crate::PeriodicRoutine)).
    Periodic,
    /// Anything else implementing [`BackgroundRoutine`](crate::BackgroundRoutine).
    Custom,
}

impl RoutineKind {
    /// Returns a short stable label for logs and listings.
    pub fn as_label(&self) -> &'static str {
        match self {
            RoutineKind::Periodic => "periodic",
            RoutineKind::Custom => "custom",
        }
    }
}

/// Descriptive metadata of a routine.
///
/// `interval` and `concurrency` are the values observed when the routine started; both can
/// change later when they come from provider functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineInfo {
    /// Routine name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Grouping key (usually the process or job that owns the routine).
    pub job_name: String,
    /// Routine kind.
    pub kind: RoutineKind,
    /// Interval at start.
    pub interval: Duration,
    /// Worker count at start.
    pub concurrency: usize,
}

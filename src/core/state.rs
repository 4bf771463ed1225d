/// Lifecycle of a [`PeriodicRoutine`](crate::PeriodicRoutine).
///
/// ```text
/// Created ──start()──► Running ──cancel──► Draining ──on_shutdown──► Stopped
///    │                                                                 ▲
///    └────────────────────────stop() before start()────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineState {
    /// Built, not started.
    Created,
    /// Worker pool is running.
    Running,
    /// Workers have exited; the finalizer is running.
    Draining,
    /// Terminal.
    Stopped,
}

impl RoutineState {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RoutineState::Created => "created",
            RoutineState::Running => "running",
            RoutineState::Draining => "draining",
            RoutineState::Stopped => "stopped",
        }
    }
}

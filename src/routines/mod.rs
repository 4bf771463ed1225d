//! # Background routine capability.
//!
//! Anything the [`Monitor`](crate::Monitor) can drive implements [`BackgroundRoutine`]:
//! a blocking `start` and a `stop` that returns once the routine has drained.
//!
//! - [`BackgroundRoutine`] the capability pair
//! - [`RoutineRef`] shared handle (`Arc<dyn BackgroundRoutine>`)
//! - [`CombinedRoutine`] a group started and stopped together
//! - [`NoopRoutine`] does nothing; handy as a placeholder

mod background;
mod combined;

pub use background::{BackgroundRoutine, NoopRoutine, RoutineRef};
pub use combined::CombinedRoutine;

//! Concurrency helpers that live outside the periodic engine.
//!
//! - [`Bounded`] fire-and-collect pool with a fixed number of slots
//! - [`run_workers`] run N copies of a worker and wait for all of them
//! - [`go`] spawn with panic recovery

mod bounded;
mod recover;
mod workers;

pub use bounded::Bounded;
pub use recover::go;
pub use workers::run_workers;

pub(crate) use recover::panic_message;

//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a store.
//!
//! # Tasks
//! - Sweep: removes expired cache entries at configured intervals

mod cleanup;

pub use cleanup::{Sweep, Sweeper};

#![forbid(unsafe_code)]

//! # ev core
//!
//! Shared vocabulary of the ev reactor: monotonic ticks, readiness
//! directions, callback progress, timer kinds, reactor configuration and the
//! fatal contract-violation path used by every other crate in the workspace.

pub mod config;
pub mod readiness;
pub mod time;
pub mod violation;

pub use config::*;
pub use readiness::*;
pub use time::*;
pub use violation::*;

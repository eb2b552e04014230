//! Command module
//!
//! Provides the keyword table and the dispatcher that executes it.

mod dispatcher;
mod rules;

pub use dispatcher::{CommandDispatcher, Flow};

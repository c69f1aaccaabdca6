//! Command handlers for the poeguide CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod details;
pub mod guide;
pub mod sync;
pub mod validate;

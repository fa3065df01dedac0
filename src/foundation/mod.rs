//! Shared error and math foundations.

pub mod error;
pub mod math;

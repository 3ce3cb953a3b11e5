//! Shared building blocks for the neighborhood community server: settings,
//! core errors, route constants and input validation.

pub mod config;
pub mod constants;
pub mod error;
pub mod util;
pub mod validation;

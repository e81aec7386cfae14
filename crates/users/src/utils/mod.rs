//! Internal utilities for the user management service.

pub mod validation;

pub use validation::*;

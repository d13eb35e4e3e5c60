//! Attrition: Employee Attrition Analysis Library
//!
//! Loads HR survey sources, merges them with clock-in/out behaviour,
//! prepares an encoded feature matrix and compares classifier families.

pub mod cli;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{AttritionError, Result};

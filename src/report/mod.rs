//! Report module - console tables and JSON export of a run

pub mod comparison;
pub mod export;
pub mod summary;

pub use comparison::*;
pub use export::*;
pub use summary::*;

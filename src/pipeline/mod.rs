//! Pipeline module - turns the raw HR sources into a model-ready dataset

pub mod dataset;
pub mod encoder;
pub mod features;
pub mod frame;
pub mod hours;
pub mod loader;
pub mod merge;
pub mod missing;
pub mod sampling;
pub mod scaler;
pub mod split;

pub use dataset::*;
pub use encoder::*;
pub use features::*;
pub use frame::ID_COLUMN;
pub use hours::*;
pub use loader::*;
pub use merge::*;
pub use missing::*;
pub use sampling::*;
pub use scaler::*;
pub use split::*;

pub mod dense;
pub mod dimred;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod similarity;
pub mod spikes;
pub mod svd;
pub mod synthetic;
pub mod utils;

pub use error::InvalidArgument;
pub use utils::Direction;
pub use utils::UnitNorm;

pub mod error;
pub mod exchange;
pub mod fillet;
pub mod geom;
pub mod model;
pub mod report;
pub mod sampler;

pub use error::{GeometryError, Result};

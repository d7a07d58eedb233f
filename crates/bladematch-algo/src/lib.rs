pub mod assembler;
pub mod config;
pub mod driver;
pub mod error;
pub mod optimizer;
pub mod options;
pub mod presets;
pub mod prompt;
pub mod report;
pub mod residual;
pub mod synthesis;
pub mod workspace;

pub use error::{MatchError, Result};

use crate::config::ParametricBladeConfig;
use crate::error::{MatchError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const COMPRESSOR_CFG: &str = include_str!("../presets/compressor.cfg");
const TURBINE_CFG: &str = include_str!("../presets/turbine.cfg");

/// Seed for the first station of a blade match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitTemplate {
    Compressor,
    Turbine,
    File(PathBuf),
}

impl InitTemplate {
    pub fn load(&self) -> Result<ParametricBladeConfig> {
        match self {
            InitTemplate::Compressor => ParametricBladeConfig::parse(COMPRESSOR_CFG),
            InitTemplate::Turbine => ParametricBladeConfig::parse(TURBINE_CFG),
            InitTemplate::File(path) => ParametricBladeConfig::read(path),
        }
    }
}

/// Accepts the names and menu numbers used by the template prompt, or a path
/// to a `.cfg` file.
impl FromStr for InitTemplate {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.ends_with(".cfg") {
            return Ok(InitTemplate::File(PathBuf::from(s)));
        }
        match s.to_ascii_lowercase().as_str() {
            "0" | "compressor" => Ok(InitTemplate::Compressor),
            "1" | "turbine" => Ok(InitTemplate::Turbine),
            _ => Err(MatchError::InvalidOption {
                key: "template".to_string(),
                reason: format!("`{s}` is neither a preset nor a .cfg file"),
            }),
        }
    }
}

impl fmt::Display for InitTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitTemplate::Compressor => write!(f, "compressor"),
            InitTemplate::Turbine => write!(f, "turbine"),
            InitTemplate::File(path) => write!(f, "{}", path.display()),
        }
    }
}

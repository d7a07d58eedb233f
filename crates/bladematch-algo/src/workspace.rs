//! Case directory layout.
//!
//! ```text
//! <case>/
//!   init.cfg, init.txt          current fit request
//!   output_matching/            optimizer scratch
//!   blade_match_output/
//!     section_init.cfg          seed for the first station
//!     section_NNN.cfg           fitted station configs
//!     section_NNN_iterations.txt
//!     new_section_NNN.cfg       refinement candidates
//!     stations.json
//!   <case>_3D.cfg               concatenated blade
//! ```

use crate::error::{MatchError, Result};
use bladematch_core::report::Warning;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const BLADE_MATCH_OUTPUT: &str = "blade_match_output";
pub const SCRATCH_DIR: &str = "output_matching";
pub const SENTINEL_NAME: &str = "section_init";
const MANIFEST: &str = "stations.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceHandle {
    root: PathBuf,
}

impl WorkspaceHandle {
    /// Creates the case directory. An existing directory is reused when
    /// `overwrite` is set, so acquiring twice is harmless.
    pub fn acquire(root: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        let root = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() && overwrite => {
                log::info!("writing to existing folder {root:?}");
            }
            Ok(_) => return Err(MatchError::DirectoryConflict(root)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                std::fs::create_dir_all(&root).map_err(|e| MatchError::io(&root, e))?;
            }
            Err(e) => return Err(MatchError::io(&root, e)),
        }
        Ok(Self { root })
    }

    /// Opens a case written by an earlier run.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(MatchError::io(
                &root,
                std::io::Error::new(ErrorKind::NotFound, "case directory not found"),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> String {
        self.root
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("case")
            .to_string()
    }

    pub fn init_config(&self) -> PathBuf {
        self.root.join("init.cfg")
    }

    pub fn target_points(&self) -> PathBuf {
        self.root.join("init.txt")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join(SCRATCH_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(BLADE_MATCH_OUTPUT)
    }

    pub fn ensure_output_dir(&self) -> Result<PathBuf> {
        let dir = self.output_dir();
        std::fs::create_dir_all(&dir).map_err(|e| MatchError::io(&dir, e))?;
        Ok(dir)
    }

    pub fn result_config(&self, name: &str) -> PathBuf {
        self.output_dir().join(format!("{name}.cfg"))
    }

    pub fn result_log(&self, name: &str) -> PathBuf {
        self.output_dir().join(format!("{name}_iterations.txt"))
    }

    pub fn station_name(station: usize) -> String {
        format!("section_{station:03}")
    }

    pub fn new_station_name(station: usize) -> String {
        format!("new_section_{station:03}")
    }

    pub fn station_config(&self, station: usize) -> PathBuf {
        self.result_config(&Self::station_name(station))
    }

    pub fn station_log(&self, station: usize) -> PathBuf {
        self.result_log(&Self::station_name(station))
    }

    pub fn new_station_config(&self, station: usize) -> PathBuf {
        self.result_config(&Self::new_station_name(station))
    }

    pub fn new_station_log(&self, station: usize) -> PathBuf {
        self.result_log(&Self::new_station_name(station))
    }

    pub fn sentinel_config(&self) -> PathBuf {
        self.result_config(SENTINEL_NAME)
    }

    pub fn manifest(&self) -> PathBuf {
        self.output_dir().join(MANIFEST)
    }

    pub fn concatenated_config(&self) -> PathBuf {
        self.root.join(format!("{}_3D.cfg", self.name()))
    }

    /// `section_NNN.cfg` files ordered by station index.
    pub fn station_configs(&self) -> Result<Vec<PathBuf>> {
        let found = self.station_files(&["section_"], &[".cfg"])?;
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Removes the station configs, residual logs, refinement leftovers and
    /// manifest of an earlier run, along with its concatenated config. The
    /// seed config is kept. Returns the number of files removed.
    pub fn clear_stations(&self) -> Result<usize> {
        if !self.output_dir().is_dir() {
            return Ok(0);
        }
        let mut stale: Vec<PathBuf> = self
            .station_files(&["section_", "new_section_"], &[".cfg", "_iterations.txt"])?
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        stale.extend(
            [self.manifest(), self.concatenated_config()]
                .into_iter()
                .filter(|p| p.is_file()),
        );
        for path in &stale {
            std::fs::remove_file(path).map_err(|e| MatchError::io(path, e))?;
        }
        if !stale.is_empty() {
            log::info!("removed {} files of an earlier run from {:?}", stale.len(), self.root);
        }
        Ok(stale.len())
    }

    fn station_files(&self, prefixes: &[&str], suffixes: &[&str]) -> Result<Vec<(usize, PathBuf)>> {
        let dir = self.output_dir();
        let entries = std::fs::read_dir(&dir).map_err(|e| MatchError::io(&dir, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| MatchError::io(&dir, e))?.path();
            let index = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| station_index(n, prefixes, suffixes));
            if let Some(index) = index {
                found.push((index, path));
            }
        }
        found.sort();
        Ok(found)
    }

    /// Best effort; the optimizer overwrites its outputs anyway.
    pub fn clear_scratch(&self) {
        let dir = self.scratch_dir();
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            if e.kind() != ErrorKind::NotFound {
                log::debug!("could not clear {dir:?}: {e}");
            }
        }
    }

    /// Removes the seed config. A missing seed is reported, not fatal.
    pub fn remove_sentinel(&self) -> Result<Option<Warning>> {
        let path = self.sentinel_config();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                let log_path = self.result_log(SENTINEL_NAME);
                if log_path.is_file() {
                    std::fs::remove_file(&log_path).map_err(|e| MatchError::io(&log_path, e))?;
                }
                Ok(None)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("seed config {path:?} was already gone");
                Ok(Some(Warning::new(
                    "stale_sentinel",
                    format!("seed config {} was missing at cleanup", path.display()),
                )))
            }
            Err(e) => Err(MatchError::io(&path, e)),
        }
    }
}

/// `<prefix><digits><suffix>` gives the number in the middle.
fn station_index(file_name: &str, prefixes: &[&str], suffixes: &[&str]) -> Option<usize> {
    let rest = prefixes.iter().find_map(|p| file_name.strip_prefix(p))?;
    let digits = suffixes.iter().find_map(|s| rest.strip_suffix(s))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

//! Flat `KEY = v1, v2, ...` blade configuration files consumed by the
//! parametrization library.
//!
//! Keys starting with an upper-case letter are case metadata (`NDIM`,
//! `N_SECTIONS`, `SCALE_FACTOR`, ...) and are shared by every station of a
//! blade. Lower-case keys are design variables holding one value per station.

use crate::error::{MatchError, Result};
use bladematch_core::geom::P3;
use itertools::Itertools;
use std::fmt;
use std::path::Path;

pub const NDIM: &str = "NDIM";
pub const N_SECTIONS: &str = "N_SECTIONS";
pub const SCALE_FACTOR: &str = "SCALE_FACTOR";
pub const PRESCRIBED_BLADE_FILENAME: &str = "PRESCRIBED_BLADE_FILENAME";
pub const CONFIG_PATH: &str = "CONFIG_PATH";
pub const STAGGER: &str = "stagger";

const LEADING: [&str; 3] = ["x_leading", "y_leading", "z_leading"];
const TRAILING: [&str; 3] = ["x_trailing", "y_trailing", "z_trailing"];
const MERIDIONAL: [&str; 4] = ["x_hub", "z_hub", "x_shroud", "z_shroud"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametricBladeConfig {
    entries: Vec<(String, Vec<String>)>,
}

impl ParametricBladeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `%` starts a comment. Blank lines are ignored and key order is kept.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.split('%').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, values)) = line.split_once('=') else {
                return Err(MatchError::MalformedConfig {
                    line: i + 1,
                    reason: format!("expected `KEY = value`, found `{line}`"),
                });
            };
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(MatchError::MalformedConfig {
                    line: i + 1,
                    reason: format!("bad key `{key}`"),
                });
            }
            let values = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            config.set_values(key, values);
        }
        Ok(config)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        log::debug!("reading config {path:?}");
        Self::parse(&text)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MatchError::io(parent, e))?;
            }
        }
        std::fs::write(path, self.to_string()).map_err(|e| MatchError::io(path, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_f64s(&self, key: &str) -> Result<Vec<f64>> {
        let values = self
            .get(key)
            .ok_or_else(|| MatchError::value(key, "missing"))?;
        values
            .iter()
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| MatchError::value(key, format!("`{v}` is not a number")))
            })
            .collect()
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.get_f64s(key)?
            .first()
            .copied()
            .ok_or_else(|| MatchError::value(key, "no value"))
    }

    /// Replaces the values of `key`, or appends it when new.
    pub fn set_values(&mut self, key: &str, values: Vec<String>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = values,
            None => self.entries.push((key.to_string(), values)),
        }
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.set_values(key, vec![value.to_string()]);
    }

    pub fn set_f64s(&mut self, key: &str, values: &[f64]) {
        self.set_values(key, values.iter().map(|v| v.to_string()).collect());
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn ndim(&self) -> Option<usize> {
        self.get_str(NDIM).and_then(|v| v.parse().ok())
    }

    pub fn section_count(&self) -> Option<usize> {
        self.get_str(N_SECTIONS).and_then(|v| v.parse().ok())
    }

    pub fn set_ndim(&mut self, ndim: usize) {
        self.set_str(NDIM, &ndim.to_string());
    }

    /// Edge positions, in the parametrization frame.
    pub fn set_position(&mut self, leading: &P3, trailing: &P3) {
        for (k, key) in LEADING.iter().enumerate() {
            self.set_f64s(key, &[leading[k]]);
        }
        for (k, key) in TRAILING.iter().enumerate() {
            self.set_f64s(key, &[trailing[k]]);
        }
    }

    /// Stagger in degrees: the chord angle in the first two parametrization
    /// axes.
    pub fn set_stagger(&mut self, leading: &P3, trailing: &P3) {
        let chord = trailing - leading;
        self.set_f64s(STAGGER, &[chord.y.atan2(chord.x).to_degrees()]);
    }

    /// Thickens the initial guess. Scales every `thickness_*` variable and
    /// both edge radii.
    pub fn fatten(&mut self, factor: f64) -> Result<()> {
        let keys: Vec<String> = self
            .keys()
            .filter(|k| k.starts_with("thickness_") || *k == "radius_in" || *k == "radius_out")
            .map(str::to_string)
            .collect();
        for key in keys {
            let scaled: Vec<f64> = self.get_f64s(&key)?.iter().map(|v| v * factor).collect();
            self.set_f64s(&key, &scaled);
        }
        Ok(())
    }

    /// Converts length variables to a new scale factor. A config without
    /// `SCALE_FACTOR` is taken to be in unscaled units.
    pub fn rescale(&mut self, scale: f64) -> Result<()> {
        let current = if self.contains(SCALE_FACTOR) {
            self.get_f64(SCALE_FACTOR)?
        } else {
            1.0
        };
        let ratio = scale / current;
        for key in LEADING.iter().chain(&TRAILING).chain(&MERIDIONAL) {
            if self.contains(key) {
                let scaled: Vec<f64> = self.get_f64s(key)?.iter().map(|v| v * ratio).collect();
                self.set_f64s(key, &scaled);
            }
        }
        self.set_f64s(SCALE_FACTOR, &[scale]);
        Ok(())
    }

    /// Merges per-station configs into one blade. Shared keys come from the
    /// first station; design variables are concatenated in station order.
    pub fn concatenate(stations: &[ParametricBladeConfig]) -> Result<Self> {
        let Some(first) = stations.first() else {
            return Err(MatchError::InvalidState(
                "no station configs to concatenate".to_string(),
            ));
        };
        let mut merged = Self::new();
        for (key, values) in &first.entries {
            if is_shared_key(key) {
                merged.set_values(key, values.clone());
                continue;
            }
            let mut all = Vec::with_capacity(values.len() * stations.len());
            for (i, station) in stations.iter().enumerate() {
                let v = station
                    .get(key)
                    .ok_or_else(|| MatchError::value(key, format!("missing in station {i}")))?;
                all.extend_from_slice(v);
            }
            merged.set_values(key, all);
        }
        merged.set_ndim(3);
        merged.set_str(N_SECTIONS, &stations.len().to_string());
        Ok(merged)
    }
}

fn is_shared_key(key: &str) -> bool {
    key.starts_with(|c: char| c.is_ascii_uppercase())
}

impl fmt::Display for ParametricBladeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, values) in &self.entries {
            writeln!(f, "{key} = {}", values.iter().join(", "))?;
        }
        Ok(())
    }
}

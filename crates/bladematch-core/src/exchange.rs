//! Prescribed-point exchange files read by the parametrization library:
//! tab-separated `<index> <c0> <c1> <c2>` rows. A multi-section file is a
//! concatenation of single-section blocks, each restarting its index at 0.

use crate::error::{GeometryError, Result};
use crate::geom::P3;
use crate::model::AxisOrder;
use std::fmt::Write;
use std::str::FromStr;

/// Native-to-exchange column mapping. The default `"zxy"` writes
/// `[span, chord, thickness]` as `[z, x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeAxes(pub AxisOrder);

impl Default for ExchangeAxes {
    fn default() -> Self {
        Self(AxisOrder::ZXY)
    }
}

impl FromStr for ExchangeAxes {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(Self)
    }
}

impl ExchangeAxes {
    /// Native point to scaled exchange-frame point.
    pub fn to_exchange(&self, p: &P3, scale: f64) -> P3 {
        self.0.apply(&(p * scale))
    }

    pub fn from_exchange(&self, p: &P3, scale: f64) -> P3 {
        self.0.inverse().apply(p) / scale
    }
}

pub fn write_section(out: &mut String, points: &[P3], scale: f64, axes: &ExchangeAxes) -> Result<()> {
    for (i, p) in points.iter().enumerate() {
        let q = axes.to_exchange(p, scale);
        writeln!(out, "{i}\t{}\t{}\t{}", q.x, q.y, q.z)?;
    }
    Ok(())
}

pub fn section_to_string(points: &[P3], scale: f64, axes: &ExchangeAxes) -> Result<String> {
    let mut out = String::new();
    write_section(&mut out, points, scale, axes)?;
    Ok(out)
}

/// Reads every block back into the native frame, undoing `scale`.
pub fn read_sections(text: &str, scale: f64, axes: &ExchangeAxes) -> Result<Vec<Vec<P3>>> {
    let mut sections: Vec<Vec<P3>> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let malformed = |reason: String| GeometryError::MalformedExchangeFile {
            line: line_no + 1,
            reason,
        };
        if tokens.len() != 4 {
            return Err(malformed(format!("expected 4 columns, found {}", tokens.len())));
        }
        let index: usize = tokens[0]
            .parse()
            .map_err(|_| malformed(format!("bad point index `{}`", tokens[0])))?;
        let mut c = [0.0f64; 3];
        for (k, tok) in tokens[1..].iter().enumerate() {
            c[k] = tok
                .parse()
                .map_err(|_| malformed(format!("bad coordinate `{tok}`")))?;
        }
        if index == 0 || sections.is_empty() {
            sections.push(Vec::new());
        }
        if let Some(current) = sections.last_mut() {
            current.push(axes.from_exchange(&P3::new(c[0], c[1], c[2]), scale));
        }
    }
    Ok(sections)
}

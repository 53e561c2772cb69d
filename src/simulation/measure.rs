use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// Raw bytes of a simulator log.
#[derive(Clone, Debug)]
pub struct SimulationLog {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl SimulationLog {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::MissingLog(path.display().to_string()));
        }
        let bytes = fs::read(&path)?;
        Ok(Self { path, bytes })
    }

    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Strict decoding: UTF-16LE when the log looks like one (LTspice),
    /// UTF-8 otherwise.
    pub fn decode(&self) -> Result<String> {
        let bytes = self.bytes.as_slice();
        let (utf16, body) = match bytes {
            [0xFF, 0xFE, rest @ ..] => (true, rest),
            [b, 0, ..] if b.is_ascii() => (true, bytes),
            [0xEF, 0xBB, 0xBF, rest @ ..] => (false, rest),
            _ => (false, bytes),
        };

        if !utf16 {
            return String::from_utf8(body.to_vec()).map_err(|e| self.error(e.to_string()));
        }
        if body.len() % 2 != 0 {
            return Err(self.error("odd byte count in UTF-16 log".into()));
        }
        let units = body.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| self.error(e.to_string()))
    }

    fn error(&self, reason: String) -> Error {
        Error::Log {
            path: self.path.clone(),
            reason,
        }
    }
}

/// One way of pulling a named measurement out of a log.
pub trait MeasureExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the log parses but does not carry `measure`.
    fn extract(&self, log: &SimulationLog, measure: &str) -> Result<Option<f64>>;
}

fn measurement_line() -> Option<&'static Regex> {
    static LINE: OnceLock<Option<Regex>> = OnceLock::new();
    LINE.get_or_init(|| {
        // `tphl=2.07e-11 FROM 1.05e-09 TO 1.07e-09` (LTspice) or
        // `tphl                =  2.07e-11 targ=  1.07e-09 trig=  1.05e-09` (ngspice)
        Regex::new(
            r"(?i)^\s*([a-z_][\w.]*)\s*=\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:e[-+]?\d+)?)\s*(?:(?:from|targ|trig|at)\b.*)?$",
        )
        .ok()
    })
    .as_ref()
}

/// Reads the measurement table a simulator prints after a `.meas` run.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuredReader;

impl StructuredReader {
    pub fn measurements(&self, log: &SimulationLog) -> Result<IndexMap<String, f64>> {
        let text = log.decode()?;
        let line_pattern = measurement_line().ok_or_else(|| Error::Log {
            path: log.path().to_path_buf(),
            reason: "measurement pattern unavailable".into(),
        })?;
        let mut table = IndexMap::new();
        for line in text.lines() {
            let Some(caps) = line_pattern.captures(line) else {
                continue;
            };
            if let Ok(value) = caps[2].parse::<f64>() {
                table.entry(caps[1].to_ascii_lowercase()).or_insert(value);
            }
        }
        Ok(table)
    }
}

impl MeasureExtractor for StructuredReader {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, log: &SimulationLog, measure: &str) -> Result<Option<f64>> {
        Ok(self
            .measurements(log)?
            .get(&measure.to_ascii_lowercase())
            .copied())
    }
}

/// Free-text fallback: first `<measure> = <number>` anywhere in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternScan;

impl MeasureExtractor for PatternScan {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, log: &SimulationLog, measure: &str) -> Result<Option<f64>> {
        let text = String::from_utf8_lossy(log.bytes());
        let pattern = format!(r"\b{}\s*=\s*([\d.eE+-]+)", regex::escape(measure));
        let re = Regex::new(&pattern).map_err(|e| Error::Log {
            path: log.path().to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(re
            .captures(&text)
            .and_then(|caps| caps[1].parse::<f64>().ok()))
    }
}

/// Ordered extraction strategies; the first one that yields a value wins.
pub struct ExtractionChain {
    strategies: Vec<Box<dyn MeasureExtractor>>,
}

impl ExtractionChain {
    pub fn new(strategies: Vec<Box<dyn MeasureExtractor>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, log: &SimulationLog, measure: &str) -> Option<f64> {
        for strategy in &self.strategies {
            match strategy.extract(log, measure) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => debug!("{}: '{}' not found by {}", log.path().display(), measure, strategy.name()),
                Err(e) => debug!("{}: {} reader failed: {}", log.path().display(), strategy.name(), e),
            }
        }
        None
    }
}

impl Default for ExtractionChain {
    /// Structured reader first, then the free-text scan.
    fn default() -> Self {
        Self::new(vec![Box::new(StructuredReader), Box::new(PatternScan)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(|u| u.to_le_bytes()));
        bytes
    }

    #[test]
    fn reads_ltspice_utf16_log() {
        let text = "Circuit: * inverter\r\n\r\ntphl=2.07e-11 FROM 1.05e-09 TO 1.0707e-09\r\ntplh=2.5e-11 FROM 3.05e-09 TO 3.075e-09\r\n";
        let log = SimulationLog::from_bytes("inv.log", utf16(text));
        let table = StructuredReader.measurements(&log).unwrap();
        assert_eq!(table.get("tphl"), Some(&2.07e-11));
        assert_eq!(table.get("tplh"), Some(&2.5e-11));
        assert_eq!(table.keys().collect::<Vec<_>>(), ["tphl", "tplh"]);
    }

    #[test]
    fn reads_ngspice_measure_lines() {
        let text = "tphl                =  1.234000e-11 targ=  1.012e-09 trig=  1.000e-09\n";
        let log = SimulationLog::from_bytes("inv.log", text.as_bytes().to_vec());
        assert_eq!(StructuredReader.extract(&log, "TPHL").unwrap(), Some(1.234e-11));
    }

    #[test]
    fn invalid_utf8_falls_through_to_pattern_scan() {
        let bytes = b"garbage \xFF\xFE\xFD here\nresult: tplh = 3.5e-11 somewhere\n".to_vec();
        let log = SimulationLog::from_bytes("inv.log", bytes);
        assert!(StructuredReader.extract(&log, "tplh").is_err());
        assert_eq!(ExtractionChain::default().extract(&log, "tplh"), Some(3.5e-11));
        assert_eq!(ExtractionChain::default().extract(&log, "tphl"), None);
    }

    #[test]
    fn pattern_scan_needs_a_word_boundary() {
        let log = SimulationLog::from_bytes("inv.log", b"xtphl = 1.0\n".to_vec());
        assert_eq!(PatternScan.extract(&log, "tphl").unwrap(), None);
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            SimulationLog::read("/nonexistent/inv.log"),
            Err(Error::MissingLog(_))
        ));
    }
}

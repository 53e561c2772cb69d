use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{Error, Result};

/// A SPICE deck whose `.param` values can be rewritten before a run.
#[derive(Clone, Debug)]
pub struct CircuitTemplate {
    path: PathBuf,
    lines: Vec<String>,
}

impl CircuitTemplate {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::MissingTemplate(path));
        }
        let text = fs::read_to_string(&path)?;
        Ok(Self::from_text(path, &text))
    }

    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem used to name the generated netlist and log.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("circuit")
    }

    /// Sets `name` in the first `.param` statement that defines it, or adds a
    /// `.param` line before `.end` when no statement does.
    pub fn set_parameter(&mut self, name: &str, value: &str) {
        // Word boundary on both sides so `L` does not match `Lmin`.
        let pattern = format!(r"(?i)(\b{}\s*=\s*)(\{{[^}}]*\}}|\S+)", regex::escape(name));
        let Ok(assignment) = Regex::new(&pattern) else {
            return;
        };

        for line in self.lines.iter_mut().filter(|l| is_param_line(l)) {
            if assignment.is_match(line.as_str()) {
                let replaced = assignment
                    .replacen(line.as_str(), 1, |caps: &regex::Captures| format!("{}{}", &caps[1], value))
                    .into_owned();
                *line = replaced;
                return;
            }
        }

        let statement = format!(".param {}={}", name, value);
        match self.lines.iter().rposition(|l| is_end_line(l)) {
            Some(idx) => self.lines.insert(idx, statement),
            None => self.lines.push(statement),
        }
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn is_param_line(line: &str) -> bool {
    line.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case(".param"))
}

fn is_end_line(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(".end")
}

//! Duration probing via an external media inspector.
//!
//! The inspector (ffprobe by default) prints a `Duration: HH:MM:SS.frac`
//! line on stderr when given a media file and no output arguments; that
//! line is the whole contract.

use super::error::ScanError;
use regex::Regex;
use std::path::Path;
use std::process::Command;

const DURATION_PATTERN: &str = r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d+)";

/// Seam between the pipeline and the external process, so tests can supply
/// fixed durations without spawning anything.
pub trait DurationProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64, ScanError>;
}

pub struct FfprobeDurationProbe {
    command: String,
    duration_re: Regex,
}

impl FfprobeDurationProbe {
    pub fn new(command: impl Into<String>) -> Result<Self, ScanError> {
        Ok(Self {
            command: command.into(),
            duration_re: Regex::new(DURATION_PATTERN)?,
        })
    }
}

impl DurationProbe for FfprobeDurationProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64, ScanError> {
        let output = Command::new(&self.command).arg(path).output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(ScanError::ProbeFailed {
                path: path.to_path_buf(),
                detail: stderr.lines().last().unwrap_or("no output").to_string(),
            });
        }
        parse_duration(&self.duration_re, &stderr)
            .ok_or_else(|| ScanError::NoDuration(path.to_path_buf()))
    }
}

/// Pull the first duration line out of inspector output. The fractional
/// part keeps whatever precision the inspector printed.
fn parse_duration(re: &Regex, output: &str) -> Option<f64> {
    let captures = re.captures(output)?;
    let hours: f64 = captures[1].parse().ok()?;
    let minutes: f64 = captures[2].parse().ok()?;
    let seconds: f64 = captures[3].parse().ok()?;
    let frac_text = &captures[4];
    let frac: f64 = frac_text.parse().ok()?;
    let scale = 10f64.powi(frac_text.len() as i32);
    Some(hours * 3600.0 + minutes * 60.0 + seconds + frac / scale)
}

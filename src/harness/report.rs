use std::path::Path;

use chrono::Utc;
use color_eyre::owo_colors::OwoColorize;
use eyre::{Context, Result};
use serde::Serialize;
use tokio::fs;

/* === Definitions === */

/// Scored outcome of a harness run.
#[derive(Serialize)]
pub struct Report {
    timestamp_ms: i64,
    checks: Vec<CheckRecord>,
}

#[derive(Serialize)]
pub struct CheckRecord {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/* === Implementations === */

impl Report {
    /// Score below which the verdict stops being friendly.
    const MOSTLY_FUNCTIONAL: f32 = 80.;

    pub fn new() -> Self {
        Report {
            timestamp_ms: Utc::now().timestamp_millis(),
            checks: Vec::new(),
        }
    }

    /// Records one check outcome and prints its PASS/FAIL line.
    pub fn record(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        let detail = detail.into();

        match passed {
            true => println!("  {} {name}: {detail}", "PASS".green()),
            false => println!("  {} {name}: {detail}", "FAIL".red()),
        }

        self.checks.push(CheckRecord {
            name: name.to_owned(),
            passed,
            detail,
        });
    }

    pub fn run(&self) -> usize {
        self.checks.len()
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|check| check.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.run() - self.passed()
    }

    pub fn score(&self) -> f32 {
        match self.run() {
            0 => 0.,
            run => 100. * self.passed() as f32 / run as f32,
        }
    }

    pub fn print_summary(&self) {
        println!();
        println!("== Summary ==");
        println!("Checks run    {}", self.run());
        println!("Passed        {}", self.passed());
        println!("Failed        {}", self.failed());
        println!("Success rate  {:.1}%", self.score());
        println!();

        if self.run() == 0 {
            println!("{}", "No checks were run.".yellow());
        } else if self.failed() == 0 {
            println!("{}", "All checks passed, the unit looks fully functional.".green());
        } else if self.score() >= Self::MOSTLY_FUNCTIONAL {
            println!("{}", "Mostly functional, review the failed checks.".yellow());
        } else {
            println!("{}", "Needs debugging before the unit can be trusted.".red());
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).wrap_err("Failed to serialize the report")?;

        fs::write(path, json)
            .await
            .wrap_err_with(|| format!("Failed to write the report to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score() {
        let mut report = Report::new();

        assert_eq!(report.run(), 0);
        assert_eq!(report.score(), 0.);

        report.record("first", true, "ok");
        report.record("second", true, "ok");
        report.record("third", false, "broken");

        assert_eq!(report.run(), 3);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert!((report.score() - 66.7).abs() < 0.1);
    }

    #[test]
    fn test_serializes_check_records() {
        let mut report = Report::new();
        report.record("echo", true, "target echoed as 20");

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["checks"][0]["name"], "echo");
        assert_eq!(json["checks"][0]["passed"], true);
    }
}

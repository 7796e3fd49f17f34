//! Terminal output for humans.
//!
//! Diagnostics go through `tracing`; this module prints the short styled lines
//! a user reads. Warnings and errors always print, everything else is dropped
//! under `--quiet`.

use crate::types::ContentCounts;
use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ui {
    quiet: bool,
}

impl Ui {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn header(&self, subtitle: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!(
            "{} {}",
            style("  Cowale AI Kit").bold().cyan(),
            style(subtitle).dim()
        );
        println!();
    }

    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").cyan(), msg);
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), msg);
        }
    }

    pub fn step(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(format!("  {}", msg)).dim());
        }
    }

    pub fn blank(&self) {
        if !self.quiet {
            println!();
        }
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", style("✖").red(), msg);
    }

    /// Hint lines under a warning or error; printed even when quiet.
    pub fn hint(&self, msg: &str) {
        eprintln!("{}", style(format!("  {}", msg)).dim());
    }

    pub fn counts(&self, counts: &ContentCounts) {
        self.step(&format!("📁 {} agents", style(counts.agents).bold()));
        self.step(&format!("📦 {} skills", style(counts.skills).bold()));
        self.step(&format!("⚡ {} workflows", style(counts.workflows).bold()));
    }
}

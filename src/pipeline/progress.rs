// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Progress output for verbose runs
//!
//! Prints one line per step with its elapsed and cumulative time. Quiet
//! reporters print nothing; the run itself is unaffected either way.

use std::time::Duration;

use colored::Colorize;

/// Per-run progress printer
#[derive(Debug, Clone)]
pub struct Progress {
    verbose: bool,
    indent: String,
    total: Duration,
}

impl Progress {
    pub fn new(verbose: bool, indent: usize) -> Self {
        Self {
            verbose,
            indent: "  ".repeat(indent),
            total: Duration::ZERO,
        }
    }

    /// Cumulative time of the steps finished so far
    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn start(&self, name: &str) {
        if self.verbose {
            print!("{}{} {}...", self.indent, "→".blue(), name);
        }
    }

    pub fn finish(&mut self, name: &str, elapsed: Duration) {
        self.total += elapsed;
        if self.verbose {
            println!(
                "\r{}{} {} {}",
                self.indent,
                "✓".green(),
                format!("{}:", name).bold(),
                format!(
                    "{:.2}s, total: {:.2}s",
                    elapsed.as_secs_f64(),
                    self.total.as_secs_f64()
                )
                .dimmed()
            );
        }
    }

    pub fn fail(&self, name: &str) {
        if self.verbose {
            println!("\r{}{} {} failed", self.indent, "✗".red(), name.bold());
        }
    }

    pub fn skip(&self, name: &str) {
        if self.verbose {
            println!(
                "{}{} {}",
                self.indent,
                "○".dimmed(),
                format!("Already run {}, skipping...", name).dimmed()
            );
        }
    }

    pub fn done(&self) {
        if self.verbose {
            println!(
                "{}{}",
                self.indent,
                format!("DONE! Total time: {:.2} seconds", self.total.as_secs_f64()).green()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_accumulates() {
        let mut progress = Progress::new(false, 1);
        progress.finish("a", Duration::from_millis(250));
        progress.finish("b", Duration::from_millis(750));
        assert_eq!(progress.total(), Duration::from_secs(1));
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(Progress::new(true, 2).indent, "    ");
        assert_eq!(Progress::new(true, 0).indent, "");
    }
}

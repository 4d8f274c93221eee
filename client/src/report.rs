//! Pass/fail bookkeeping and console output

use std::fmt::Display;

/// One observed field compared against its expected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl Check {
    pub fn new(field: &'static str, expected: impl Display, actual: impl Display) -> Self {
        Self {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

/// Outcome of one suite
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub name: String,
    pub checks: Vec<Check>,
    /// Set when the suite aborted before finishing its checks
    pub error: Option<String>,
}

impl SuiteReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed())
    }

    pub fn passed(&self) -> bool {
        self.error.is_none() && self.failed_checks().next().is_none()
    }

    pub fn print(&self) {
        for check in &self.checks {
            if check.passed() {
                println!("✅ {} matches: {}", check.field, check.actual);
            } else {
                println!(
                    "❌ {} check failed! Expected: {}, Got: {}",
                    check.field, check.expected, check.actual
                );
            }
        }

        if let Some(error) = &self.error {
            eprintln!("❌ {} aborted: {}", self.name, error);
        } else if self.passed() {
            println!("✅ All {} checks passed!", self.name);
        } else {
            println!("❌ Some {} checks failed. See details above.", self.name);
        }
    }
}

/// Totals across the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn record(&mut self, report: &SuiteReport) {
        if report.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn print(&self) {
        println!("\n═══════════════════════════════════════════════════════════");
        println!("  Smoke Test Summary");
        println!("═══════════════════════════════════════════════════════════");
        println!("  ✅ Passed:  {}", self.passed);
        println!("  ❌ Failed:  {}", self.failed);
        println!("  ⚠️  Skipped: {}", self.skipped);
        println!("  📊 Total:   {}", self.total());
        println!("═══════════════════════════════════════════════════════════\n");
    }
}

pub fn print_banner(rpc_url: &str, program_id: impl Display) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("  Portfolio Program Smoke Tests");
    println!("  RPC:     {}", rpc_url);
    println!("  Program: {}", program_id);
    println!("═══════════════════════════════════════════════════════════");
}

pub fn print_section(title: &str) {
    println!("\n━━━ {} ━━━", title);
}

/// Print decoded account fields, one per line
pub fn print_fields(heading: &str, fields: &[(&'static str, String)]) {
    println!("{}:", heading);
    for (label, value) in fields {
        println!("  {}: {}", label, value);
    }
}

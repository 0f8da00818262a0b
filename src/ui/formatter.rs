//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text, `display_*` functions print it.

use console::style;

use crate::domain::Stage;
use crate::pipeline::{PipelineKind, PipelineReport};
use crate::warnings::DeployWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_warning(warning: &DeployWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

pub fn format_stage(step: usize, total: usize, stage: Stage) -> String {
    format!(
        "{} {}",
        style(format!("[{}/{}]", step, total)).dim(),
        style(stage.name()).bold()
    )
}

/// Print the header of a pipeline stage, e.g. `[3/6] build artifact`.
pub fn display_stage(step: usize, total: usize, stage: Stage) {
    println!("\n{}", format_stage(step, total, stage));
}

/// Stages a deployment would run, numbered, with the target on top.
pub fn format_plan(kind: PipelineKind, version: &str, app_name: &str) -> String {
    let mut out = format!(
        "{} {} {} to {}\n",
        style("Dry run:").bold(),
        app_name,
        version,
        kind.target()
    );
    for (i, stage) in kind.stages().iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, stage.name()));
    }
    out
}

pub fn display_plan(kind: PipelineKind, version: &str, app_name: &str) {
    print!("{}", format_plan(kind, version, app_name));
}

pub fn format_report(report: &PipelineReport) -> String {
    format!(
        "{} Released {}\n  artifact: {}\n  tag:      {}",
        style("✓").green(),
        style(&report.version).green().bold(),
        report.artifact.display(),
        report.tag.name()
    )
}

/// Print the summary of a finished deployment followed by its warnings.
pub fn display_report(report: &PipelineReport) {
    println!("\n{}", format_report(report));
    for warning in &report.warnings {
        display_warning(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReleaseTag, ReleaseVersion};
    use crate::notify::NotifyOutcome;
    use console::strip_ansi_codes;
    use std::path::PathBuf;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_success() {
        display_success("test success");
    }

    #[test]
    fn test_format_stage() {
        let text = format_stage(3, 6, Stage::Build);
        assert_eq!(strip_ansi_codes(&text), "[3/6] build artifact");
    }

    #[test]
    fn test_format_plan_lists_every_stage() {
        let text = format_plan(PipelineKind::TestFlight, "2.0.0", "Acme");
        let text = strip_ansi_codes(&text);
        assert!(text.starts_with("Dry run: Acme 2.0.0 to TestFlight"));
        assert!(text.contains("5. publish symbols"));
        assert!(text.contains("7. tag release"));
    }

    #[test]
    fn test_format_report() {
        let version = ReleaseVersion::new("2.0.0", 42);
        let report = PipelineReport {
            tag: ReleaseTag::new("fastlane-builds", "acme", &version),
            version,
            artifact: PathBuf::from("build/ios/Acme.ipa"),
            notification: NotifyOutcome::Sent,
            warnings: Vec::new(),
        };
        let text = format_report(&report);
        let text = strip_ansi_codes(&text);
        assert!(text.contains("Released 2.0.0+42"));
        assert!(text.contains("build/ios/Acme.ipa"));
        assert!(text.contains("fastlane-builds/acme/2.0.0+42"));
    }
}

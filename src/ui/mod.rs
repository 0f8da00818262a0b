//! User interface module - interaction (prompts) and formatting.
//!
//! - `formatter` - Pure formatting functions
//! - This module - Interactive confirmation

use std::io::{self, Write};

use anyhow::Result;

pub mod formatter;

pub use formatter::{
    display_error, display_plan, display_report, display_stage, display_status, display_success,
    display_warning,
};

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive); anything else, including Enter,
/// declines. When no one is attending the terminal (CI) the action is
/// confirmed without asking.
pub fn confirm_action(prompt: &str) -> Result<bool> {
    if !console::user_attended() {
        return Ok(true);
    }

    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_confirmation(&input))
}

fn is_confirmation(input: &str) -> bool {
    let response = input.trim().to_lowercase();
    response == "y" || response == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_confirmation() {
        assert!(is_confirmation("y\n"));
        assert!(is_confirmation(" YES "));
        assert!(!is_confirmation("\n"));
        assert!(!is_confirmation("no"));
    }
}

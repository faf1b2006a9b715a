//! UI adapter for blocking confirmations and alerts.
//!
//! Core functions return `Result`s; showing a confirmation before a destructive
//! command and surfacing failures to the user is the job of whatever implements
//! [`Prompt`].

use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// Blocking yes/no questions and notices shown to the user.
pub trait Prompt {
    /// Asks the user to confirm; `false` cancels the action.
    fn confirm(&self, message: &str) -> bool;

    /// Shows a message the user must acknowledge.
    fn alert(&self, message: &str);
}

/// Terminal prompt reading answers from stdin.
///
/// With `assume_yes` every confirmation is accepted without reading input,
/// which is what the headless runner uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt {
    /// Accept every confirmation
    pub assume_yes: bool,
}

impl Prompt for ConsolePrompt {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            info!("Confirmed automatically: {message}");
            return true;
        }

        print!("{message} [s/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
    }

    fn alert(&self, message: &str) {
        warn!("Alert: {message}");
        println!("{message}");
    }
}

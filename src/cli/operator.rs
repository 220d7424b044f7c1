//! Operator interaction.
//!
//! This module defines the operator-facing capability the orchestrator
//! consumes - showing the diff, reading the confirmation answer, opening
//! the console progress page - and its terminal implementation.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::arn;
use crate::error::Result;

/// Longest confirmation answer read from stdin, in bytes.
const CONFIRM_INPUT_LIMIT: u64 = 10;

/// Operator-facing side of the workflow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Operator: Send + Sync {
    /// Shows the rendered diff and asks for a yes/no answer.
    ///
    /// Returns true only for an explicit yes.
    async fn confirm(&self, rendered_diff: &str) -> Result<bool>;

    /// Opens a progress URL in a viewer. Best-effort; callers log
    /// failures instead of escalating.
    fn open_progress(&self, url: &str) -> Result<()>;
}

/// Terminal-backed operator: stderr output, stdin confirmation, platform
/// browser opener.
#[derive(Debug, Default)]
pub struct TerminalOperator;

impl TerminalOperator {
    /// Creates a new terminal operator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn confirm(&self, rendered_diff: &str) -> Result<bool> {
        if !rendered_diff.is_empty() {
            eprintln!("{rendered_diff}");
        }

        eprintln!();
        eprint!("Do you want to continue? [y/N] ");

        let mut answer = String::new();
        let mut reader = BufReader::new(tokio::io::stdin().take(CONFIRM_INPUT_LIMIT));
        reader.read_line(&mut answer).await?;

        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    fn open_progress(&self, url: &str) -> Result<()> {
        let opener = match std::env::consts::OS {
            "macos" => "open",
            "linux" | "freebsd" => "xdg-open",
            "windows" => "explorer.exe",
            other => {
                return Err(std::io::Error::other(format!(
                    "don't know how to open a url on {other}"
                ))
                .into());
            }
        };

        let status = std::process::Command::new(opener).arg(url).status()?;
        if !status.success() {
            return Err(std::io::Error::other(format!("{opener} exited with {status}")).into());
        }
        Ok(())
    }
}

/// Builds the console "view resource" URL for a stack ARN.
///
/// # Errors
///
/// Returns an input error if the ARN is malformed.
pub fn console_url(stack_arn: &str) -> Result<String> {
    let region = arn::region_of(stack_arn)?;
    Ok(format!(
        "https://{region}.console.aws.amazon.com/go/view?arn={}",
        encode_query_value(stack_arn)
    ))
}

/// Percent-encodes the characters an ARN can carry that are not safe in
/// a query value.
fn encode_query_value(value: &str) -> String {
    value.replace(':', "%3A").replace('/', "%2F")
}

//! CLI argument definitions.
//!
//! This module defines the command-line surface using clap.

use clap::Parser;
use std::path::{Path, PathBuf};

/// Stackpilot - safe CloudFormation stack updates through change sets.
#[derive(Parser, Debug)]
#[command(name = "stackpilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the template file.
    pub template: PathBuf,

    /// Stack name; derived from the template file name if not set.
    #[arg(short = 'n', long)]
    pub stack_name: Option<String>,

    /// Parameter override as KEY=VALUE (repeatable).
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub param: Vec<String>,

    /// Output format for the change diff (text, json).
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Derives a stack name from a template path: file name minus extension.
#[must_use]
pub fn derive_stack_name(template: &Path) -> String {
    template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_name_from_template_path() {
        assert_eq!(
            derive_stack_name(Path::new("deploy/orders-svc.yml")),
            "orders-svc"
        );
        assert_eq!(derive_stack_name(Path::new("stack.template.json")), "stack.template");
        assert_eq!(derive_stack_name(Path::new("plain")), "plain");
    }
}

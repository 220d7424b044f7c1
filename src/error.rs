//! Error types for the stackpilot update workflow.
//!
//! This module provides the error hierarchy for all phases of the
//! change-set lifecycle: input handling, template upload, remote
//! CloudFormation calls, and the operator confirmation gate.

use thiserror::Error;

/// The main error type for stackpilot operations.
#[derive(Debug, Error)]
pub enum StackPilotError {
    /// Bad input, caught before any remote call was made.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Template upload errors.
    #[error("Template upload error: {0}")]
    Template(#[from] TemplateError),

    /// Remote CloudFormation errors.
    #[error("CloudFormation error: {0}")]
    Remote(#[from] RemoteError),

    /// The operator declined to execute the change set.
    #[error("aborted")]
    Aborted,

    /// The run was interrupted before reaching a terminal state.
    #[error("interrupted")]
    Cancelled,

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The workflow phase a remote call belongs to.
///
/// Carried inside [`RemoteError`] so a failure names the phase it
/// happened in without requiring a verbose rerun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial stack lookup.
    DescribeStack,
    /// Change set creation request.
    CreateChangeSet,
    /// Polling the change set status.
    DescribeChangeSet,
    /// Change set execution request.
    ExecuteChangeSet,
    /// Change set deletion during cleanup.
    DeleteChangeSet,
    /// Best-effort failed-event lookup.
    DescribeEvents,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DescribeStack => "DescribeStacks",
            Self::CreateChangeSet => "CreateChangeSet",
            Self::DescribeChangeSet => "DescribeChangeSet",
            Self::ExecuteChangeSet => "ExecuteChangeSet",
            Self::DeleteChangeSet => "DeleteChangeSet",
            Self::DescribeEvents => "DescribeStackEvents",
        };
        f.write_str(name)
    }
}

/// Errors in the inputs to the run, raised before anything remote exists.
#[derive(Debug, Error)]
pub enum InputError {
    /// The template file exceeds the hard size cap.
    #[error("template is too big: {size} bytes (limit {limit})")]
    TemplateTooLarge {
        /// Actual template size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        limit: usize,
    },

    /// The stack identifier is not ARN-shaped or has no region field.
    #[error("cannot extract region from {arn:?}")]
    MalformedArn {
        /// The offending identifier.
        arn: String,
    },

    /// A `--param` flag was not in `KEY=VALUE` form.
    #[error("invalid parameter override {spec:?}, want KEY=VALUE")]
    InvalidOverride {
        /// The offending flag value.
        spec: String,
    },
}

/// Errors while resolving an oversized template to an S3 reference.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template bucket for the stack's region was found.
    #[error("cannot discover a template bucket in region {region}")]
    BucketDiscoveryFailed {
        /// Region the discovery ran in.
        region: String,
    },

    /// The template object could not be uploaded.
    #[error("uploading template: {message}")]
    UploadFailed {
        /// Description of the underlying transport failure.
        message: String,
    },
}

/// Errors reported by or while talking to CloudFormation.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A remote call failed in transport, before any status was observed.
    #[error("{phase}: {message}")]
    CallFailed {
        /// The phase the call belongs to.
        phase: Phase,
        /// Description of the transport failure.
        message: String,
    },

    /// Stack lookup returned something other than exactly one stack.
    #[error("DescribeStacks for {name:?} returned {count} stacks, expected 1")]
    AmbiguousStack {
        /// Stack name that was looked up.
        name: String,
        /// Number of stacks returned.
        count: usize,
    },

    /// The change set reached a failed status while being created.
    #[error("change set create: {status}{}", format_reason(.reason))]
    ProposalFailed {
        /// The terminal status reported by the service.
        status: String,
        /// Service-provided failure reason, when present.
        reason: Option<String>,
    },

    /// The service reported a status this tool does not know.
    #[error("{phase}: unexpected status {status:?}")]
    UnexpectedStatus {
        /// The phase the status was observed in.
        phase: Phase,
        /// The unknown status value.
        status: String,
    },

    /// The change set was created but refused execution.
    #[error("unexpected change set execution status: {status}")]
    NotExecutable {
        /// The execution status reported by the service.
        status: String,
    },

    /// Execution reached a terminal status other than complete.
    #[error("change set execution status: {status}")]
    ExecutionFailed {
        /// The terminal execution status.
        status: String,
    },

    /// The change set contains a change kind this tool cannot render.
    #[error("unsupported change type: {kind}")]
    UnsupportedChangeKind {
        /// The unrecognized change kind.
        kind: String,
    },
}

/// Formats an optional failure reason as a `, reason` suffix.
fn format_reason(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(", {r}"))
        .unwrap_or_default()
}

/// Result type alias for stackpilot operations.
pub type Result<T> = std::result::Result<T, StackPilotError>;

impl StackPilotError {
    /// Returns true for operator-initiated exits (decline or interrupt),
    /// which are reported without the alarming `Error:` prefix.
    #[must_use]
    pub const fn is_operator_exit(&self) -> bool {
        matches!(self, Self::Aborted | Self::Cancelled)
    }
}

impl RemoteError {
    /// Creates a transport failure for the given phase.
    #[must_use]
    pub fn call(phase: Phase, message: impl Into<String>) -> Self {
        Self::CallFailed {
            phase,
            message: message.into(),
        }
    }
}

impl TemplateError {
    /// Creates an upload failure with the given message.
    #[must_use]
    pub fn upload(message: impl Into<String>) -> Self {
        Self::UploadFailed {
            message: message.into(),
        }
    }
}

//! CloudFormation change-set domain types.
//!
//! This module defines the types exchanged with the change-management API:
//! the described stack, parameter overrides and the merged parameter list,
//! change-set statuses, resource changes, and failure events.

use crate::error::{InputError, Result};
use crate::template::TemplateSource;

/// A described CloudFormation stack. Read-only input to the workflow.
#[derive(Debug, Clone)]
pub struct Stack {
    /// Stack name.
    pub name: String,
    /// Stack ARN.
    pub stack_id: String,
    /// Current parameters, in the order the service reports them.
    pub parameters: Vec<StackParameter>,
    /// Capabilities already granted to the stack.
    pub capabilities: Vec<String>,
}

/// One of a stack's current parameters.
#[derive(Debug, Clone)]
pub struct StackParameter {
    /// Parameter key.
    pub key: String,
    /// Current value, when the service reports one.
    pub value: Option<String>,
}

/// A parameter override supplied on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterOverride {
    /// Parameter key.
    pub key: String,
    /// New value for the key.
    pub value: String,
}

impl ParameterOverride {
    /// Parses a `KEY=VALUE` override specification.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidOverride`] if the spec has no `=` or
    /// an empty key.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Self {
                key: key.to_string(),
                value: value.to_string(),
            }),
            _ => Err(InputError::InvalidOverride {
                spec: spec.to_string(),
            }
            .into()),
        }
    }
}

/// A parameter entry as submitted with the change-set creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalParameter {
    /// Parameter key.
    pub key: String,
    /// New value; `None` when the previous value is reused.
    pub value: Option<String>,
    /// Instructs the service to keep the stack's current value.
    pub use_previous: bool,
}

/// Builds the parameter list submitted with the change set.
///
/// Every key the stack already has appears exactly once, in the stack's
/// order: with the override value when one was given, otherwise marked to
/// reuse the previous value. Overrides for keys the stack does not have
/// are appended afterwards (parameters the new template introduces).
#[must_use]
pub fn merge_parameters(
    stack: &Stack,
    overrides: &[ParameterOverride],
) -> Vec<ProposalParameter> {
    let mut merged: Vec<ProposalParameter> = stack
        .parameters
        .iter()
        .map(|p| {
            overrides
                .iter()
                .find(|o| o.key == p.key)
                .map_or_else(
                    || ProposalParameter {
                        key: p.key.clone(),
                        value: None,
                        use_previous: true,
                    },
                    |o| ProposalParameter {
                        key: o.key.clone(),
                        value: Some(o.value.clone()),
                        use_previous: false,
                    },
                )
        })
        .collect();

    for o in overrides {
        if !stack.parameters.iter().any(|p| p.key == o.key) {
            merged.push(ProposalParameter {
                key: o.key.clone(),
                value: Some(o.value.clone()),
                use_previous: false,
            });
        }
    }

    merged
}

/// Input for the change-set creation request.
#[derive(Debug, Clone)]
pub struct CreateProposalInput {
    /// Name of the stack to update.
    pub stack_name: String,
    /// Locally generated change-set name, unique for the run.
    pub change_set_name: String,
    /// Merged parameter list.
    pub parameters: Vec<ProposalParameter>,
    /// Capabilities inherited from the stack.
    pub capabilities: Vec<String>,
    /// Resolved template payload.
    pub source: TemplateSource,
    /// Human-readable description stamped on the change set.
    pub description: String,
}

/// Change-set creation status lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Creation accepted, not started.
    CreatePending,
    /// Creation running.
    CreateInProgress,
    /// Change set materialized.
    CreateComplete,
    /// Creation failed.
    Failed,
    /// Any status this tool does not know.
    Other(String),
}

impl From<&str> for ProposalStatus {
    fn from(s: &str) -> Self {
        match s {
            "CREATE_PENDING" => Self::CreatePending,
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePending => f.write_str("CREATE_PENDING"),
            Self::CreateInProgress => f.write_str("CREATE_IN_PROGRESS"),
            Self::CreateComplete => f.write_str("CREATE_COMPLETE"),
            Self::Failed => f.write_str("FAILED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Change-set execution status lifecycle, separate from creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Not executable yet (or no longer).
    Unavailable,
    /// Ready to execute.
    Available,
    /// Execution running.
    ExecuteInProgress,
    /// Execution finished successfully.
    ExecuteComplete,
    /// Execution failed.
    ExecuteFailed,
    /// Superseded by another change set.
    Obsolete,
    /// Any status this tool does not know.
    Other(String),
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "UNAVAILABLE" => Self::Unavailable,
            "AVAILABLE" => Self::Available,
            "EXECUTE_IN_PROGRESS" => Self::ExecuteInProgress,
            "EXECUTE_COMPLETE" => Self::ExecuteComplete,
            "EXECUTE_FAILED" => Self::ExecuteFailed,
            "OBSOLETE" => Self::Obsolete,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => f.write_str("UNAVAILABLE"),
            Self::Available => f.write_str("AVAILABLE"),
            Self::ExecuteInProgress => f.write_str("EXECUTE_IN_PROGRESS"),
            Self::ExecuteComplete => f.write_str("EXECUTE_COMPLETE"),
            Self::ExecuteFailed => f.write_str("EXECUTE_FAILED"),
            Self::Obsolete => f.write_str("OBSOLETE"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A described change set.
#[derive(Debug, Clone)]
pub struct ChangeProposal {
    /// Change set id (ARN).
    pub id: String,
    /// Creation status.
    pub status: ProposalStatus,
    /// Execution status.
    pub execution_status: ExecutionStatus,
    /// Service-provided failure reason, when present.
    pub status_reason: Option<String>,
    /// Proposed changes, in the order the service reports them.
    pub changes: Vec<Change>,
}

/// One entry of a change set, before the kind is validated.
#[derive(Debug, Clone)]
pub struct Change {
    /// Change kind as reported by the service (`Resource` is the only
    /// kind this tool renders).
    pub kind: String,
    /// The resource-level change, present for `Resource` entries.
    pub resource: Option<ResourceChange>,
}

/// A proposed change to a single managed resource.
#[derive(Debug, Clone)]
pub struct ResourceChange {
    /// What happens to the resource.
    pub action: ChangeAction,
    /// Whether applying requires replacing the resource
    /// (`True`, `False`, `Conditional`).
    pub replacement: String,
    /// CloudFormation resource type.
    pub resource_type: String,
    /// Logical id within the template.
    pub logical_id: String,
    /// Physical id; absent for resources not created yet.
    pub physical_id: Option<String>,
}

/// Action applied to a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    /// Resource will be created.
    Add,
    /// Resource will be updated in place or replaced.
    Modify,
    /// Resource will be deleted.
    Remove,
    /// Any action this tool does not know.
    Other(String),
}

impl From<&str> for ChangeAction {
    fn from(s: &str) -> Self {
        match s {
            "Add" => Self::Add,
            "Modify" => Self::Modify,
            "Remove" => Self::Remove,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => f.write_str("Add"),
            Self::Modify => f.write_str("Modify"),
            Self::Remove => f.write_str("Remove"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A failed resource event attached to a stack.
///
/// Fetched best-effort when change-set creation fails with a reason that
/// points at the event trail.
#[derive(Debug, Clone)]
pub struct FailureEvent {
    /// Logical id of the resource the event concerns.
    pub logical_id: Option<String>,
    /// CloudFormation resource type.
    pub resource_type: Option<String>,
    /// Resource status at the time of the event.
    pub status: Option<String>,
    /// Service-provided reason text.
    pub reason: Option<String>,
}

impl std::fmt::Display for FailureEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.logical_id.as_deref().unwrap_or_default(),
            self.resource_type.as_deref().unwrap_or_default(),
            self.status.as_deref().unwrap_or_default(),
            self.reason.as_deref().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with_params(params: &[(&str, &str)]) -> Stack {
        Stack {
            name: String::from("orders-svc"),
            stack_id: String::from(
                "arn:aws:cloudformation:us-east-1:123456789012:stack/orders-svc/abc",
            ),
            parameters: params
                .iter()
                .map(|(k, v)| StackParameter {
                    key: (*k).to_string(),
                    value: Some((*v).to_string()),
                })
                .collect(),
            capabilities: vec![],
        }
    }

    #[test]
    fn test_override_wins_and_missing_key_reuses_previous() {
        let stack = stack_with_params(&[("Version", "v1"), ("Region", "us-east-1")]);
        let overrides = vec![ParameterOverride {
            key: String::from("Version"),
            value: String::from("v2"),
        }];

        let merged = merge_parameters(&stack, &overrides);

        assert_eq!(
            merged,
            vec![
                ProposalParameter {
                    key: String::from("Version"),
                    value: Some(String::from("v2")),
                    use_previous: false,
                },
                ProposalParameter {
                    key: String::from("Region"),
                    value: None,
                    use_previous: true,
                },
            ]
        );
    }

    #[test]
    fn test_no_overrides_reuses_everything() {
        let stack = stack_with_params(&[("A", "1"), ("B", "2")]);
        let merged = merge_parameters(&stack, &[]);

        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|p| p.use_previous && p.value.is_none()));
        assert_eq!(merged[0].key, "A");
        assert_eq!(merged[1].key, "B");
    }

    #[test]
    fn test_new_key_appended_after_stack_keys() {
        let stack = stack_with_params(&[("A", "1")]);
        let overrides = vec![ParameterOverride {
            key: String::from("New"),
            value: String::from("x"),
        }];

        let merged = merge_parameters(&stack, &overrides);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].key, "New");
        assert_eq!(merged[1].value.as_deref(), Some("x"));
        assert!(!merged[1].use_previous);
    }

    #[test]
    fn test_override_parse() {
        let o = ParameterOverride::parse("Version=v2").unwrap();
        assert_eq!(o.key, "Version");
        assert_eq!(o.value, "v2");

        // Values may contain '='.
        let o = ParameterOverride::parse("Token=a=b").unwrap();
        assert_eq!(o.value, "a=b");

        assert!(ParameterOverride::parse("no-equals").is_err());
        assert!(ParameterOverride::parse("=value").is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            ProposalStatus::from("CREATE_COMPLETE"),
            ProposalStatus::CreateComplete
        );
        assert_eq!(ProposalStatus::from("FAILED"), ProposalStatus::Failed);
        assert!(matches!(
            ProposalStatus::from("DELETE_COMPLETE"),
            ProposalStatus::Other(_)
        ));

        assert_eq!(
            ExecutionStatus::from("AVAILABLE"),
            ExecutionStatus::Available
        );
        assert!(matches!(
            ExecutionStatus::from("SOMETHING_NEW"),
            ExecutionStatus::Other(_)
        ));
    }

    #[test]
    fn test_change_action_display_round_trip() {
        for s in ["Add", "Modify", "Remove", "Import"] {
            assert_eq!(ChangeAction::from(s).to_string(), s);
        }
    }
}

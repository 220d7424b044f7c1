//! CloudFormation-backed implementation of [`ChangeSetOps`].
//!
//! Wraps the AWS SDK client and converts between SDK types and the
//! domain types in [`super::types`].

use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types as cfn;
use aws_sdk_cloudformation::Client;
use tracing::debug;

use crate::error::{Phase, RemoteError, Result};
use crate::template::TemplateSource;

use super::ops::ChangeSetOps;
use super::types::{
    Change, ChangeProposal, CreateProposalInput, FailureEvent, ProposalParameter, ResourceChange,
    Stack, StackParameter,
};

/// Upper bound on event pages fetched for diagnostics.
const MAX_EVENT_PAGES: usize = 3;

/// CloudFormation change-set client.
#[derive(Debug, Clone)]
pub struct CloudFormationChangeSets {
    /// Underlying SDK client.
    client: Client,
}

impl CloudFormationChangeSets {
    /// Creates a client from a loaded AWS configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Converts a submitted parameter to its SDK form.
    fn to_sdk_parameter(p: &ProposalParameter) -> cfn::Parameter {
        let builder = cfn::Parameter::builder().parameter_key(&p.key);
        if p.use_previous {
            builder.use_previous_value(true).build()
        } else {
            builder.set_parameter_value(p.value.clone()).build()
        }
    }

    /// Converts an SDK change entry to its domain form.
    fn to_domain_change(c: &cfn::Change) -> Change {
        Change {
            kind: c
                .r#type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            resource: c.resource_change().map(|rc| ResourceChange {
                action: rc
                    .action()
                    .map(cfn::ChangeAction::as_str)
                    .unwrap_or_default()
                    .into(),
                replacement: rc
                    .replacement()
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_default(),
                resource_type: rc.resource_type().unwrap_or_default().to_string(),
                logical_id: rc.logical_resource_id().unwrap_or_default().to_string(),
                physical_id: rc.physical_resource_id().map(String::from),
            }),
        }
    }
}

#[async_trait]
impl ChangeSetOps for CloudFormationChangeSets {
    async fn describe_stack(&self, name: &str) -> Result<Stack> {
        debug!("Describing stack: {name}");

        let out = self
            .client
            .describe_stacks()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| {
                RemoteError::call(Phase::DescribeStack, DisplayErrorContext(&e).to_string())
            })?;

        let stacks = out.stacks();
        if stacks.len() != 1 {
            return Err(RemoteError::AmbiguousStack {
                name: name.to_string(),
                count: stacks.len(),
            }
            .into());
        }

        let stack = &stacks[0];
        Ok(Stack {
            name: stack.stack_name().unwrap_or(name).to_string(),
            stack_id: stack.stack_id().unwrap_or_default().to_string(),
            parameters: stack
                .parameters()
                .iter()
                .map(|p| StackParameter {
                    key: p.parameter_key().unwrap_or_default().to_string(),
                    value: p.parameter_value().map(String::from),
                })
                .collect(),
            capabilities: stack
                .capabilities()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
        })
    }

    async fn create_change_set(&self, input: &CreateProposalInput) -> Result<String> {
        debug!(
            "Creating change set {} for stack {}",
            input.change_set_name, input.stack_name
        );

        let parameters: Vec<cfn::Parameter> =
            input.parameters.iter().map(Self::to_sdk_parameter).collect();
        let capabilities: Vec<cfn::Capability> = input
            .capabilities
            .iter()
            .map(|c| cfn::Capability::from(c.as_str()))
            .collect();

        let builder = self
            .client
            .create_change_set()
            .stack_name(&input.stack_name)
            .change_set_name(&input.change_set_name)
            .change_set_type(cfn::ChangeSetType::Update)
            .description(&input.description)
            .set_parameters(Some(parameters))
            .set_capabilities(Some(capabilities));

        let builder = match &input.source {
            TemplateSource::Inline(body) => builder.template_body(body),
            TemplateSource::Url(url) => builder.template_url(url),
        };

        let out = builder.send().await.map_err(|e| {
            RemoteError::call(Phase::CreateChangeSet, DisplayErrorContext(&e).to_string())
        })?;

        out.id().map(String::from).ok_or_else(|| {
            RemoteError::call(Phase::CreateChangeSet, "response carried no change set id").into()
        })
    }

    async fn describe_change_set(&self, id: &str) -> Result<ChangeProposal> {
        let out = self
            .client
            .describe_change_set()
            .change_set_name(id)
            .send()
            .await
            .map_err(|e| {
                RemoteError::call(Phase::DescribeChangeSet, DisplayErrorContext(&e).to_string())
            })?;

        Ok(ChangeProposal {
            id: out.change_set_id().unwrap_or(id).to_string(),
            status: out
                .status()
                .map(cfn::ChangeSetStatus::as_str)
                .unwrap_or_default()
                .into(),
            execution_status: out
                .execution_status()
                .map(cfn::ExecutionStatus::as_str)
                .unwrap_or_default()
                .into(),
            status_reason: out.status_reason().map(String::from),
            changes: out.changes().iter().map(Self::to_domain_change).collect(),
        })
    }

    async fn execute_change_set(&self, id: &str) -> Result<()> {
        debug!("Executing change set: {id}");

        self.client
            .execute_change_set()
            .change_set_name(id)
            .send()
            .await
            .map_err(|e| {
                RemoteError::call(Phase::ExecuteChangeSet, DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }

    async fn delete_change_set(&self, stack_name: &str, change_set_name: &str) -> Result<()> {
        debug!("Deleting change set {change_set_name} on stack {stack_name}");

        self.client
            .delete_change_set()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(|e| {
                RemoteError::call(Phase::DeleteChangeSet, DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }

    async fn list_failed_events(&self, stack_name: &str) -> Result<Vec<FailureEvent>> {
        let mut events = Vec::new();
        let mut token: Option<String> = None;

        // Recent pages only; the full event history is not useful here.
        for _ in 0..MAX_EVENT_PAGES {
            let out = self
                .client
                .describe_stack_events()
                .stack_name(stack_name)
                .set_next_token(token)
                .send()
                .await
                .map_err(|e| {
                    RemoteError::call(Phase::DescribeEvents, DisplayErrorContext(&e).to_string())
                })?;

            for event in out.stack_events() {
                let status = event.resource_status().map(|s| s.as_str().to_string());
                if status.as_deref().is_some_and(|s| s.ends_with("FAILED")) {
                    events.push(FailureEvent {
                        logical_id: event.logical_resource_id().map(String::from),
                        resource_type: event.resource_type().map(String::from),
                        status,
                        reason: event.resource_status_reason().map(String::from),
                    });
                }
            }

            token = out.next_token().map(String::from);
            if token.is_none() {
                break;
            }
        }

        Ok(events)
    }
}

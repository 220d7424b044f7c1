//! Change-management capability trait.
//!
//! This module defines the abstract interface the orchestrator consumes;
//! the CloudFormation-backed implementation lives in [`super::client`].

use async_trait::async_trait;

use crate::error::Result;

use super::types::{ChangeProposal, CreateProposalInput, FailureEvent, Stack};

/// Remote change-management operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeSetOps: Send + Sync {
    /// Describes a stack by name.
    ///
    /// Fails unless exactly one stack matches.
    async fn describe_stack(&self, name: &str) -> Result<Stack>;

    /// Submits a change-set creation request.
    ///
    /// Returns the change set id (ARN) assigned by the service.
    async fn create_change_set(&self, input: &CreateProposalInput) -> Result<String>;

    /// Describes a change set by id.
    async fn describe_change_set(&self, id: &str) -> Result<ChangeProposal>;

    /// Starts execution of a change set.
    async fn execute_change_set(&self, id: &str) -> Result<()>;

    /// Deletes a change set.
    async fn delete_change_set(&self, stack_name: &str, change_set_name: &str) -> Result<()>;

    /// Fetches recent failed resource events for a stack.
    ///
    /// Best-effort diagnostics; callers log errors instead of escalating.
    async fn list_failed_events(&self, stack_name: &str) -> Result<Vec<FailureEvent>>;
}

//! CloudFormation change-set integration module.
//!
//! This module provides the change-management capability the orchestrator
//! drives: the domain types, the abstract operations trait, and the
//! AWS SDK implementation.

mod client;
mod ops;
mod types;

pub use client::CloudFormationChangeSets;
pub use ops::ChangeSetOps;
pub use types::{
    merge_parameters, Change, ChangeAction, ChangeProposal, CreateProposalInput, ExecutionStatus,
    FailureEvent, ParameterOverride, ProposalParameter, ProposalStatus, ResourceChange, Stack,
    StackParameter,
};

#[cfg(test)]
pub use ops::MockChangeSetOps;

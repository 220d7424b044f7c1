//! Change-set lifecycle orchestration.
//!
//! This module drives the whole update: create the change set, poll until
//! it is materialized, show the diff, gate execution on the operator's
//! answer, poll the execution until terminal, and delete the change set
//! on every exit path except successful execution. The lifecycle is an
//! explicit state machine so the cleanup-unless-executed invariant is
//! visible and testable.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::changeset::{
    merge_parameters, ChangeProposal, ChangeSetOps, CreateProposalInput, ExecutionStatus,
    ParameterOverride, ProposalStatus,
};
use crate::cli::{console_url, DiffPresenter, Operator};
use crate::error::{Phase, RemoteError, Result, StackPilotError};
use crate::poll::{poll_until, Tick, POLL_INTERVAL};
use crate::template::{BlobStore, PayloadResolver};

/// Description stamped on every change set this tool creates.
const CHANGE_SET_DESCRIPTION: &str = "created using stackpilot";

/// Marker in a failure reason pointing at the stack's event trail.
const EVENTS_TRAIL_MARKER: &str = "DescribeEvents";

/// Deadline for the best-effort cleanup delete. Independent of the run's
/// own cancellation, which may already have fired.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle states of one update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// Nothing submitted yet.
    Idle,
    /// Change set submitted, waiting for it to materialize.
    ProposalCreating,
    /// Diff shown, waiting for the operator's answer.
    AwaitingConfirmation,
    /// Execution submitted or running.
    Executing,
    /// Execution completed; the change set is left as an executed
    /// artifact.
    Done,
    /// The operator declined or the run was interrupted.
    Aborted,
    /// A fatal error ended the run.
    Failed,
}

/// The inputs of one update run.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Name of the stack to update.
    pub stack_name: String,
    /// Template body, read from disk by the caller.
    pub template_body: String,
    /// Parameter overrides from the command line.
    pub overrides: Vec<ParameterOverride>,
}

/// Identity of the change set once it exists remotely.
#[derive(Debug)]
struct CreatedProposal {
    /// Stack the change set belongs to.
    stack_name: String,
    /// Locally generated change set name.
    name: String,
}

/// Top-level controller for one update run.
pub struct ChangeSetOrchestrator<'a, C, S, O>
where
    C: ChangeSetOps,
    S: BlobStore,
    O: Operator,
{
    /// Remote change-management operations.
    ops: &'a C,
    /// Template payload resolver.
    resolver: PayloadResolver<S>,
    /// Operator interaction.
    operator: &'a O,
    /// Diff renderer.
    presenter: DiffPresenter,
    /// External cancellation signal.
    cancel: CancellationToken,
    /// Run inputs.
    request: UpdateRequest,
    /// Current lifecycle state.
    state: UpdateState,
    /// Set once the change set exists remotely.
    created: Option<CreatedProposal>,
    /// Set once execution completed; disarms cleanup.
    executed: bool,
}

impl<'a, C, S, O> ChangeSetOrchestrator<'a, C, S, O>
where
    C: ChangeSetOps,
    S: BlobStore,
    O: Operator,
{
    /// Creates an orchestrator for one update run.
    #[must_use]
    pub fn new(
        ops: &'a C,
        resolver: PayloadResolver<S>,
        operator: &'a O,
        presenter: DiffPresenter,
        cancel: CancellationToken,
        request: UpdateRequest,
    ) -> Self {
        Self {
            ops,
            resolver,
            operator,
            presenter,
            cancel,
            request,
            state: UpdateState::Idle,
            created: None,
            executed: false,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> UpdateState {
        self.state
    }

    /// Runs the update to a terminal state.
    ///
    /// Exactly one change set is created per run. Unless execution
    /// completed, it is deleted again before this returns, whatever the
    /// exit path.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of the run; [`StackPilotError::Aborted`]
    /// when the operator declined, [`StackPilotError::Cancelled`] when the
    /// run was interrupted.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.drive().await;

        self.state = match &result {
            Ok(()) => UpdateState::Done,
            Err(e) if e.is_operator_exit() => UpdateState::Aborted,
            Err(_) => UpdateState::Failed,
        };

        if !self.executed {
            if let Some(proposal) = self.created.take() {
                self.cleanup(&proposal).await;
            }
        }

        result
    }

    /// Advances through the lifecycle until done or the first error.
    async fn drive(&mut self) -> Result<()> {
        let cancel = self.cancel.clone();
        let ops = self.ops;
        let operator = self.operator;

        let stack = race_cancel(&cancel, ops.describe_stack(&self.request.stack_name)).await?;
        let parameters = merge_parameters(&stack, &self.request.overrides);
        let source = race_cancel(
            &cancel,
            self.resolver
                .resolve(&stack.name, &stack.stack_id, &self.request.template_body),
        )
        .await?;

        let change_set_name = format!("cs-{}", Uuid::new_v4().simple());
        let input = CreateProposalInput {
            stack_name: stack.name.clone(),
            change_set_name: change_set_name.clone(),
            parameters,
            capabilities: stack.capabilities.clone(),
            source,
            description: CHANGE_SET_DESCRIPTION.to_string(),
        };

        self.state = UpdateState::ProposalCreating;
        let id = race_cancel(&cancel, ops.create_change_set(&input)).await?;
        self.created = Some(CreatedProposal {
            stack_name: stack.name.clone(),
            name: change_set_name,
        });

        info!("waiting until change set is ready");
        let proposal = match poll_until(
            POLL_INTERVAL,
            &cancel,
            || ops.describe_change_set(&id),
            classify_create,
        )
        .await
        {
            Ok(proposal) => proposal,
            Err(e) => {
                self.log_failed_events_if_pointed_at(&stack.name, &e).await;
                return Err(e);
            }
        };

        // The service sometimes creates a change set it then refuses to
        // execute, e.g. when the update carries no actionable changes.
        if proposal.execution_status != ExecutionStatus::Available {
            return Err(RemoteError::NotExecutable {
                status: proposal.execution_status.to_string(),
            }
            .into());
        }

        self.state = UpdateState::AwaitingConfirmation;
        let rendered = self.presenter.render(&proposal.changes)?;
        let approved = race_cancel(&cancel, operator.confirm(&rendered)).await?;
        if !approved {
            return Err(StackPilotError::Aborted);
        }

        self.state = UpdateState::Executing;
        race_cancel(&cancel, ops.execute_change_set(&id)).await?;

        info!("waiting for update to complete, follow the stack update progress in the console");
        match console_url(&stack.stack_id) {
            Ok(url) => {
                if let Err(e) = operator.open_progress(&url) {
                    warn!("opening console: {e}");
                }
            }
            Err(e) => warn!("building console url: {e}"),
        }

        poll_until(
            POLL_INTERVAL,
            &cancel,
            || ops.describe_change_set(&id),
            classify_execute,
        )
        .await?;

        self.executed = true;
        Ok(())
    }

    /// Fetches and logs the stack's failed events when the failure reason
    /// points at the event trail. Errors here are logged, never fatal.
    async fn log_failed_events_if_pointed_at(&self, stack_name: &str, err: &StackPilotError) {
        let StackPilotError::Remote(RemoteError::ProposalFailed {
            reason: Some(reason),
            ..
        }) = err
        else {
            return;
        };
        if !reason.contains(EVENTS_TRAIL_MARKER) {
            return;
        }

        match self.ops.list_failed_events(stack_name).await {
            Ok(events) => {
                for event in events {
                    warn!("{event}");
                }
            }
            Err(e) => warn!("{}: {e}", Phase::DescribeEvents),
        }
    }

    /// Deletes the change set under a fresh deadline. A leaked change set
    /// is an operational nuisance, not a correctness violation; failures
    /// are logged and never escalated.
    async fn cleanup(&self, proposal: &CreatedProposal) {
        let delete = self
            .ops
            .delete_change_set(&proposal.stack_name, &proposal.name);

        match tokio::time::timeout(CLEANUP_TIMEOUT, delete).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("change set {:?} delete: {e}", proposal.name),
            Err(_) => warn!(
                "change set {:?} delete timed out after {CLEANUP_TIMEOUT:?}",
                proposal.name
            ),
        }
    }
}

/// Races a fallible future against the cancellation signal.
async fn race_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        () = cancel.cancelled() => Err(StackPilotError::Cancelled),
        result = fut => result,
    }
}

/// Classifies a snapshot while waiting for the change set to materialize.
fn classify_create(proposal: &ChangeProposal) -> Tick<ChangeProposal> {
    match &proposal.status {
        ProposalStatus::CreatePending | ProposalStatus::CreateInProgress => Tick::Continue,
        ProposalStatus::CreateComplete => Tick::Done(proposal.clone()),
        ProposalStatus::Failed => Tick::Fail(
            RemoteError::ProposalFailed {
                status: proposal.status.to_string(),
                reason: proposal.status_reason.clone().filter(|r| !r.is_empty()),
            }
            .into(),
        ),
        ProposalStatus::Other(status) => Tick::Fail(
            RemoteError::UnexpectedStatus {
                phase: Phase::DescribeChangeSet,
                status: status.clone(),
            }
            .into(),
        ),
    }
}

/// Classifies a snapshot while waiting for the execution to finish.
fn classify_execute(proposal: &ChangeProposal) -> Tick<()> {
    match &proposal.execution_status {
        ExecutionStatus::ExecuteInProgress => Tick::Continue,
        ExecutionStatus::ExecuteComplete => Tick::Done(()),
        other => Tick::Fail(
            RemoteError::ExecutionFailed {
                status: other.to_string(),
            }
            .into(),
        ),
    }
}

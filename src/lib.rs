// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// Test builds generate mock collaborators whose items carry no docs
#![cfg_attr(test, allow(missing_docs))]

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stackpilot
//!
//! Safe, observable CloudFormation stack updates through change sets.
//!
//! ## Overview
//!
//! Stackpilot never applies a template blindly. Given a stack name and a
//! new template it:
//!
//! - asks CloudFormation to compute the resource changes as a change set
//! - waits until the change set is materialized
//! - shows the proposed changes as a table and asks for confirmation
//! - executes the change set and waits for the update to finish
//! - deletes the change set on every exit path except successful execution
//!
//! Oversized templates are uploaded to the region's template bucket
//! transparently and referenced by URL.
//!
//! ## Modules
//!
//! - [`arn`]: region extraction from stack ARNs
//! - [`changeset`]: change-set domain types and the CloudFormation client
//! - [`template`]: inline-vs-upload payload resolution, S3 backend
//! - [`poll`]: cancellable poll-until-terminal primitive
//! - [`orchestrator`]: the change-set lifecycle state machine
//! - [`cli`]: argument parsing, diff rendering, operator interaction
//! - [`error`]: error taxonomy

// ============================================================================
// Modules
// ============================================================================

pub mod arn;
pub mod changeset;
pub mod cli;
pub mod error;
pub mod orchestrator;
pub mod poll;
pub mod template;

// ============================================================================
// Re-exports
// ============================================================================

pub use changeset::{ChangeSetOps, CloudFormationChangeSets, ParameterOverride, Stack};
pub use cli::{Cli, DiffPresenter, Operator, OutputFormat, TerminalOperator};
pub use error::{Phase, Result, StackPilotError};
pub use orchestrator::{ChangeSetOrchestrator, UpdateRequest, UpdateState};
pub use template::{PayloadResolver, S3BlobStore, TemplateSource, INLINE_TEMPLATE_LIMIT};

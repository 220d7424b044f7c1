//! Change diff rendering.
//!
//! This module renders a change set's proposed resource changes as a
//! fixed-column table for operator review, or as JSON for scripting.

use colored::Colorize;
use tabled::{Table, Tabled};

use crate::changeset::{Change, ChangeAction, ResourceChange};
use crate::error::{RemoteError, Result};

use super::commands::OutputFormat;

/// The only change kind this tool understands and renders.
const RESOURCE_CHANGE_KIND: &str = "Resource";

/// Renders proposed resource changes for the operator.
#[derive(Debug)]
pub struct DiffPresenter {
    /// Output format.
    format: OutputFormat,
}

/// Resource change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Replacement")]
    replacement: String,
    #[tabled(rename = "ResType")]
    resource_type: String,
    #[tabled(rename = "LogicalID")]
    logical_id: String,
    #[tabled(rename = "PhysicalID")]
    physical_id: String,
}

/// Resource change entry for JSON output.
#[derive(serde::Serialize)]
struct ChangeJson {
    action: String,
    replacement: String,
    resource_type: String,
    logical_id: String,
    physical_id: Option<String>,
}

impl DiffPresenter {
    /// Creates a new presenter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Renders the change list.
    ///
    /// An empty list renders as an empty string; a metadata-only update
    /// with zero resource changes is valid and shows no table.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnsupportedChangeKind`] if any entry is not
    /// a resource change; a silently incomplete diff would be worse than
    /// a hard abort.
    pub fn render(&self, changes: &[Change]) -> Result<String> {
        let resources = Self::resource_changes(changes)?;
        if resources.is_empty() {
            return Ok(String::new());
        }

        match self.format {
            OutputFormat::Text => Ok(Self::render_table(&resources)),
            OutputFormat::Json => Self::render_json(&resources),
        }
    }

    /// Validates every entry's kind and extracts the resource changes.
    fn resource_changes<'c>(changes: &'c [Change]) -> Result<Vec<&'c ResourceChange>> {
        changes
            .iter()
            .map(|c| match (&c.kind, &c.resource) {
                (kind, Some(rc)) if kind == RESOURCE_CHANGE_KIND => Ok(rc),
                _ => Err(RemoteError::UnsupportedChangeKind {
                    kind: c.kind.clone(),
                }
                .into()),
            })
            .collect()
    }

    /// Renders the fixed-column text table.
    fn render_table(resources: &[&ResourceChange]) -> String {
        let rows: Vec<ChangeRow> = resources
            .iter()
            .map(|rc| ChangeRow {
                action: Self::format_action(&rc.action),
                replacement: rc.replacement.clone(),
                resource_type: rc.resource_type.clone(),
                logical_id: rc.logical_id.clone(),
                physical_id: rc.physical_id.clone().unwrap_or_default(),
            })
            .collect();

        Table::new(rows).to_string()
    }

    /// Renders the JSON form.
    fn render_json(resources: &[&ResourceChange]) -> Result<String> {
        let entries: Vec<ChangeJson> = resources
            .iter()
            .map(|rc| ChangeJson {
                action: rc.action.to_string(),
                replacement: rc.replacement.clone(),
                resource_type: rc.resource_type.clone(),
                logical_id: rc.logical_id.clone(),
                physical_id: rc.physical_id.clone(),
            })
            .collect();

        serde_json::to_string_pretty(&entries)
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }

    /// Formats an action with color.
    fn format_action(action: &ChangeAction) -> String {
        match action {
            ChangeAction::Add => "Add".green().to_string(),
            ChangeAction::Modify => "Modify".yellow().to_string(),
            ChangeAction::Remove => "Remove".red().to_string(),
            ChangeAction::Other(s) => s.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(action: ChangeAction, logical_id: &str, physical_id: Option<&str>) -> Change {
        Change {
            kind: String::from("Resource"),
            resource: Some(ResourceChange {
                action,
                replacement: String::from("False"),
                resource_type: String::from("AWS::SQS::Queue"),
                logical_id: logical_id.to_string(),
                physical_id: physical_id.map(String::from),
            }),
        }
    }

    #[test]
    fn test_empty_change_list_renders_nothing() {
        let presenter = DiffPresenter::new(OutputFormat::Text);
        assert_eq!(presenter.render(&[]).unwrap(), "");
    }

    #[test]
    fn test_table_has_fixed_columns_and_rows() {
        let presenter = DiffPresenter::new(OutputFormat::Text);
        let changes = vec![
            resource(ChangeAction::Add, "Queue", None),
            resource(ChangeAction::Modify, "Topic", Some("arn:aws:sns:...:topic")),
        ];

        let out = presenter.render(&changes).unwrap();

        for header in ["Action", "Replacement", "ResType", "LogicalID", "PhysicalID"] {
            assert!(out.contains(header), "missing header {header}");
        }
        assert!(out.contains("Queue"));
        assert!(out.contains("Topic"));
        assert!(out.contains("AWS::SQS::Queue"));
    }

    #[test]
    fn test_unsupported_kind_is_a_hard_error() {
        let presenter = DiffPresenter::new(OutputFormat::Text);
        let changes = vec![
            resource(ChangeAction::Add, "Queue", None),
            Change {
                kind: String::from("HookInvocation"),
                resource: None,
            },
        ];

        let err = presenter.render(&changes).unwrap_err();
        assert!(matches!(
            err,
            crate::error::StackPilotError::Remote(RemoteError::UnsupportedChangeKind { ref kind })
                if kind == "HookInvocation"
        ));
    }

    #[test]
    fn test_resource_kind_without_payload_is_unsupported() {
        let presenter = DiffPresenter::new(OutputFormat::Text);
        let changes = vec![Change {
            kind: String::from("Resource"),
            resource: None,
        }];

        assert!(presenter.render(&changes).is_err());
    }

    #[test]
    fn test_json_output_parses() {
        let presenter = DiffPresenter::new(OutputFormat::Json);
        let changes = vec![resource(ChangeAction::Remove, "OldQueue", Some("old-queue"))];

        let out = presenter.render(&changes).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed[0]["action"], "Remove");
        assert_eq!(parsed[0]["logical_id"], "OldQueue");
        assert_eq!(parsed[0]["physical_id"], "old-queue");
    }
}

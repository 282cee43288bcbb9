//! Ticket creation from declarative form schemas.
//!
//! A [`TicketSchema`](opsdesk_types::config::TicketSchema) maps form inputs
//! to issue fields; `payload` turns a filled form into the create-issue body
//! and `tracker` is the port the infra layer implements.

pub mod payload;
pub mod schema;
pub mod tracker;

use opsdesk_types::config::TicketSchema;
use opsdesk_types::error::TicketError;
use opsdesk_types::issue::CreatedIssue;

use payload::{TicketForm, build_issue_payload};
use tracker::IssueTracker;

/// Build the payload for `form` and submit it.
pub async fn create_ticket<T: IssueTracker>(
    tracker: &T,
    schema: &TicketSchema,
    project: &str,
    form: &TicketForm,
) -> Result<CreatedIssue, TicketError> {
    let payload = build_issue_payload(schema, project, form)?;
    tracing::info!(form = %schema.name, project = %project, "creating issue");

    let issue = tracker.create_issue(&payload).await?;
    tracing::info!(key = %issue.key, "issue created");
    Ok(issue)
}

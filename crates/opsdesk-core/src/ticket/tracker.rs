//! IssueTracker trait definition.

use opsdesk_types::error::TicketError;
use opsdesk_types::issue::{CreatedIssue, FieldMeta};

/// Port to the issue tracker.
///
/// Implementations live in opsdesk-infra (e.g., `JiraClient`).
pub trait IssueTracker: Send + Sync {
    /// Create an issue from a full `{ "fields": { .. } }` payload.
    fn create_issue(
        &self,
        payload: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<CreatedIssue, TicketError>> + Send;

    /// Create-screen field metadata for one issue type of a project.
    fn field_metadata(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<FieldMeta>, TicketError>> + Send;
}

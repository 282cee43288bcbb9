//! Ticket commands: create, fields, forms.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use tracing::{Instrument, field};

use opsdesk_core::ticket::create_ticket;
use opsdesk_core::ticket::payload::TicketForm;
use opsdesk_core::ticket::schema::{available_forms, resolve_schema};
use opsdesk_core::ticket::tracker::IssueTracker;
use opsdesk_observe::attrs;

use crate::state::AppState;

/// Split `key=value`. The key is trimmed; the value is kept as typed.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("expected KEY=VALUE, got '{raw}'"),
    }
}

pub struct CreateArgs {
    pub form: String,
    pub summary: String,
    pub description: String,
    pub issue_type: Option<String>,
    pub values: Vec<String>,
}

/// Create a ticket from a form.
///
/// # Examples
///
/// ```bash
/// opsdesk ticket create --summary "Sync failing" --set priority=High
/// opsdesk ticket create --form site-outage --summary "Site down" --set site=North
/// ```
pub async fn create(state: &AppState, args: CreateArgs, json: bool) -> Result<()> {
    let schema = resolve_schema(&args.form, &state.settings.ticket_forms)?;
    let (client, jira) = state.jira_client()?;

    let mut form = TicketForm::new(args.summary, args.description);
    form.issue_type = args.issue_type;
    for raw in &args.values {
        let (key, value) = parse_assignment(raw)?;
        form = form.with_value(key, value);
    }

    let span = tracing::info_span!(
        "ticket_create",
        ticket.form = field::Empty,
        ticket.key = field::Empty,
    );
    span.record(attrs::TICKET_FORM, schema.name.as_str());
    let issue = create_ticket(&client, &schema, &jira.project, &form)
        .instrument(span.clone())
        .await?;
    span.record(attrs::TICKET_KEY, issue.key.as_str());

    if json {
        println!("{}", serde_json::to_string_pretty(&issue)?);
    } else {
        println!(
            "  {} Created {} ({})",
            style("✓").green().bold(),
            style(&issue.key).bold(),
            style(&issue.url).cyan()
        );
    }

    Ok(())
}

/// Show the create-screen fields for one issue type.
pub async fn fields(state: &AppState, issue_type_id: &str, json: bool) -> Result<()> {
    let (client, jira) = state.jira_client()?;
    let fields = client.field_metadata(&jira.project, issue_type_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    if fields.is_empty() {
        println!();
        println!(
            "  {} No fields returned for issue type {} in {}.",
            style("i").blue().bold(),
            style(issue_type_id).bold(),
            style(&jira.project).bold()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Field").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Required").fg(Color::White),
    ]);

    for meta in &fields {
        let kind = meta.schema.as_ref().map(|s| s.kind.as_str()).unwrap_or("-");
        table.add_row(vec![
            Cell::new(&meta.field_id).fg(Color::Cyan),
            Cell::new(&meta.name),
            Cell::new(kind).fg(Color::DarkGrey),
            if meta.required {
                Cell::new("yes").fg(Color::Yellow)
            } else {
                Cell::new("no")
            },
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// List the built-in form and any configured ones.
pub fn forms(state: &AppState, json: bool) -> Result<()> {
    let forms = available_forms(&state.settings.ticket_forms);

    if json {
        println!("{}", serde_json::to_string_pretty(&forms)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Form").fg(Color::White),
        Cell::new("Issue type").fg(Color::White),
        Cell::new("Inputs").fg(Color::White),
    ]);

    for form in &forms {
        let inputs = form
            .fields
            .iter()
            .map(|f| {
                if f.required {
                    format!("{}*", f.input)
                } else {
                    f.input.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&form.name).fg(Color::Cyan),
            Cell::new(&form.issue_type),
            Cell::new(inputs),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {}", style("* required. Set inputs with --set KEY=VALUE.").dim());
    println!();

    Ok(())
}

//! ERP catalog commands: list, show.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use opsdesk_core::erp::{self, CATALOG, Erp};

fn erp_json(erp: &Erp) -> serde_json::Value {
    json!({
        "name": erp.name,
        "description": erp.description,
        "quick_questions": erp.quick_questions,
    })
}

/// List every supported ERP integration.
pub fn list_erps(json: bool) -> Result<()> {
    if json {
        let entries: Vec<_> = CATALOG.iter().map(erp_json).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ERP").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for erp in CATALOG {
        table.add_row(vec![
            Cell::new(erp.name).fg(Color::Cyan),
            Cell::new(erp.description),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} integrations. Ask about one with: {}",
        style(CATALOG.len()).bold(),
        style("opsdesk ask --erp NetSuite \"...\"").yellow()
    );
    println!();

    Ok(())
}

/// Show one ERP with its quick questions.
pub fn show_erp(name: &str, json: bool) -> Result<()> {
    let Some(erp) = erp::find(name) else {
        bail!("unknown ERP '{name}'. Run: opsdesk erp list");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&erp_json(erp))?);
        return Ok(());
    }

    println!();
    println!("  {}", style(erp.name).cyan().bold());
    println!("  {}", erp.description);
    println!();
    println!("  {}", style("Quick questions").dim());
    for (i, question) in erp.quick_questions.iter().enumerate() {
        println!("  {} {question}", style(format!("{}.", i + 1)).cyan().bold());
    }
    println!();

    Ok(())
}

//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{TimeZone, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;
use serde_json::Value;

use crate::keychain::Item;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Format Unix seconds for display.
pub fn timestamp(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Print a table of items (UUID, Title, URL, Updated).
pub fn print_items_table(items: &[&Item]) {
    if items.is_empty() {
        info("No items in this keychain yet.");
        tip("Run `cloudkeychain add <TITLE>` to add your first item.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["UUID", "Title", "URL", "Updated"]);

    for item in items {
        let overview = item.overview();
        table.add_row(vec![
            item.uuid().to_string(),
            overview.map(|o| o.title.clone()).unwrap_or_default(),
            overview.and_then(|o| o.url.clone()).unwrap_or_default(),
            timestamp(item.record().updated),
        ]);
    }

    println!("{table}");
}

/// Print decrypted item details: designated fields first, then notes.
pub fn print_details(details: &Value) {
    if let Some(fields) = details.get("fields").and_then(Value::as_array) {
        for field in fields {
            let name = field
                .get("designation")
                .or_else(|| field.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("field");
            let value = field.get("value").and_then(Value::as_str).unwrap_or("");
            println!("  {}: {}", style(name).bold(), value);
        }
    }
    if let Some(notes) = details.get("notesPlain").and_then(Value::as_str) {
        println!("  {}: {}", style("notes").bold(), notes);
    }
}

//! `cloudkeychain show`: print one item, optionally with its details.

use console::style;

use crate::cli::output;
use crate::cli::{normalize_uuid, open_keychain, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, uuid: &str, reveal: bool) -> Result<()> {
    let uuid = normalize_uuid(uuid)?;
    let (mut keychain, _) = open_keychain(cli)?;

    let item = keychain.get_item(&uuid)?;
    let record = item.record();
    println!("{}", style(item.title().unwrap_or("(untitled)")).bold());
    println!("  uuid: {}", record.uuid);
    if let Some(url) = item.overview().and_then(|o| o.url.as_deref()) {
        println!("  url: {url}");
    }
    println!("  created: {}", output::timestamp(record.created));
    println!("  updated: {}", output::timestamp(record.updated));
    if record.trashed {
        println!("  {}", style("(in trash)").yellow());
    }

    if reveal {
        let details = keychain.item_details(&uuid)?;
        output::print_details(details);
    } else {
        output::tip("Pass --reveal to decrypt the username, password and notes.");
    }

    Ok(())
}

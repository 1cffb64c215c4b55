//! `cloudkeychain list`: show item titles in a table.

use crate::cli::output;
use crate::cli::{open_keychain, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, trashed: bool) -> Result<()> {
    let (keychain, _) = open_keychain(cli)?;

    let items = if trashed {
        keychain.trashed_items()
    } else {
        keychain.list_items()
    };

    output::print_items_table(&items);
    Ok(())
}

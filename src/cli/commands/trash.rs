//! `cloudkeychain trash`: move an item to or from the trash.

use crate::cli::output;
use crate::cli::{normalize_uuid, open_keychain, Cli};
use crate::errors::Result;

/// Execute the `trash` command.
pub fn execute(cli: &Cli, uuid: &str, restore: bool) -> Result<()> {
    let uuid = normalize_uuid(uuid)?;
    let (mut keychain, dir) = open_keychain(cli)?;

    keychain.set_trashed(&uuid, !restore)?;
    keychain.save(&dir)?;

    if restore {
        output::success(&format!("Restored {uuid} from the trash"));
    } else {
        output::success(&format!("Moved {uuid} to the trash"));
        output::tip(&format!("Run `cloudkeychain trash {uuid} --restore` to undo."));
    }

    Ok(())
}

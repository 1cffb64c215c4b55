//! `cloudkeychain add`: add a login item.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_keychain, Cli};
use crate::errors::{KeychainError, Result};
use crate::keychain::NewItem;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    title: &str,
    username: &str,
    url: Option<&str>,
    notes: Option<&str>,
) -> Result<()> {
    // Read the item password before unlocking so piped input is not
    // mistaken for the master password prompt.
    let mut item_password = if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        let pw = dialoguer::Password::new()
            .with_prompt(format!("Enter password for {title}"))
            .allow_empty_password(true)
            .interact()
            .map_err(|e| KeychainError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(pw)
    };

    let (mut keychain, dir) = open_keychain(cli)?;

    let item = Zeroizing::new(NewItem {
        title: title.to_string(),
        username: username.to_string(),
        password: std::mem::take(&mut *item_password),
        url: url.map(str::to_string),
        notes: notes.map(str::to_string),
        tags: Vec::new(),
    });
    let uuid = keychain.create_item(&item)?;
    keychain.save(&dir)?;

    output::success(&format!(
        "Added '{title}' as {uuid} ({} items)",
        keychain.item_count()
    ));
    output::tip(&format!("Run `cloudkeychain show {uuid} --reveal` to view it."));

    Ok(())
}

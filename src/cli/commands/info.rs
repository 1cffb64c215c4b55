//! `cloudkeychain info`: print profile metadata without unlocking.

use console::style;

use crate::cli::output;
use crate::cli::{keychain_location, Cli};
use crate::errors::Result;
use crate::keychain::Keychain;

/// Execute the `info` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, profile_name, _) = keychain_location(cli)?;
    let keychain = Keychain::load_profile(&dir, &profile_name)?;
    let profile = keychain.profile();

    println!("{}", style(dir.display()).bold());
    println!("  profile:     {}", profile.profile_name);
    println!("  uuid:        {}", profile.uuid);
    println!("  iterations:  {}", profile.iterations);
    println!("  created:     {}", output::timestamp(profile.created_at));
    println!("  updated:     {}", output::timestamp(profile.updated_at));
    if !profile.last_updated_by.is_empty() {
        println!("  written by:  {}", profile.last_updated_by);
    }
    if !profile.password_hint.is_empty() {
        println!("  hint:        {}", profile.password_hint);
    }
    println!(
        "  items:       {} ({} trashed)",
        keychain.item_count(),
        keychain.trashed_items().len()
    );
    println!("  attachments: {}", keychain.attachments().len());

    Ok(())
}

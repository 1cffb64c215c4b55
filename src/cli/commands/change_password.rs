//! `cloudkeychain change-password`: re-wrap the key hierarchy under a new
//! master password.
//!
//! Only the profile's wrapped master and overview keys change; items stay
//! encrypted under the same keys, so band files are rewritten unchanged.

use crate::cli::output;
use crate::cli::{keychain_location, prompt_new_password, prompt_password, Cli, NEW_PASSWORD_ENV};
use crate::errors::Result;
use crate::keychain::Keychain;

/// Execute the `change-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, profile_name, _) = keychain_location(cli)?;
    let mut keychain = Keychain::load_profile(&dir, &profile_name)?;

    output::info("Enter your current master password.");
    let old_password = prompt_password()?;

    output::info("Choose your new master password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    keychain.change_password(old_password.as_bytes(), new_password.as_bytes())?;
    keychain.save(&dir)?;

    output::success("Master password changed.");
    Ok(())
}

//! `cloudkeychain init`: create a new keychain folder.

use crate::cli::output;
use crate::cli::{keychain_location, prompt_new_password, Cli, PASSWORD_ENV};
use crate::errors::{KeychainError, Result};
use crate::keychain::profile::PROFILE_FILE;
use crate::keychain::Keychain;

/// Execute the `init` command.
pub fn execute(cli: &Cli, hint: Option<&str>) -> Result<()> {
    let (dir, profile_name, settings) = keychain_location(cli)?;
    let profile_path = dir.join(&profile_name).join(PROFILE_FILE);

    // 1. Refuse to overwrite an existing profile.
    if profile_path.exists() {
        output::tip("Use `cloudkeychain add <TITLE>` to add items to the existing keychain.");
        return Err(KeychainError::AlreadyExists(profile_path));
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password(PASSWORD_ENV)?;

    // 3. Generate the key hierarchy and write the profile.
    let mut options = settings.keychain_settings();
    options.profile_name = profile_name;
    if let Some(hint) = hint {
        options.password_hint = hint.to_string();
    }
    let keychain = Keychain::create(password.as_bytes(), &options)?;
    keychain.save(&dir)?;

    output::success(&format!(
        "Keychain created at {} (profile '{}', {} iterations)",
        dir.display(),
        keychain.profile_name(),
        keychain.iterations()
    ));
    output::tip("Run `cloudkeychain add <TITLE>` to add a login.");
    output::tip("Run `cloudkeychain list` to see all items.");

    Ok(())
}

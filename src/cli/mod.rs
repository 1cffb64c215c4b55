//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{KeychainError, Result};
use crate::keychain::Keychain;

/// Minimum master password length for new keychains.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the master password (CI/scripts).
pub const PASSWORD_ENV: &str = "CLOUDKEYCHAIN_PASSWORD";

/// Environment variable holding the new master password for `change-password`.
pub const NEW_PASSWORD_ENV: &str = "CLOUDKEYCHAIN_NEW_PASSWORD";

/// cloudkeychain CLI: read and write password-protected cloud keychains.
#[derive(Parser)]
#[command(
    name = "cloudkeychain",
    about = "Password-protected cloud keychain manager",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Keychain folder (default: from .cloudkeychain.toml, else default.cloudkeychain)
    #[arg(short, long, global = true)]
    pub keychain: Option<String>,

    /// Profile inside the keychain (default: from .cloudkeychain.toml, else default)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new keychain
    Init {
        /// Password hint stored in the profile
        #[arg(long)]
        hint: Option<String>,
    },

    /// Add a login item (item password is read from stdin or prompted)
    Add {
        /// Item title
        title: String,
        /// Login username
        #[arg(short, long, default_value = "")]
        username: String,
        /// Website URL
        #[arg(long)]
        url: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List items
    List {
        /// Show trashed items instead
        #[arg(long)]
        trashed: bool,
    },

    /// Show one item
    Show {
        /// Item uuid
        uuid: String,
        /// Decrypt and print the item details
        #[arg(long)]
        reveal: bool,
    },

    /// Move an item to the trash
    Trash {
        /// Item uuid
        uuid: String,
        /// Restore the item from the trash instead
        #[arg(long)]
        restore: bool,
    },

    /// Change the master password
    ChangePassword,

    /// Show profile metadata (no password needed)
    Info,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the keychain folder and profile name from flags and settings.
pub fn keychain_location(cli: &Cli) -> Result<(PathBuf, String, Settings)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;

    let dir = match &cli.keychain {
        Some(path) => cwd.join(path),
        None => settings.keychain_dir(&cwd),
    };
    let profile = cli
        .profile
        .clone()
        .unwrap_or_else(|| settings.profile_name.clone());

    Ok((dir, profile, settings))
}

/// Load the keychain named by the CLI flags and unlock it.
pub fn open_keychain(cli: &Cli) -> Result<(Keychain, PathBuf)> {
    let (dir, profile, settings) = keychain_location(cli)?;
    let mut keychain = Keychain::load_profile(&dir, &profile)?;
    keychain.set_auto_lock_window(settings.auto_lock());

    if !keychain.password_hint().is_empty() {
        output::tip(&format!("Hint: {}", keychain.password_hint()));
    }
    let password = prompt_password()?;
    if !keychain.unlock(password.as_bytes())? {
        return Err(KeychainError::WrongPassword);
    }

    Ok((keychain, dir))
}

/// Get the master password, trying in order:
/// 1. `CLOUDKEYCHAIN_PASSWORD` env var (CI/scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| KeychainError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// Respects `env_var` for scripted usage.  Enforces a minimum length.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        if pw.len() < MIN_PASSWORD_LEN {
            return Err(KeychainError::CommandFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| KeychainError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

fn password_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Validate an item uuid typed on the command line.
///
/// Must be 32 hex digits; lowercase is accepted and upper-cased.
pub fn normalize_uuid(uuid: &str) -> Result<String> {
    if uuid.len() != 32 || !uuid.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeychainError::CommandFailed(format!(
            "'{uuid}' is not an item uuid, expected 32 hex digits"
        )));
    }
    Ok(uuid.to_ascii_uppercase())
}

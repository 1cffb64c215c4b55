//! On-disk layout of a `.cloudkeychain` folder.
//!
//! ```text
//! <keychain>/
//!   <profile>/
//!     profile.js
//!     band_0.js … band_F.js
//!     <uuid>_<uuid>.attachment
//! ```
//!
//! This module only moves text between the filesystem and the keychain;
//! all parsing happens in `profile` and `band`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use super::profile::PROFILE_FILE;
use crate::errors::{KeychainError, Result};

const BAND_FILE_PATTERN: &str = r"^band_[0-9A-F]\.js$";
const ATTACHMENT_FILE_PATTERN: &str = r"^[0-9A-F]{32}_[0-9A-F]{32}\.attachment$";

/// Raw text read from a profile folder.
#[derive(Debug, Default)]
pub struct ProfileArtifacts {
    pub profile: String,
    /// Band file contents, in file name order.
    pub bands: Vec<String>,
    /// Attachment file names.  Contents are never read.
    pub attachments: Vec<String>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| KeychainError::Format(format!("bad file pattern: {e}")))
}

/// Read `profile.js`, every band file and the attachment names from
/// `<keychain_path>/<profile_name>/`.
pub fn read_profile_dir(keychain_path: &Path, profile_name: &str) -> Result<ProfileArtifacts> {
    let dir = keychain_path.join(profile_name);
    let profile_path = dir.join(PROFILE_FILE);
    if !profile_path.is_file() {
        return Err(KeychainError::NotFound(profile_path));
    }

    let band_re = compile(BAND_FILE_PATTERN)?;
    let attachment_re = compile(ATTACHMENT_FILE_PATTERN)?;

    let mut band_names = Vec::new();
    let mut attachments = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if band_re.is_match(&name) {
            band_names.push(name);
        } else if attachment_re.is_match(&name) {
            attachments.push(name);
        }
    }
    band_names.sort();
    attachments.sort();

    let bands = band_names
        .iter()
        .map(|name| fs::read_to_string(dir.join(name)))
        .collect::<std::io::Result<Vec<_>>>()?;

    debug!(dir = %dir.display(), bands = bands.len(), "read profile folder");

    Ok(ProfileArtifacts {
        profile: fs::read_to_string(&profile_path)?,
        bands,
        attachments,
    })
}

/// Write `profile.js` and the given band files into
/// `<keychain_path>/<profile_name>/`, creating the folder if needed.
///
/// Band files not in `bands` are removed, so shards that became empty do
/// not resurrect their items on the next load.
pub fn write_profile_dir(
    keychain_path: &Path,
    profile_name: &str,
    profile: &str,
    bands: &BTreeMap<String, String>,
) -> Result<()> {
    let dir = keychain_path.join(profile_name);
    fs::create_dir_all(&dir)?;

    atomic_write(&dir, PROFILE_FILE, profile)?;
    for (name, text) in bands {
        atomic_write(&dir, name, text)?;
    }

    let band_re = compile(BAND_FILE_PATTERN)?;
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if band_re.is_match(&name) && !bands.contains_key(&name) {
            fs::remove_file(entry.path())?;
            debug!(band = %name, "removed empty band");
        }
    }

    Ok(())
}

/// Write to a temp file in the same directory, then rename over the
/// target, so readers never see a half-written file.
fn atomic_write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let tmp_path = dir.join(format!(".{name}.tmp"));
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, dir.join(name))?;
    Ok(())
}

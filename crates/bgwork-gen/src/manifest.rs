//! Injection of permitted background identifiers into an iOS `Info.plist`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use bgwork_core::JobIdentifier;
use tracing::{info, warn};

pub const PERMITTED_IDENTIFIERS_KEY: &str = "BGTaskSchedulerPermittedIdentifiers";
const PLIST_BUDDY: &str = "/usr/libexec/PlistBuddy";

/// The manifest must exist and be a `.plist` file.
pub fn validate_manifest_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("manifest {} does not exist", path.display());
    }
    if path.extension().and_then(|e| e.to_str()) != Some("plist") {
        bail!("manifest {} is not a .plist file", path.display());
    }
    Ok(())
}

/// PlistBuddy commands that recreate the permitted-identifier array.
/// The first command deletes the existing key.
pub fn plist_buddy_commands(ids: &[JobIdentifier]) -> Vec<String> {
    let mut commands = Vec::with_capacity(ids.len() + 2);
    commands.push(format!("Delete :{PERMITTED_IDENTIFIERS_KEY}"));
    commands.push(format!("Add :{PERMITTED_IDENTIFIERS_KEY} array"));
    commands.extend(
        ids.iter()
            .map(|id| format!("Add :{PERMITTED_IDENTIFIERS_KEY}: string {id}")),
    );
    commands
}

/// Rewrite the permitted identifiers in `manifest`.
///
/// PlistBuddy only ships with macOS; on other hosts the step is skipped.
/// Returns whether the manifest was modified.
pub fn inject_identifiers(manifest: &Path, ids: &[JobIdentifier]) -> Result<bool> {
    validate_manifest_path(manifest)?;

    if !cfg!(target_os = "macos") {
        info!(
            manifest = %manifest.display(),
            "PlistBuddy unavailable on this host; skipping manifest update"
        );
        return Ok(false);
    }

    let mut commands = plist_buddy_commands(ids).into_iter();
    if let Some(delete) = commands.next() {
        // A manifest without the key yet is fine.
        if let Err(e) = run_plist_buddy(manifest, &delete) {
            warn!(error = %e, "could not delete existing identifier list");
        }
    }
    for command in commands {
        run_plist_buddy(manifest, &command)?;
    }

    info!(manifest = %manifest.display(), count = ids.len(), "manifest identifiers updated");
    Ok(true)
}

fn run_plist_buddy(manifest: &Path, command: &str) -> Result<()> {
    let output = std::process::Command::new(PLIST_BUDDY)
        .arg("-c")
        .arg(command)
        .arg(manifest)
        .output()
        .with_context(|| format!("failed to execute {PLIST_BUDDY} -c {command:?}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        bail!(
            "{PLIST_BUDDY} -c {command:?} failed: {}",
            if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            }
        );
    }
    Ok(())
}

//! Rendered-artifact output
//!
//! Writes a render result to disk or stdout. Main configs are
//! world-readable, secrets files are owner-only, matching how the target
//! daemons expect their split files to be installed.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfgenResult;
use crate::render::{ConfigFormat, Rendered};

const MAIN_CONFIG_MODE: u32 = 0o644;
const SECRETS_MODE: u32 = 0o600;

/// Ensure a directory exists, creating it if necessary
pub async fn ensure_directory_exists(path: &Path) -> ConfgenResult<()> {
    if !path.exists() {
        tokio::fs::create_dir_all(path).await?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}

/// Write content to a file with the given permissions
async fn write_with_mode(path: &Path, content: &str, permissions: u32) -> ConfgenResult<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::write(path, content).await?;

    let perms = std::fs::Permissions::from_mode(permissions);
    tokio::fs::set_permissions(path, perms).await?;

    debug!("Wrote {:?} with permissions {:o}", path, permissions);
    Ok(())
}

/// Write both artifacts of a render result into `dir`
///
/// Returns the paths written: `<name>.<format>.conf` always, plus
/// `<name>.<format>.secrets` for formats with a split-file convention.
pub async fn write_artifacts(
    rendered: &Rendered,
    format: ConfigFormat,
    conn_name: &str,
    dir: &Path,
) -> ConfgenResult<Vec<PathBuf>> {
    ensure_directory_exists(dir).await?;

    let mut written = Vec::new();

    let conf_path = dir.join(format!("{}.{}.conf", conn_name, format));
    write_with_mode(&conf_path, &rendered.main, MAIN_CONFIG_MODE).await?;
    info!("Wrote {} config to {:?}", format, conf_path);
    written.push(conf_path);

    if let Some(secrets) = &rendered.secrets {
        let secrets_path = dir.join(format!("{}.{}.secrets", conn_name, format));
        write_with_mode(&secrets_path, secrets, SECRETS_MODE).await?;
        info!("Wrote {} secrets to {:?}", format, secrets_path);
        written.push(secrets_path);
    }

    Ok(written)
}

/// Print both artifacts to stdout, secrets after the main config
pub fn print_artifacts(rendered: &Rendered) {
    println!("{}", rendered.main);
    if let Some(secrets) = &rendered.secrets {
        println!("# ===== secrets file (install with restrictive permissions) =====");
        println!("{}", secrets);
    }
}

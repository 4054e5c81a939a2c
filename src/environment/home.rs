//! Home directory setup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::assets;
use crate::error::{HangarError, Result};

/// Subdirectories every home directory has.
pub const HOME_SUBDIRS: [&str; 3] = ["boxes", "data", "tmp"];

/// Create the home directory layout and install the default private key.
///
/// Safe to call repeatedly; an existing key is never overwritten.
/// Returns the path of the default private key.
pub fn setup_home_path(home_path: &Path) -> Result<PathBuf> {
    let inaccessible = |source: io::Error| HangarError::HomeDirectoryNotAccessible {
        path: home_path.to_path_buf(),
        source,
    };

    for dir in HOME_SUBDIRS {
        fs::create_dir_all(home_path.join(dir)).map_err(inaccessible)?;
    }

    let key_path = home_path.join(assets::PRIVATE_KEY_FILE);
    if key_path.exists() {
        debug!("Private key already present at {}", key_path.display());
        return Ok(key_path);
    }

    info!("Installing default private key to {}", key_path.display());
    write_private_key(&key_path, assets::private_key()?).map_err(inaccessible)?;
    Ok(key_path)
}

/// Write the key owner-only from the moment it exists.
#[cfg(unix)]
fn write_private_key(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private_key(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .and_then(|mut file| std::io::Write::write_all(&mut file, contents))
}

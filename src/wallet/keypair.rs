//! Keypair file loading
//!
//! Keypairs are stored as the Solana CLI JSON byte array. On Unix the file
//! must not be readable by group or others.

use solana_sdk::signature::Keypair;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Load a keypair from a JSON byte-array file, enforcing 600 permissions
pub fn load_keypair<P: AsRef<Path>>(path: P) -> Result<Keypair> {
    let path = path.as_ref();

    let metadata = std::fs::metadata(path)
        .map_err(|e| Error::InvalidKeypair(format!("Cannot read {}: {}", path.display(), e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(Error::InsecureKeypair(format!(
                "{} has permissions {:o}; run 'chmod 600 {}'",
                path.display(),
                mode & 0o777,
                path.display()
            )));
        }
        debug!("Keypair permissions OK for {}", path.display());
    }
    #[cfg(not(unix))]
    let _ = metadata;

    let data = std::fs::read_to_string(path)?;
    let secret_key: Vec<u8> = serde_json::from_str(&data)
        .map_err(|e| Error::InvalidKeypair(format!("Not a JSON byte array: {}", e)))?;
    let keypair =
        Keypair::from_bytes(&secret_key).map_err(|e| Error::InvalidKeypair(e.to_string()))?;

    info!("Loaded keypair from {}", path.display());
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;
    use tempfile::tempdir;

    fn write_keypair(path: &Path, keypair: &Keypair, mode: u32) {
        let bytes = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        std::fs::write(path, bytes).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = mode;
    }

    #[test]
    fn test_load_valid_keypair() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keypair.json");
        let keypair = Keypair::new();
        write_keypair(&path, &keypair, 0o600);

        let loaded = load_keypair(&path).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_world_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keypair.json");
        write_keypair(&path, &Keypair::new(), 0o644);

        assert!(matches!(load_keypair(&path), Err(Error::InsecureKeypair(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keypair.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        }

        assert!(matches!(load_keypair(&path), Err(Error::InvalidKeypair(_))));
        assert!(matches!(
            load_keypair(dir.path().join("missing.json")),
            Err(Error::InvalidKeypair(_))
        ));
    }
}

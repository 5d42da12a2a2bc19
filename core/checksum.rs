use crate::error::{AppError, Result};
use std::fs;
use std::path::Path;

/// Stored in place of a fingerprint when the file cannot be read.
pub const CHECKSUM_ERROR: &str = "error";

const FINGERPRINT_LEN: usize = 8;

/// First eight hex digits of the file's MD5 digest. A change-detection
/// fingerprint only.
pub fn fingerprint(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(fingerprint_bytes(&bytes))
}

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hex = format!("{:x}", md5::compute(bytes));
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest_prefix() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(fingerprint_bytes(b""), "d41d8cd9");
        // md5("abc") = 900150983cd24fb0d6963f7d28e17f72
        assert_eq!(fingerprint_bytes(b"abc"), "90015098");
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            fingerprint(&dir.path().join("gone.py")),
            Err(AppError::FileRead { .. })
        ));
    }
}

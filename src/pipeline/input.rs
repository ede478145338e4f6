//! Input loading: read a local PDF into memory and apply the upstream guards.
//!
//! The whole document is held in memory for the run. The redactor needs an
//! untouched copy to draw on after rasterisation has consumed the first one,
//! and pdfium loads from a byte vector just as well as from a path. The size
//! guard therefore runs before the file is read, on the metadata length.

use crate::config::MAX_INPUT_BYTES;
use crate::error::RedactError;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Read a PDF from disk, validating existence, permission, size and magic bytes.
pub fn load_pdf(path: &Path) -> Result<Vec<u8>, RedactError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => RedactError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => RedactError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let meta = file.metadata().map_err(|_| RedactError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    if !meta.is_file() {
        return Err(RedactError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_size(meta.len())?;

    let mut bytes = Vec::with_capacity(meta.len() as usize);
    file.read_to_end(&mut bytes).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => RedactError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => RedactError::InvalidInput {
            reason: format!("reading '{}': {}", path.display(), e),
        },
    })?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(RedactError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Reject empty and oversized buffers before any processing.
pub fn validate_bytes(bytes: &[u8]) -> Result<(), RedactError> {
    if bytes.is_empty() {
        return Err(RedactError::InvalidInput {
            reason: "PDF buffer is empty".into(),
        });
    }
    check_size(bytes.len() as u64)
}

fn check_size(size: u64) -> Result<(), RedactError> {
    if size > MAX_INPUT_BYTES {
        return Err(RedactError::InputTooLarge {
            size,
            max: MAX_INPUT_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file() {
        let err = load_pdf(Path::new("/nonexistent/doc.pdf")).unwrap_err();
        assert!(matches!(err, RedactError::FileNotFound { .. }));
    }

    #[test]
    fn rejects_non_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04zipfile").unwrap();
        match load_pdf(f.path()).unwrap_err() {
            RedactError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn reads_pdf_bytes() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n%%EOF\n").unwrap();
        let bytes = load_pdf(f.path()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_pdf(dir.path()).unwrap_err(),
            RedactError::FileNotFound { .. }
        ));
    }

    #[test]
    fn size_guard() {
        assert!(check_size(MAX_INPUT_BYTES).is_ok());
        assert!(matches!(
            check_size(MAX_INPUT_BYTES + 1),
            Err(RedactError::InputTooLarge { size, max }) if size == MAX_INPUT_BYTES + 1 && max == MAX_INPUT_BYTES
        ));
    }

    #[test]
    fn empty_buffer_is_invalid() {
        assert!(matches!(
            validate_bytes(&[]),
            Err(RedactError::InvalidInput { .. })
        ));
        assert!(validate_bytes(b"%PDF").is_ok());
    }
}

//! Document loader: validate a user-supplied path before pdfium sees it.
//!
//! pdfium reports every open failure with the same opaque error, so the
//! cases a user can act on (missing file, no read permission, not a PDF) are
//! checked here first. We validate the PDF magic bytes (`%PDF`) so callers
//! get a meaningful error rather than a pdfium failure.

use crate::error::ExtractError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a local file path, validating existence, permission and PDF magic bytes.
pub fn resolve_local(path: &Path) -> Result<PathBuf, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Err(ExtractError::OpenFailed {
            path: path.to_path_buf(),
            detail: "path is a directory".into(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ExtractError::OpenFailed {
                    path: path.to_path_buf(),
                    detail: format!("file is not a PDF (first bytes: {magic:?})"),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(ExtractError::OpenFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("/definitely/not/here.pdf"));
    }

    #[test]
    fn non_pdf_is_open_failed() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();
        let err = resolve_local(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OpenFailed);
        assert!(err.to_string().contains("not a PDF"));
    }

    #[test]
    fn directory_is_open_failed() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OpenFailed);
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        let resolved = resolve_local(tmp.path()).unwrap();
        assert_eq!(resolved, tmp.path());
    }
}

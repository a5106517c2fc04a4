//! Conan profiles and lockfile fingerprints

use crate::build::Sanitiser;
use crate::error::{KilnError, KilnResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Conan profile selected by the sanitiser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// tsan.txt
    ThreadSanitised,
    /// asan.txt
    AddressSanitised,
    /// default.txt
    Default,
}

impl Profile {
    /// Profile for a sanitiser; only thread and address builds need their own
    pub fn for_sanitiser(sanitiser: Sanitiser) -> Self {
        match sanitiser {
            Sanitiser::Thread => Self::ThreadSanitised,
            Sanitiser::Address => Self::AddressSanitised,
            Sanitiser::None | Sanitiser::Undefined | Sanitiser::Leak | Sanitiser::Memory => {
                Self::Default
            }
        }
    }

    /// Profile file name inside the profiles directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::ThreadSanitised => "tsan.txt",
            Self::AddressSanitised => "asan.txt",
            Self::Default => "default.txt",
        }
    }

    /// Full path of the profile file
    pub fn path(&self, profiles_dir: &Path) -> PathBuf {
        profiles_dir.join(self.file_name())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ThreadSanitised => "tsan",
            Self::AddressSanitised => "asan",
            Self::Default => "default",
        };
        write!(f, "{}", name)
    }
}

/// Hash a lockfile's contents using SHA256, returning first 12 hex chars
pub fn fingerprint(path: &Path) -> KilnResult<String> {
    let contents = fs::read(path).map_err(|e| KilnError::Io {
        context: format!("reading lockfile {}", path.display()),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    let result = hasher.finalize();

    // Take first 12 hex characters (6 bytes)
    Ok(hex::encode(&result[..6]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn profile_selection() {
        assert_eq!(Profile::for_sanitiser(Sanitiser::Thread).file_name(), "tsan.txt");
        assert_eq!(Profile::for_sanitiser(Sanitiser::Address).file_name(), "asan.txt");
        assert_eq!(Profile::for_sanitiser(Sanitiser::None).file_name(), "default.txt");
        assert_eq!(Profile::for_sanitiser(Sanitiser::Undefined), Profile::Default);
    }

    #[test]
    fn profile_path() {
        let path = Profile::ThreadSanitised.path(Path::new("/code/faasm/conan-profiles"));
        assert_eq!(path, PathBuf::from("/code/faasm/conan-profiles/tsan.txt"));
    }

    #[test]
    fn fingerprint_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conan-debug.lock");
        fs::write(&path, b"{\"version\": \"0.5\"}").unwrap();

        let first = fingerprint(&path).unwrap();
        assert_eq!(first, fingerprint(&path).unwrap());
        assert_eq!(first.len(), 12);
    }

    #[test]
    fn fingerprint_differs_with_content() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.lock");
        let b = dir.path().join("b.lock");
        fs::write(&a, b"content 1").unwrap();
        fs::write(&b, b"content 2").unwrap();

        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn fingerprint_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = fingerprint(&dir.path().join("missing.lock")).unwrap_err();
        assert!(matches!(err, KilnError::Io { .. }));
    }
}

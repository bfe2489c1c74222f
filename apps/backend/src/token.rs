//! API token persisted in `.api_token`.
//!
//! The token is the first 8 characters of a random UUID. It is created on
//! the first start and read back on later ones; the web front end receives
//! it through its settings file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BootstrapError, BootstrapResult};

pub const TOKEN_LEN: usize = 8;

/// Returns the same token for the lifetime of the store.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    token: OnceLock<String>,
    /// Held while the file is read or created.
    init: Mutex<()>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore {
            path: path.into(),
            token: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the token file, or creates it when it is missing or empty.
    ///
    /// Only the first line counts. The file is read at most once per store,
    /// and concurrent first calls all see the token that ends up on disk.
    pub fn ensure_token(&self) -> BootstrapResult<&str> {
        if let Some(token) = self.token.get() {
            return Ok(token);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = self.token.get() {
            return Ok(token);
        }

        let token = match read_first_line(&self.path)? {
            Some(token) if !token.is_empty() => {
                debug!(path = %self.path.display(), "Using existing API token");
                token
            }
            _ => {
                let token = generate_token();
                fs::write(&self.path, &token).map_err(|e| BootstrapError::io(&self.path, e))?;
                info!(path = %self.path.display(), "API token created");
                token
            }
        };

        Ok(self.token.get_or_init(|| token))
    }
}

/// A fresh random token.
pub fn generate_token() -> String {
    let mut token = Uuid::new_v4().to_string();
    token.truncate(TOKEN_LEN);
    token
}

fn read_first_line(path: &Path) -> BootstrapResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents.lines().next().unwrap_or_default().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BootstrapError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_missing_file_creates_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".api_token");

        let store = TokenStore::new(&path);
        let token = store.ensure_token().unwrap().to_string();

        assert_eq!(token.len(), TOKEN_LEN);
        assert_eq!(fs::read_to_string(&path).unwrap(), token);
    }

    #[test]
    fn test_existing_token_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".api_token");
        fs::write(&path, "abcd1234\r\nsecond line\n").unwrap();

        let store = TokenStore::new(&path);
        assert_eq!(store.ensure_token().unwrap(), "abcd1234");
    }

    #[test]
    fn test_token_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".api_token");
        fs::write(&path, "abcd1234").unwrap();

        let store = TokenStore::new(&path);
        let first = store.ensure_token().unwrap().to_string();
        fs::write(&path, "ffff0000").unwrap();

        assert_eq!(store.ensure_token().unwrap(), first);
    }

    #[test]
    fn test_empty_file_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".api_token");
        fs::write(&path, "").unwrap();

        let token = TokenStore::new(&path).ensure_token().unwrap().to_string();

        assert_eq!(token.len(), TOKEN_LEN);
        assert_eq!(fs::read_to_string(&path).unwrap(), token);
    }

    #[test]
    fn test_concurrent_first_calls_agree_with_file() {
        for _ in 0..50 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(".api_token");
            let store = TokenStore::new(&path);

            let tokens: Vec<String> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..4)
                    .map(|_| scope.spawn(|| store.ensure_token().unwrap().to_string()))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let on_disk = fs::read_to_string(&path).unwrap();
            assert!(tokens.iter().all(|token| *token == on_disk));
        }
    }

    #[test]
    fn test_deleted_file_gets_new_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".api_token");

        let first = TokenStore::new(&path).ensure_token().unwrap().to_string();
        fs::remove_file(&path).unwrap();
        let second = TokenStore::new(&path).ensure_token().unwrap().to_string();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&path).unwrap(), second);
    }

    #[test]
    fn test_second_store_reads_first_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".api_token");

        let created = TokenStore::new(&path).ensure_token().unwrap().to_string();
        let reread = TokenStore::new(&path).ensure_token().unwrap().to_string();

        assert_eq!(created, reread);
    }
}

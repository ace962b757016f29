//! Durable key/value storage for session credentials
//!
//! Mirrors browser local storage: string values under fixed keys, shared by
//! the API client and the auth service, last writer wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::errors::AppResult;
use crate::models::User;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Every key owned by the session; cleared together
pub const SESSION_KEYS: [&str; 3] = [AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;

    /// Remove every key, attempting all of them; the first failure is returned
    fn remove_all(&self, keys: &[&str]) -> AppResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.remove(key) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Typed accessors over a `CredentialStore`
pub trait SessionStoreExt {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn user(&self) -> Option<User>;
    fn save_session(&self, token: &str, refresh_token: &str, user: Option<&User>) -> AppResult<()>;
    fn save_user(&self, user: &User) -> AppResult<()>;
    fn clear_session(&self) -> AppResult<()>;
}

impl<S: CredentialStore + ?Sized> SessionStoreExt for S {
    fn access_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn user(&self) -> Option<User> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored user record: {}", e);
                None
            }
        }
    }

    fn save_session(&self, token: &str, refresh_token: &str, user: Option<&User>) -> AppResult<()> {
        self.set(AUTH_TOKEN_KEY, token)?;
        self.set(REFRESH_TOKEN_KEY, refresh_token)?;
        if let Some(user) = user {
            self.save_user(user)?;
        }
        Ok(())
    }

    fn save_user(&self, user: &User) -> AppResult<()> {
        let raw = serde_json::to_string(user)?;
        self.set(USER_KEY, &raw)
    }

    fn clear_session(&self) -> AppResult<()> {
        self.remove_all(&SESSION_KEYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roundtrip() {
        let store = MemoryStore::new();
        let user = User {
            id: "1".into(),
            email: "a@b.com".into(),
            role: Some("admin".into()),
        };

        store.save_session("T1", "R1", Some(&user)).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("T1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
        assert_eq!(store.user(), Some(user));

        store.clear_session().unwrap();
        for key in SESSION_KEYS {
            assert!(store.get(key).is_none());
        }
    }

    #[test]
    fn test_save_session_keeps_user_when_absent() {
        let store = MemoryStore::new();
        let user = User {
            id: "1".into(),
            email: String::new(),
            role: None,
        };
        store.save_session("T1", "R1", Some(&user)).unwrap();
        store.save_session("T2", "R2", None).unwrap();

        assert_eq!(store.access_token().as_deref(), Some("T2"));
        assert_eq!(store.user().map(|u| u.id), Some("1".to_string()));
    }

    #[test]
    fn test_corrupt_user_record_is_ignored() {
        let store = MemoryStore::new();
        store.set(USER_KEY, "{oops").unwrap();
        assert!(store.user().is_none());
    }

    /// Fails removal of one key, like a read-only entry
    struct StickyStore {
        inner: MemoryStore,
        sticky: &'static str,
    }

    impl CredentialStore for StickyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> AppResult<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> AppResult<()> {
            if key == self.sticky {
                return Err(crate::errors::AppError::internal("entry is locked"));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_clear_session_attempts_every_key() {
        let store = StickyStore {
            inner: MemoryStore::new(),
            sticky: AUTH_TOKEN_KEY,
        };
        store.save_session("T1", "R1", None).unwrap();
        store.set(USER_KEY, r#"{"id":"1"}"#).unwrap();

        assert!(store.clear_session().is_err());
        assert!(store.refresh_token().is_none());
        assert!(store.get(USER_KEY).is_none());
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let store = MemoryStore::new();
        store.set(AUTH_TOKEN_KEY, "").unwrap();
        assert!(store.access_token().is_none());
    }
}

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;

/// Where the client reads its bearer token from.
///
/// Consulted at the moment each request is built, never cached by the
/// client, so a refreshed token takes effect on the very next call.
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` for an unauthenticated request.
    fn token(&self) -> Option<SecretString>;

    /// Forget the stored token (called after a rejected 401).
    fn clear(&self);
}

/// Callback invoked when the backend reports an invalid or expired token.
///
/// Injected at client construction; typically performs a logout.
pub type SessionExpiryHandler = Arc<dyn Fn() + Send + Sync>;

/// Process-wide token slot shared between the client and whoever signs in.
///
/// Cloning shares the same slot.
#[derive(Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<SecretString>>>,
}

impl SharedToken {
    pub fn new(token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    /// Replace the stored token.
    pub fn set(&self, token: SecretString) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl TokenSource for SharedToken {
    fn token(&self) -> Option<SecretString> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedToken")
            .field("set", &self.is_set())
            .finish()
    }
}

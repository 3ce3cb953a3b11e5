//! Login code delivery.
//!
//! Codes leave the service through [`LoginCodeSender`]. The bundled
//! [`LogCodeSender`] writes them to the trace log when explicitly enabled and
//! is meant for development; deployments plug in a mail adapter.

use async_trait::async_trait;

use crate::error::ServiceResult;

#[async_trait]
pub trait LoginCodeSender: Send + Sync {
    /// Delivers `code` to `email`.
    ///
    /// ## Errors
    /// Returns `DeliveryError` if the code could not be handed off.
    async fn send(&self, email: &str, code: &str) -> ServiceResult<()>;
}

/// Writes codes to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCodeSender {
    /// When false only the fact that a code was issued is logged.
    pub log_codes: bool,
}

#[async_trait]
impl LoginCodeSender for LogCodeSender {
    async fn send(&self, email: &str, code: &str) -> ServiceResult<()> {
        if self.log_codes {
            tracing::info!(%email, %code, "Login code issued");
        } else {
            tracing::info!(%email, "Login code issued; no delivery adapter configured");
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingCodeSender;

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    use async_trait::async_trait;

    use super::LoginCodeSender;
    use crate::error::ServiceResult;

    /// Keeps the last code sent to each address so tests can sign in.
    #[derive(Debug, Default)]
    pub struct RecordingCodeSender {
        codes: Mutex<HashMap<String, String>>,
    }

    impl RecordingCodeSender {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn last_code(&self, email: &str) -> Option<String> {
            self.lock().get(email).cloned()
        }

        fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
            match self.codes.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    self.codes.clear_poison();
                    poisoned.into_inner()
                }
            }
        }
    }

    #[async_trait]
    impl LoginCodeSender for RecordingCodeSender {
        async fn send(&self, email: &str, code: &str) -> ServiceResult<()> {
            self.lock().insert(email.to_string(), code.to_string());
            Ok(())
        }
    }
}

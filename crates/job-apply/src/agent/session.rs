use std::sync::Arc;

use tracing::{debug, warn};

use super::{BrowserProvider, BrowserSession};

/// Scoped ownership of a browser session.
///
/// Call [`SessionGuard::release`] on every normal exit. If the owning future is dropped first
/// (request cancelled, caller timed out), `Drop` hands the close off to the runtime so the
/// session is still released.
pub struct SessionGuard<B: BrowserProvider + ?Sized + 'static> {
    provider: Arc<B>,
    session: Option<BrowserSession>,
}

impl<B: BrowserProvider + ?Sized + 'static> SessionGuard<B> {
    pub async fn acquire(provider: Arc<B>) -> Result<Self, super::AgentError> {
        let session = provider.open().await?;
        debug!(session = %session.id, "browser session acquired");
        Ok(Self {
            provider,
            session: Some(session),
        })
    }

    pub fn session(&self) -> &BrowserSession {
        self.session
            .as_ref()
            .expect("session is only taken by release or drop")
    }

    /// Close the session now. Close failures are logged, never propagated.
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            match self.provider.close(&session).await {
                Ok(()) => debug!(session = %session.id, "browser session released"),
                Err(err) => warn!(session = %session.id, error = %err, "failed to close browser session"),
            }
        }
    }
}

impl<B: BrowserProvider + ?Sized + 'static> Drop for SessionGuard<B> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let provider = Arc::clone(&self.provider);
                handle.spawn(async move {
                    if let Err(err) = provider.close(&session).await {
                        warn!(session = %session.id, error = %err, "failed to close abandoned browser session");
                    } else {
                        debug!(session = %session.id, "abandoned browser session released");
                    }
                });
            }
            Err(_) => {
                warn!(session = %session.id, "no runtime available to close abandoned browser session");
            }
        }
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("an analyzer is already being served by this lifecycle")]
    AlreadyServing,
}

/// Owned by the service bootstrapper; at most one analyzer serves per lifecycle.
#[derive(Clone, Debug, Default)]
pub struct ServiceLifecycle {
    serving: Arc<AtomicBool>,
}

impl ServiceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to serve. Fails while another lease is alive.
    pub fn claim(&self) -> Result<ServeLease, HostError> {
        self.serving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HostError::AlreadyServing)?;
        Ok(ServeLease {
            serving: Arc::clone(&self.serving),
        })
    }

    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }
}

/// Proof of a successful claim; dropping it lets the lifecycle serve again.
#[derive(Debug)]
pub struct ServeLease {
    serving: Arc<AtomicBool>,
}

impl Drop for ServeLease {
    fn drop(&mut self) {
        self.serving.store(false, Ordering::Release);
    }
}

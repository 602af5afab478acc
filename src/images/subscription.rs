//! Cancellable image subscriptions
//!
//! A subscription owns one in-flight resolution and publishes its outcome
//! through a watch channel. Cancelling (or dropping) the subscription
//! guarantees the outcome is never published. The resolution itself runs
//! detached, so a fetch that already started can still land in the cache.

use crate::images::cache::{ImageCache, ImageState};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle of a subscribed image
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStatus {
    Pending,
    Resolved(ImageState),
    /// Resolution failed; the state may still carry a fallback URL
    Failed(ImageState),
}

impl ImageStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ImageStatus::Pending)
    }

    /// Final state, if resolution has finished
    pub fn state(&self) -> Option<&ImageState> {
        match self {
            ImageStatus::Pending => None,
            ImageStatus::Resolved(state) | ImageStatus::Failed(state) => Some(state),
        }
    }

    fn from_state(state: ImageState) -> Self {
        if state.is_failed() {
            ImageStatus::Failed(state)
        } else {
            ImageStatus::Resolved(state)
        }
    }
}

struct Request {
    cancelled: Arc<Mutex<bool>>,
    publisher: JoinHandle<()>,
}

impl Request {
    fn cancel(self) {
        *self.cancelled.lock().unwrap_or_else(|e| e.into_inner()) = true;
        self.publisher.abort();
    }
}

/// Handle to one image resolution
pub struct ImageSubscription {
    cache: Arc<ImageCache>,
    tx: Arc<watch::Sender<ImageStatus>>,
    rx: watch::Receiver<ImageStatus>,
    current: Option<Request>,
}

impl ImageCache {
    /// Start resolving `url` and return a handle observing the outcome
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(self: &Arc<Self>, url: Option<&str>, label: Option<&str>) -> ImageSubscription {
        let (tx, rx) = watch::channel(ImageStatus::Pending);
        let mut subscription = ImageSubscription {
            cache: Arc::clone(self),
            tx: Arc::new(tx),
            rx,
            current: None,
        };
        subscription.start(url, label);
        subscription
    }
}

impl ImageSubscription {
    /// Current status
    pub fn state(&self) -> ImageStatus {
        self.rx.borrow().clone()
    }

    /// A receiver for observing transitions
    pub fn watch(&self) -> watch::Receiver<ImageStatus> {
        self.rx.clone()
    }

    /// Wait for the outcome; `None` once cancelled
    pub async fn resolved(&self) -> Option<ImageState> {
        if self.current.is_none() {
            return self.rx.borrow().state().cloned();
        }

        let mut rx = self.rx.clone();
        let status = rx.wait_for(|status| !status.is_pending()).await.ok()?;
        status.state().cloned()
    }

    /// Stop the in-flight resolution; its result will never be published
    pub fn cancel(&mut self) {
        if let Some(request) = self.current.take() {
            debug!("Cancelled image subscription");
            request.cancel();
        }
    }

    /// Whether the subscription was cancelled before finishing
    pub fn is_cancelled(&self) -> bool {
        self.current.is_none() && self.rx.borrow().is_pending()
    }

    /// Abandon the current request and resolve a different URL
    pub fn retarget(&mut self, url: Option<&str>, label: Option<&str>) {
        self.cancel();
        self.tx.send_replace(ImageStatus::Pending);
        self.start(url, label);
    }

    fn start(&mut self, url: Option<&str>, label: Option<&str>) {
        let cancelled = Arc::new(Mutex::new(false));

        let cache = Arc::clone(&self.cache);
        let url = url.map(str::to_string);
        let label = label.map(str::to_string);
        let target = url.clone();
        // Detached so an aborted subscription cannot interrupt a cache write
        let resolution =
            tokio::spawn(async move { cache.resolve(url.as_deref(), label.as_deref()).await });

        let tx = Arc::clone(&self.tx);
        let flag = Arc::clone(&cancelled);
        let publisher = tokio::spawn(async move {
            let state = match resolution.await {
                Ok(state) => state,
                Err(e) => {
                    let shown = target.as_deref().unwrap_or("(none)");
                    warn!("Image resolution for {} failed: {}", shown, e);
                    ImageState::interrupted(target.as_deref(), format!("Resolution failed: {}", e))
                }
            };
            let cancelled = flag.lock().unwrap_or_else(|e| e.into_inner());
            if !*cancelled {
                tx.send_replace(ImageStatus::from_state(state));
            }
        });

        self.current = Some(Request {
            cancelled,
            publisher,
        });
    }
}

impl Drop for ImageSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

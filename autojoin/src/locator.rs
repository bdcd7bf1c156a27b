use tracing::{debug, instrument};

use crate::element::DomElement;
use crate::errors::AutomationError;
use crate::platforms::DomEngine;
use crate::selector::Selector;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

// How often a waiting locator re-queries the page
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A high-level API for finding and waiting for DOM elements
#[derive(Clone)]
pub struct Locator {
    engine: Arc<dyn DomEngine>,
    selector: Selector,
    root: Option<DomElement>,
}

impl Locator {
    /// Create a new locator with the given selector
    pub(crate) fn new(engine: Arc<dyn DomEngine>, selector: Selector) -> Self {
        Self {
            engine,
            selector,
            root: None,
        }
    }

    /// Set the root element for this locator
    pub fn within(mut self, element: DomElement) -> Self {
        self.root = Some(element);
        self
    }

    /// All elements currently matching this locator; does not wait
    pub async fn all(&self) -> Result<Vec<DomElement>, AutomationError> {
        self.engine
            .find_elements(&self.selector, self.root.as_ref())
            .await
    }

    /// The first element currently matching this locator; does not wait
    pub async fn first(&self) -> Result<DomElement, AutomationError> {
        self.engine
            .find_element(&self.selector, self.root.as_ref())
            .await
    }

    /// Wait for an element matching the locator to appear, up to `timeout`.
    #[instrument(level = "debug", skip(self), fields(selector = %self.selector))]
    pub async fn wait(&self, timeout: Duration) -> Result<DomElement, AutomationError> {
        let deadline = Instant::now() + timeout;
        debug!("Waiting up to {:?} for element", timeout);

        loop {
            match self.first().await {
                Ok(element) => return Ok(element),
                // Re-rendering lists detach nodes mid-query; keep polling.
                Err(AutomationError::ElementNotFound(_)) | Err(AutomationError::ElementDetached(_)) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(AutomationError::Timeout(format!(
                    "Timed out after {timeout:?} waiting for element {}",
                    self.selector
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

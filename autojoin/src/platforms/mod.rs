use crate::config::BrowserOptions;
use crate::{AutomationError, DomElement, Selector};
use std::sync::Arc;

pub mod chromium;

/// The common trait that every page-driving engine must implement
#[async_trait::async_trait]
pub trait DomEngine: Send + Sync {
    /// Load a URL in the engine's page
    async fn navigate(&self, url: &str) -> Result<(), AutomationError>;

    /// All elements of the whole page matching the selector, in document order
    async fn query_all(&self, selector: &Selector) -> Result<Vec<DomElement>, AutomationError>;

    /// Find all elements matching a selector, optionally scoped under `root`
    async fn find_elements(
        &self,
        selector: &Selector,
        root: Option<&DomElement>,
    ) -> Result<Vec<DomElement>, AutomationError> {
        if let Selector::Invalid(reason) = selector {
            return Err(AutomationError::InvalidArgument(reason.clone()));
        }
        match root {
            Some(root) => root.find_elements(selector.clone()).await,
            None => self.query_all(selector).await,
        }
    }

    /// Find the first element matching a selector, without waiting
    async fn find_element(
        &self,
        selector: &Selector,
        root: Option<&DomElement>,
    ) -> Result<DomElement, AutomationError> {
        self.find_elements(selector, root)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AutomationError::ElementNotFound(selector.to_string()))
    }
}

/// Launch the browser and return an engine driving its single page
pub async fn create_engine(
    options: &BrowserOptions,
) -> Result<Arc<dyn DomEngine>, AutomationError> {
    Ok(Arc::new(chromium::ChromiumEngine::launch(options).await?))
}

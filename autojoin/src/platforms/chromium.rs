//! Chromium engine over the DevTools protocol
//!
//! One browser, one page. The protocol handler runs as a background task for
//! as long as the engine lives; dropping the engine tears the browser down.

use super::DomEngine;
use crate::config::BrowserOptions;
use crate::{AutomationError, DomElement, DomElementImpl, Selector};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

fn cdp_error(context: &str, e: impl fmt::Display) -> AutomationError {
    AutomationError::PlatformError(format!("{context}: {e}"))
}

pub struct ChromiumEngine {
    // Held so the browser process outlives every page operation.
    _browser: Mutex<Browser>,
    page: Page,
    _handler: JoinHandle<()>,
}

impl ChromiumEngine {
    pub async fn launch(options: &BrowserOptions) -> Result<Self, AutomationError> {
        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head().window_size(1600, 1000).viewport(None);
        }
        if let Some(dir) = &options.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if let Some(exe) = &options.executable {
            builder = builder.chrome_executable(exe);
        }
        // The client refuses to start calls without media devices.
        builder = builder
            .arg("--use-fake-ui-for-media-stream")
            .arg("--disable-notifications");
        let config = builder
            .build()
            .map_err(|e| cdp_error("failed to build browser config", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| cdp_error("failed to launch browser", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("chromium handler event error: {}", e);
                }
            }
            debug!("chromium handler stream closed");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| cdp_error("failed to open page", e))?;
        info!(headless = options.headless, "Browser launched");

        Ok(Self {
            _browser: Mutex::new(browser),
            page,
            _handler: handler_task,
        })
    }
}

#[async_trait::async_trait]
impl DomEngine for ChromiumEngine {
    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        debug!(url, "navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| cdp_error(&format!("failed to navigate to {url}"), e))?;
        Ok(())
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<DomElement>, AutomationError> {
        let css = selector.to_css();
        let found = self
            .page
            .find_elements(css.as_str())
            .await
            .map_err(|e| cdp_error(&format!("query '{css}' failed"), e))?;
        Ok(found.into_iter().map(ChromiumElement::wrap).collect())
    }
}

#[derive(Clone)]
pub struct ChromiumElement {
    element: Arc<Element>,
}

impl ChromiumElement {
    fn wrap(element: Element) -> DomElement {
        DomElement::new(Box::new(Self {
            element: Arc::new(element),
        }))
    }
}

impl fmt::Debug for ChromiumElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumElement")
            .field("backend_node_id", &self.element.backend_node_id)
            .finish()
    }
}

#[async_trait::async_trait]
impl DomElementImpl for ChromiumElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| AutomationError::ElementDetached(format!("reading '{name}': {e}")))
    }

    async fn click(&self) -> Result<(), AutomationError> {
        self.element
            .click()
            .await
            .map_err(|e| AutomationError::ElementDetached(format!("click: {e}")))?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.element
            .click()
            .await
            .map_err(|e| AutomationError::ElementDetached(format!("focus: {e}")))?;
        self.element
            .type_str(text)
            .await
            .map_err(|e| cdp_error("typing failed", e))?;
        Ok(())
    }

    async fn is_attached(&self) -> Result<bool, AutomationError> {
        match self
            .element
            .call_js_fn("function() { return this.isConnected; }", false)
            .await
        {
            Ok(returns) => Ok(returns
                .result
                .value
                .as_ref()
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false)),
            // The remote object is gone along with the node.
            Err(e) => {
                debug!("isConnected check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<DomElement>, AutomationError> {
        if let Selector::Invalid(reason) = selector {
            return Err(AutomationError::InvalidArgument(reason.clone()));
        }
        let css = selector.to_css();
        let found = self
            .element
            .find_elements(css.as_str())
            .await
            .map_err(|e| AutomationError::ElementDetached(format!("query '{css}': {e}")))?;
        Ok(found.into_iter().map(Self::wrap).collect())
    }

    fn clone_box(&self) -> Box<dyn DomElementImpl> {
        Box::new(self.clone())
    }
}

use crate::errors::AutomationError;
use crate::selector::Selector;
use std::fmt::{self, Debug};
use tracing::instrument;

/// Interface for engine-specific element implementations
#[async_trait::async_trait]
pub trait DomElementImpl: Send + Sync + Debug {
    /// Read an attribute; `Ok(None)` when the element does not carry it
    async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError>;
    async fn click(&self) -> Result<(), AutomationError>;
    async fn type_text(&self, text: &str) -> Result<(), AutomationError>;
    /// Whether the node is still part of the rendered page
    async fn is_attached(&self) -> Result<bool, AutomationError>;
    /// All descendants of this element matching the selector, in document order
    async fn find_all(&self, selector: &Selector) -> Result<Vec<DomElement>, AutomationError>;
    fn clone_box(&self) -> Box<dyn DomElementImpl>;
}

/// Handle to a rendered DOM node
///
/// Handles stay usable only as long as the page does not re-render the node;
/// engines report stale handles as [`AutomationError::ElementDetached`].
pub struct DomElement {
    inner: Box<dyn DomElementImpl>,
}

impl DomElement {
    /// Create a new element from an engine-specific implementation
    pub fn new(impl_: Box<dyn DomElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        self.inner.attribute(name).await
    }

    /// Like [`attribute`](Self::attribute), but a missing attribute is a contract violation
    pub async fn required_attribute(&self, name: &str) -> Result<String, AutomationError> {
        self.inner.attribute(name).await?.ok_or_else(|| {
            AutomationError::MalformedState(format!("element {self:?} has no '{name}' attribute"))
        })
    }

    /// Click on this element
    #[instrument(level = "debug", skip(self))]
    pub async fn click(&self) -> Result<(), AutomationError> {
        self.inner.click().await
    }

    /// Send keystrokes to this element
    #[instrument(level = "debug", skip(self, text))]
    pub async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.type_text(text).await
    }

    pub async fn is_attached(&self) -> Result<bool, AutomationError> {
        self.inner.is_attached().await
    }

    /// Find the first descendant matching the selector, without waiting
    pub async fn find_element(
        &self,
        selector: impl Into<Selector>,
    ) -> Result<DomElement, AutomationError> {
        let selector = selector.into();
        self.inner
            .find_all(&selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AutomationError::ElementNotFound(selector.to_string()))
    }

    /// Find all descendants matching the selector, without waiting
    pub async fn find_elements(
        &self,
        selector: impl Into<Selector>,
    ) -> Result<Vec<DomElement>, AutomationError> {
        self.inner.find_all(&selector.into()).await
    }
}

impl Clone for DomElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl Debug for DomElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Element is detached from DOM: {0}")]
    ElementDetached(String),

    /// The client rendered something we matched but could not interpret,
    /// e.g. a join button without a meeting id.
    #[error("Malformed page state: {0}")]
    MalformedState(String),

    #[error("Browser error: {0}")]
    PlatformError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AutomationError {
    /// Failures a polling cycle can shrug off and retry on the next tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_)
                | AutomationError::Timeout(_)
                | AutomationError::ElementDetached(_)
        )
    }
}

/// Turns the "expected absence" outcome of a lookup into `None`.
pub trait OptionalElement<T> {
    fn optional(self) -> Result<Option<T>, AutomationError>;
}

impl<T> OptionalElement<T> for Result<T, AutomationError> {
    fn optional(self) -> Result<Option<T>, AutomationError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(AutomationError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

//! Sit in the newest meeting of a browser-hosted collaboration client
//!
//! The crate drives a browser page through the [`DomEngine`] seam, reads the
//! client's teams and channels, keeps track of meetings as they start, and
//! joins whichever eligible meeting was discovered most recently.

pub mod blacklist;
pub mod config;
pub mod control;
pub mod element;
pub mod errors;
pub mod joiner;
pub mod locator;
pub mod model;
pub mod platforms;
pub mod scanner;
pub mod selector;
pub mod session;
#[cfg(test)]
mod tests;
pub mod ui;

pub use blacklist::apply_blacklist;
pub use config::{BlacklistEntry, Config, ConfigError};
pub use element::{DomElement, DomElementImpl};
pub use errors::{AutomationError, OptionalElement};
pub use joiner::{select_and_join, select_newest, JoinOutcome, JoinTarget};
pub use locator::Locator;
pub use model::{discover_teams, Channel, ChannelPanel, Meeting, MeetingId, Team};
pub use platforms::{create_engine, DomEngine};
pub use scanner::scan_team;
pub use selector::{AttrOp, AttributeMatch, Selector};
pub use session::{ActiveMeeting, Session};

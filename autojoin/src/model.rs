//! Teams, channels and the meetings discovered in them

use crate::element::DomElement;
use crate::errors::{AutomationError, OptionalElement};
use crate::session::Session;
use crate::ui;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// How long an expand click gets to render the channel panel
const EXPAND_WAIT: Duration = Duration::from_secs(2);

/// Identifier of a meeting, as found in join-button metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeetingId(Uuid);

impl FromStr for MeetingId {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(MeetingId)
            .map_err(|e| AutomationError::MalformedState(format!("bad meeting id '{s}': {e}")))
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A meeting seen running in a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub id: MeetingId,
    /// When the meeting was first discovered. The client exposes no
    /// trustworthy start time, so discovery time stands in for recency.
    pub started_at: Instant,
}

impl Meeting {
    pub fn new(id: MeetingId, started_at: Instant) -> Self {
        Self { id, started_at }
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    blacklisted: bool,
    meetings: Vec<Meeting>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blacklisted: false,
            meetings: Vec::new(),
        }
    }

    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    /// One-way: a blacklisted channel stays blacklisted for the session.
    pub fn blacklist(&mut self) {
        self.blacklisted = true;
    }

    /// Meetings in discovery order
    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    pub fn has_meeting(&self, id: &MeetingId) -> bool {
        self.meetings.iter().any(|m| m.id == *id)
    }

    /// Append a meeting unless its id is already known. Returns whether it was new.
    pub fn record(&mut self, id: MeetingId, seen_at: Instant) -> bool {
        if self.has_meeting(&id) {
            return false;
        }
        self.meetings.push(Meeting::new(id, seen_at));
        true
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use colored::Colorize;
        if self.blacklisted {
            write!(f, "{}", self.name.red())
        } else {
            f.write_str(&self.name)
        }
    }
}

/// A team node handle, valid until the session next navigates
#[derive(Debug, Clone)]
struct TeamHandle {
    element: DomElement,
    epoch: u64,
}

#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub channels: Vec<Channel>,
    handle: Option<TeamHandle>,
}

/// Proof that a team's channel list is rendered
#[derive(Debug, Clone)]
pub struct ChannelPanel {
    element: DomElement,
}

impl ChannelPanel {
    /// Look a channel up by name. Never cache the result: the list re-renders.
    pub async fn channel_node(&self, name: &str) -> Result<Option<DomElement>, AutomationError> {
        self.element
            .find_element(ui::channel_node(name))
            .await
            .optional()
    }

    pub async fn channel_names(&self) -> Result<Vec<String>, AutomationError> {
        let mut names = Vec::new();
        for node in self.element.find_elements(ui::channel_nodes()).await? {
            let tid = node.required_attribute(ui::ID_ATTR).await?;
            names.push(ui::channel_name_from_tid(&tid)?);
        }
        Ok(names)
    }
}

impl Team {
    /// A team bound to its node as rendered at navigation `epoch`
    pub fn new(name: impl Into<String>, element: DomElement, epoch: u64) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            handle: Some(TeamHandle { element, epoch }),
        }
    }

    /// A team with no DOM handle yet
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            handle: None,
        }
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.name == name)
    }

    pub fn is_handle_current(&self, session: &Session) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.epoch == session.epoch())
    }

    /// The team's node, if the handle survived every navigation since it was taken
    pub fn node(&self, session: &Session) -> Result<&DomElement, AutomationError> {
        match &self.handle {
            Some(h) if h.epoch == session.epoch() => Ok(&h.element),
            Some(h) => Err(AutomationError::ElementDetached(format!(
                "team '{}' handle is from epoch {}, page is at {}",
                self.name,
                h.epoch,
                session.epoch()
            ))),
            None => Err(AutomationError::ElementDetached(format!(
                "team '{}' has no handle",
                self.name
            ))),
        }
    }

    /// Forget the team's node, e.g. after the client re-rendered it on its own.
    /// The next [`refresh_handle`](Self::refresh_handle) takes a fresh one.
    pub fn invalidate_handle(&mut self) {
        self.handle = None;
    }

    /// Re-acquire the team's node after a navigation
    #[instrument(level = "debug", skip(self, session), fields(team = %self.name))]
    pub async fn refresh_handle(&mut self, session: &Session) -> Result<(), AutomationError> {
        let element = session.locator(ui::team_node(&self.name)).first().await?;
        self.handle = Some(TeamHandle {
            element,
            epoch: session.epoch(),
        });
        Ok(())
    }

    /// Make sure the team's channel list is open, clicking the team once if needed.
    /// `None` means the team has no reachable channel list.
    pub async fn ensure_expanded(
        &self,
        session: &Session,
    ) -> Result<Option<ChannelPanel>, AutomationError> {
        let node = self.node(session)?;
        if let Some(element) = node.find_element(ui::channel_panel()).await.optional()? {
            return Ok(Some(ChannelPanel { element }));
        }

        debug!(team = %self.name, "expanding channel list");
        node.click().await?;
        match session
            .locator(ui::channel_panel())
            .within(node.clone())
            .wait(EXPAND_WAIT)
            .await
        {
            Ok(element) => Ok(Some(ChannelPanel { element })),
            Err(AutomationError::Timeout(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Rebuild the channel list from the page. Discards meeting history.
    #[instrument(skip(self, session), fields(team = %self.name))]
    pub async fn init_channels(&mut self, session: &Session) -> Result<(), AutomationError> {
        let names = match self.ensure_expanded(session).await? {
            Some(panel) => panel.channel_names().await?,
            None => {
                info!("Team has no reachable channel list");
                Vec::new()
            }
        };
        debug!(count = names.len(), "channels found");
        self.channels = names.into_iter().map(Channel::new).collect();
        Ok(())
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for channel in &self.channels {
            write!(f, "\n\t{channel}")?;
        }
        Ok(())
    }
}

/// Read every team in the organization panel
#[instrument(skip(session))]
pub async fn discover_teams(session: &Session) -> Result<Vec<Team>, AutomationError> {
    let mut teams = Vec::new();
    for node in session.locator(ui::team_nodes()).all().await? {
        let tid = node.required_attribute(ui::ID_ATTR).await?;
        let name = ui::team_name_from_tid(&tid)?;
        teams.push(Team::new(name, node, session.epoch()));
    }
    info!(count = teams.len(), "Discovered teams");
    Ok(teams)
}

//! Initializing -> Configuring -> Polling

use crate::blacklist::apply_blacklist;
use crate::config::Config;
use crate::errors::AutomationError;
use crate::joiner::{select_and_join, JoinOutcome};
use crate::model::{discover_teams, Team};
use crate::platforms::DomEngine;
use crate::scanner::scan_team;
use crate::session::Session;
use std::convert::Infallible;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, instrument, warn};

pub const PROMPT: &str = "\nStart [s], Reload teams [r], Quit [q]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Configuring,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reload,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" => Some(Command::Start),
            "r" => Some(Command::Reload),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error(transparent)]
    Automation(#[from] AutomationError),

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

fn enter(phase: Phase) {
    info!(?phase, "Entering phase");
}

/// Open the client and wait until it is usable
pub async fn initialize(
    engine: Arc<dyn DomEngine>,
    config: Config,
) -> Result<Session, AutomationError> {
    enter(Phase::Initializing);
    let mut session = Session::new(engine, config);
    session.open().await?;
    Ok(session)
}

/// Discover teams, read their channels and apply the blacklist
#[instrument(skip(session))]
pub async fn load_organization(session: &Session) -> Result<Vec<Team>, AutomationError> {
    let mut teams = discover_teams(session).await?;
    for team in &mut teams {
        team.init_channels(session).await?;
        apply_blacklist(team, &session.config().blacklist);
    }
    Ok(teams)
}

/// Team names with their channels indented underneath; blacklisted ones in red
pub fn render_tree(teams: &[Team]) -> String {
    teams
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Show the organization and wait for the operator's go-ahead.
/// Returns `None` when the operator quits (end of input counts as quitting).
pub async fn configure<R, W>(
    session: &Session,
    input: &mut R,
    output: &mut W,
) -> Result<Option<Vec<Team>>, ControlError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    enter(Phase::Configuring);
    let mut teams = load_organization(session).await?;
    writeln!(output, "{}", render_tree(&teams))?;

    let mut line = String::new();
    loop {
        writeln!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        match Command::parse(&line) {
            Some(Command::Start) => return Ok(Some(teams)),
            Some(Command::Quit) => return Ok(None),
            Some(Command::Reload) => {
                teams = load_organization(session).await?;
                writeln!(output, "{}", render_tree(&teams))?;
            }
            None => {}
        }
    }
}

/// Re-acquire every team handle taken before the last navigation or dropped as detached
pub async fn refresh_handles(session: &Session, teams: &mut [Team]) -> Result<(), AutomationError> {
    for team in teams.iter_mut() {
        if team.is_handle_current(session) {
            continue;
        }
        match team.refresh_handle(session).await {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                warn!(team = %team.name, "Could not re-acquire team: {}", e)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// One pass: refresh stale handles, scan every team, then join if something newer showed up
pub async fn poll_cycle(
    session: &mut Session,
    teams: &mut [Team],
) -> Result<JoinOutcome, AutomationError> {
    refresh_handles(session, teams).await?;

    for team in teams.iter_mut() {
        match scan_team(session, team).await {
            Ok(_) => {}
            Err(e) if e.is_recoverable() => {
                warn!(team = %team.name, "Skipping team this cycle: {}", e);
                // The client may re-render the rail without us navigating.
                if matches!(e, AutomationError::ElementDetached(_)) {
                    team.invalidate_handle();
                }
            }
            Err(e) => return Err(e),
        }
    }

    let outcome = match select_and_join(session, teams).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_recoverable() => {
            warn!("Join attempt failed: {}", e);
            if matches!(e, AutomationError::ElementDetached(_)) {
                teams.iter_mut().for_each(Team::invalidate_handle);
            }
            JoinOutcome::Aborted { navigated: true }
        }
        Err(e) => return Err(e),
    };
    if outcome.navigated() {
        refresh_handles(session, teams).await?;
    }
    Ok(outcome)
}

/// Poll until the process is killed. Only unrecoverable errors return.
pub async fn poll_forever(
    session: &mut Session,
    mut teams: Vec<Team>,
) -> Result<Infallible, AutomationError> {
    enter(Phase::Polling);
    let interval = session.config().poll_interval();
    loop {
        tokio::time::sleep(interval).await;
        poll_cycle(session, &mut teams).await?;
    }
}

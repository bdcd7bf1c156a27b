//! Picking the newest meeting and walking through the join dialog

use crate::errors::{AutomationError, OptionalElement};
use crate::model::{Meeting, Team};
use crate::session::{ActiveMeeting, Session};
use crate::ui;
use tracing::{debug, info, instrument, warn};

/// The meeting selection settled on, with where to find it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTarget {
    pub team: usize,
    pub channel: usize,
    pub meeting: Meeting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Nothing newer than the active meeting; the page was not touched.
    NoAction,
    /// A join was attempted but did not finish. The active meeting is unchanged.
    Aborted { navigated: bool },
    Joined(ActiveMeeting),
}

impl JoinOutcome {
    /// Whether team handles must be re-acquired
    pub fn navigated(&self) -> bool {
        match self {
            JoinOutcome::NoAction => false,
            JoinOutcome::Aborted { navigated } => *navigated,
            JoinOutcome::Joined(_) => true,
        }
    }
}

/// Find the most recently discovered meeting in a non-blacklisted channel
/// that is strictly newer than `active`.
pub fn select_newest(teams: &[Team], active: Option<&Meeting>) -> Option<JoinTarget> {
    let mut best = active.map(|m| m.started_at);
    let mut target = None;

    for (team_idx, team) in teams.iter().enumerate() {
        for (channel_idx, channel) in team.channels.iter().enumerate() {
            if channel.is_blacklisted() {
                continue;
            }
            for meeting in channel.meetings() {
                if best.map_or(true, |b| meeting.started_at > b) {
                    best = Some(meeting.started_at);
                    target = Some(JoinTarget {
                        team: team_idx,
                        channel: channel_idx,
                        meeting: meeting.clone(),
                    });
                }
            }
        }
    }
    target
}

/// Join the newest eligible meeting unless the session already sits in it.
///
/// Timeouts and missing controls end the attempt quietly; the next cycle will
/// select the same meeting again.
#[instrument(skip_all)]
pub async fn select_and_join(
    session: &mut Session,
    teams: &[Team],
) -> Result<JoinOutcome, AutomationError> {
    let active = session.active_meeting().map(|a| &a.meeting);
    let Some(target) = select_newest(teams, active) else {
        return Ok(JoinOutcome::NoAction);
    };
    let team = &teams[target.team];
    let channel = &team.channels[target.channel];
    info!(team = %team.name, channel = %channel.name, meeting = %target.meeting.id, "Joining newer meeting");

    hang_up(session).await?;

    let Some(panel) = team.ensure_expanded(session).await? else {
        warn!(team = %team.name, "channel list is gone; cannot reach meeting");
        return Ok(JoinOutcome::Aborted { navigated: false });
    };
    let Some(node) = panel.channel_node(&channel.name).await? else {
        warn!(channel = %channel.name, "channel not rendered; cannot reach meeting");
        return Ok(JoinOutcome::Aborted { navigated: false });
    };
    node.click().await?;
    session.mark_navigated();

    let timeout = session.config().timeouts.join();
    let steps = [
        ("join button", ui::join_button_for(&target.meeting.id)),
        ("join now", ui::prejoin_button()),
    ];
    for (step, selector) in steps {
        match session.locator(selector).wait(timeout).await {
            Ok(button) => button.click().await?,
            Err(AutomationError::Timeout(msg)) => {
                info!(step, "Join aborted: {}", msg);
                return Ok(JoinOutcome::Aborted { navigated: true });
            }
            Err(e) => return Err(e),
        }
    }

    let Some(back) = session
        .locator(ui::back_to_teams())
        .first()
        .await
        .optional()?
    else {
        info!("Join aborted: no way back to the teams view");
        return Ok(JoinOutcome::Aborted { navigated: true });
    };
    back.click().await?;

    let joined = ActiveMeeting {
        meeting: target.meeting,
        team: team.name.clone(),
        channel: channel.name.clone(),
    };
    session.set_active_meeting(joined.clone());
    info!(team = %joined.team, channel = %joined.channel, meeting = %joined.id(), "Joined meeting");
    Ok(JoinOutcome::Joined(joined))
}

/// Leave the current call if there is one. No hangup control means no call.
async fn hang_up(session: &Session) -> Result<(), AutomationError> {
    match session.locator(ui::hangup_button()).first().await.optional()? {
        Some(button) => {
            debug!("hanging up current call");
            button.click().await
        }
        None => Ok(()),
    }
}

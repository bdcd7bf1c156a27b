use crate::element::DomElement;
use crate::errors::{AutomationError, OptionalElement};
use crate::locator::POLL_INTERVAL;
use crate::model::{ChannelPanel, MeetingId, Team};
use crate::session::Session;
use crate::ui;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

/// Look for newly started meetings in every eligible channel of the team.
///
/// Channels without a running call, or whose join panel does not render in
/// time, are skipped for this cycle. Join buttons left over from the panel
/// opened before are never credited to the channel being scanned. Returns the
/// number of new meetings.
#[instrument(level = "debug", skip(session, team), fields(team = %team.name))]
pub async fn scan_team(session: &Session, team: &mut Team) -> Result<usize, AutomationError> {
    if team.channels.iter().all(|c| c.is_blacklisted()) {
        return Ok(0);
    }
    let Some(panel) = team.ensure_expanded(session).await? else {
        debug!("no channel list to scan");
        return Ok(0);
    };

    let mut discovered = 0;
    for channel in team.channels.iter_mut().filter(|c| !c.is_blacklisted()) {
        let Some(ids) = meetings_in_channel(session, &panel, &channel.name).await? else {
            continue;
        };
        let now = Instant::now();
        for id in ids {
            if channel.record(id, now) {
                info!(team = %team.name, channel = %channel.name, meeting = %id, "Meeting discovered");
                discovered += 1;
            }
        }
    }
    Ok(discovered)
}

/// Open the channel's call panel and read the meeting ids on offer.
/// `None` when the channel has no call running or the panel never rendered.
async fn meetings_in_channel(
    session: &Session,
    panel: &ChannelPanel,
    channel: &str,
) -> Result<Option<Vec<MeetingId>>, AutomationError> {
    let Some(node) = panel.channel_node(channel).await? else {
        debug!(channel, "channel not rendered");
        return Ok(None);
    };
    let Some(indicator) = node
        .find_element(ui::active_call_indicator())
        .await
        .optional()?
    else {
        return Ok(None);
    };

    // Whatever call panel was opened last stays on the page until replaced.
    let stale = session.locator(ui::join_buttons()).all().await?;
    let stale_ids = read_meeting_ids(&stale).await.unwrap_or_default();

    indicator.click().await?;
    let timeout = session.config().timeouts.call_panel();
    match wait_for_fresh_buttons(session, &stale, &stale_ids, timeout).await? {
        Some(ids) => Ok(Some(dedup_in_order(ids))),
        None => {
            info!(channel, "Join buttons never appeared within {:?}", timeout);
            Ok(None)
        }
    }
}

/// Poll until join buttons are on the page that did not belong to the
/// previously open panel: either its buttons went away or the offered ids changed.
async fn wait_for_fresh_buttons(
    session: &Session,
    stale: &[DomElement],
    stale_ids: &[MeetingId],
    timeout: Duration,
) -> Result<Option<Vec<MeetingId>>, AutomationError> {
    let deadline = Instant::now() + timeout;
    loop {
        let buttons = session.locator(ui::join_buttons()).all().await?;
        if !buttons.is_empty() {
            match read_meeting_ids(&buttons).await {
                Ok(ids) => {
                    if stale.is_empty() || ids != stale_ids || any_detached(stale).await? {
                        return Ok(Some(ids));
                    }
                }
                Err(AutomationError::ElementDetached(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn any_detached(elements: &[DomElement]) -> Result<bool, AutomationError> {
    for element in elements {
        if !element.is_attached().await? {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn read_meeting_ids(buttons: &[DomElement]) -> Result<Vec<MeetingId>, AutomationError> {
    let mut ids = Vec::with_capacity(buttons.len());
    for button in buttons {
        let track = button.required_attribute(ui::TRACK_ATTR).await?;
        ids.push(ui::meeting_id_from_track_data(&track)?);
    }
    Ok(ids)
}

/// Drop repeated ids, keeping the first occurrence of each
pub fn dedup_in_order(ids: Vec<MeetingId>) -> Vec<MeetingId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

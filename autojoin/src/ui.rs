//! Where things live in the client's rendered page
//!
//! Selectors and identifier formats of the collaboration client. When the
//! client changes its markup, this is the only file that should need edits.

use crate::errors::AutomationError;
use crate::model::MeetingId;
use crate::selector::Selector;
use once_cell::sync::Lazy;
use regex::Regex;

static MEETING_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-f]{8}\b-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-\b[0-9a-f]{12}\b")
        .expect("meeting id pattern is valid")
});

/// Attribute carrying the structured identifiers of teams and channels
pub const ID_ATTR: &str = "data-tid";
/// Attribute on join buttons carrying call metadata, including the meeting id
pub const TRACK_ATTR: &str = "track-data";

pub fn main_panel() -> Selector {
    Selector::from("div[data-tid='team-channel-list']")
}

// A team's row in the left rail
fn team_item() -> Selector {
    Selector::from("ul>li[role='treeitem'][class='match-parent team left-rail-item-kb-l2']")
}

pub fn team_nodes() -> Selector {
    team_item().child(Selector::tag("div"))
}

pub fn team_node(name: &str) -> Selector {
    team_item().child(Selector::tag("div").with_attr(
        ID_ATTR,
        crate::AttrOp::Equals,
        team_tid(name),
    ))
}

pub fn channel_panel() -> Selector {
    Selector::from("div[class='channels']")
}

pub fn channel_nodes() -> Selector {
    Selector::from("ul>ng-include>li")
}

pub fn channel_node(name: &str) -> Selector {
    channel_nodes().with_attr(
        ID_ATTR,
        crate::AttrOp::Contains,
        format!("-channel-{name}-li"),
    )
}

pub fn active_call_indicator() -> Selector {
    Selector::from("active-calls-counter[is-meeting='true']")
}

pub fn join_buttons() -> Selector {
    Selector::from("button[ng-click='ctrl.joinCall()']")
}

pub fn join_button_for(id: &MeetingId) -> Selector {
    Selector::tag("button").with_attr(TRACK_ATTR, crate::AttrOp::Contains, id.to_string())
}

pub fn prejoin_button() -> Selector {
    Selector::from("button[data-tid='prejoin-join-button']")
}

pub fn hangup_button() -> Selector {
    Selector::from("button[data-tid='call-hangup']")
}

pub fn back_to_teams() -> Selector {
    Selector::from("span[data-tid='appBarText-Teams']")
}

pub fn email_input() -> Selector {
    Selector::from("input[type='email']")
}

pub fn password_input() -> Selector {
    Selector::from("input[type='password']")
}

pub fn submit_button() -> Selector {
    Selector::from("input[type='submit']")
}

pub fn team_tid(name: &str) -> String {
    format!("team-{name}-li")
}

pub fn channel_tid(team: &str, channel: &str) -> String {
    format!("team-{team}-channel-{channel}-li")
}

/// `team-<name>-li` -> `<name>`
pub fn team_name_from_tid(tid: &str) -> Result<String, AutomationError> {
    between(tid, "team-", "-li")
        .ok_or_else(|| AutomationError::MalformedState(format!("unexpected team id '{tid}'")))
}

/// `...-channel-<name>-li` -> `<name>`
pub fn channel_name_from_tid(tid: &str) -> Result<String, AutomationError> {
    between(tid, "-channel-", "-li")
        .ok_or_else(|| AutomationError::MalformedState(format!("unexpected channel id '{tid}'")))
}

// Text after the first `start` and before the last `end`.
fn between(s: &str, start: &str, end: &str) -> Option<String> {
    let from = s.find(start)? + start.len();
    let to = s.rfind(end)?;
    (from <= to).then(|| s[from..to].to_string())
}

/// Pull the meeting id out of a join button's metadata
pub fn meeting_id_from_track_data(track_data: &str) -> Result<MeetingId, AutomationError> {
    let found = MEETING_ID_RE.find(track_data).ok_or_else(|| {
        AutomationError::MalformedState(format!("no meeting id in '{track_data}'"))
    })?;
    found.as_str().parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_team_and_channel_names() {
        assert_eq!(team_name_from_tid("team-Eng-li").unwrap(), "Eng");
        assert_eq!(team_name_from_tid(&team_tid("R&D - li team")).unwrap(), "R&D - li team");
        assert_eq!(
            channel_name_from_tid(&channel_tid("Eng", "general")).unwrap(),
            "general"
        );
    }

    #[test]
    fn malformed_identifiers_are_reported() {
        assert!(matches!(
            team_name_from_tid("something-else"),
            Err(AutomationError::MalformedState(_))
        ));
        assert!(matches!(
            channel_name_from_tid("team-Eng-li"),
            Err(AutomationError::MalformedState(_))
        ));
    }

    #[test]
    fn meeting_id_is_found_inside_metadata() {
        let id = meeting_id_from_track_data(
            r#"{"scenario":"join","meetingId":"11111111-1111-1111-1111-111111111111"}"#,
        )
        .unwrap();
        assert_eq!(id.to_string(), "11111111-1111-1111-1111-111111111111");
    }

    #[test]
    fn metadata_without_id_is_malformed() {
        assert!(matches!(
            meeting_id_from_track_data(r#"{"scenario":"join"}"#),
            Err(AutomationError::MalformedState(_))
        ));
    }

    #[test]
    fn rail_selectors_use_direct_children() {
        assert_eq!(
            team_node("Eng").to_css(),
            "ul>li[role='treeitem'][class='match-parent team left-rail-item-kb-l2']>div[data-tid='team-Eng-li']"
        );
        assert_eq!(
            channel_node("general").to_css(),
            "ul>ng-include>li[data-tid*='-channel-general-li']"
        );
    }

    #[test]
    fn join_button_selector_targets_meeting() {
        let id: MeetingId = "22222222-2222-2222-2222-222222222222".parse().unwrap();
        assert_eq!(
            join_button_for(&id).to_css(),
            "button[track-data*='22222222-2222-2222-2222-222222222222']"
        );
    }
}

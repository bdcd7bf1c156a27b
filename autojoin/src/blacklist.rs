use crate::config::BlacklistEntry;
use crate::model::Team;
use tracing::debug;

/// Mark the team's channels excluded by the blacklist.
///
/// An entry with no channel names covers the whole team. Channels already
/// blacklisted stay that way; nothing here ever clears the flag.
pub fn apply_blacklist(team: &mut Team, blacklist: &[BlacklistEntry]) {
    let Some(entry) = blacklist.iter().find(|e| e.team_name == team.name) else {
        return;
    };

    for channel in &mut team.channels {
        if entry.channel_names.is_empty() || entry.channel_names.contains(&channel.name) {
            debug!(team = %team.name, channel = %channel.name, "blacklisted");
            channel.blacklist();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Channel;

    fn eng() -> Team {
        Team::unbound("Eng").with_channels(vec![
            Channel::new("general"),
            Channel::new("secret"),
            Channel::new("random"),
        ])
    }

    fn entry(team: &str, channels: &[&str]) -> BlacklistEntry {
        BlacklistEntry {
            team_name: team.to_string(),
            channel_names: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn flags(team: &Team) -> Vec<bool> {
        team.channels.iter().map(Channel::is_blacklisted).collect()
    }

    #[test]
    fn unlisted_team_is_untouched() {
        let mut team = eng();
        apply_blacklist(&mut team, &[entry("Ops", &[])]);
        assert_eq!(flags(&team), vec![false, false, false]);
    }

    #[test]
    fn empty_channel_list_blacklists_whole_team() {
        let mut team = eng();
        apply_blacklist(&mut team, &[entry("Eng", &[])]);
        assert_eq!(flags(&team), vec![true, true, true]);
    }

    #[test]
    fn named_channels_only() {
        let mut team = eng();
        apply_blacklist(&mut team, &[entry("Eng", &["secret", "missing"])]);
        assert_eq!(flags(&team), vec![false, true, false]);
    }

    #[test]
    fn first_matching_entry_wins() {
        let mut team = eng();
        apply_blacklist(
            &mut team,
            &[entry("Eng", &["random"]), entry("Eng", &[])],
        );
        assert_eq!(flags(&team), vec![false, false, true]);
    }
}

mod fake_dom;

use crate::{BlacklistEntry, Config};

pub const GENERAL_MEETING: &str = "11111111-1111-1111-1111-111111111111";
pub const SECRET_MEETING: &str = "22222222-2222-2222-2222-222222222222";
pub const DESIGN_MEETING: &str = "33333333-3333-3333-3333-333333333333";

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_test_writer()
        .try_init();
}

pub fn config_with_blacklist(entries: &[(&str, &[&str])]) -> Config {
    Config {
        blacklist: entries
            .iter()
            .map(|(team, channels)| BlacklistEntry {
                team_name: team.to_string(),
                channel_names: channels.iter().map(|c| c.to_string()).collect(),
            })
            .collect(),
        ..Config::default()
    }
}

use crate::config::Config;
use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::model::{Meeting, MeetingId};
use crate::platforms::DomEngine;
use crate::selector::Selector;
use crate::ui;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

// Pause between typing a credential and submitting it
const SUBMIT_PAUSE: Duration = Duration::from_secs(1);

/// The meeting the session is currently sitting in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMeeting {
    pub meeting: Meeting,
    pub team: String,
    pub channel: String,
}

impl ActiveMeeting {
    pub fn id(&self) -> MeetingId {
        self.meeting.id
    }
}

/// Everything an operation needs: the engine, the configuration, the active
/// meeting, and a counter bumped on every navigation so cached element
/// handles can tell when they went stale.
pub struct Session {
    engine: Arc<dyn DomEngine>,
    config: Config,
    active_meeting: Option<ActiveMeeting>,
    epoch: u64,
}

impl Session {
    pub fn new(engine: Arc<dyn DomEngine>, config: Config) -> Self {
        Self {
            engine,
            config,
            active_meeting: None,
            epoch: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locator(&self, selector: impl Into<Selector>) -> Locator {
        Locator::new(self.engine.clone(), selector.into())
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Record that the page navigated; every handle taken before is now stale.
    pub fn mark_navigated(&mut self) {
        self.epoch += 1;
    }

    pub fn active_meeting(&self) -> Option<&ActiveMeeting> {
        self.active_meeting.as_ref()
    }

    pub(crate) fn set_active_meeting(&mut self, active: ActiveMeeting) {
        self.active_meeting = Some(active);
    }

    /// Load the client, log in if configured, and wait for the organization panel.
    /// Any timeout here is fatal to the caller: there is nothing to retry against.
    #[instrument(skip(self), fields(url = %self.config.app_url))]
    pub async fn open(&mut self) -> Result<(), AutomationError> {
        self.engine.navigate(&self.config.app_url).await?;
        self.mark_navigated();

        if self.config.has_credentials() {
            self.login().await?;
        }

        info!("Waiting for the organization panel...");
        self.locator(ui::main_panel())
            .wait(self.config.timeouts.main_panel())
            .await?;
        info!("Organization panel is up");
        Ok(())
    }

    async fn login(&mut self) -> Result<(), AutomationError> {
        let timeout = self.config.timeouts.login();

        let email = self.locator(ui::email_input()).wait(timeout).await?;
        email.type_text(&self.config.email).await?;
        tokio::time::sleep(SUBMIT_PAUSE).await;
        self.locator(ui::submit_button()).first().await?.click().await?;
        self.mark_navigated();

        let password = self.locator(ui::password_input()).wait(timeout).await?;
        password.type_text(&self.config.password).await?;
        tokio::time::sleep(SUBMIT_PAUSE).await;
        self.locator(ui::submit_button()).first().await?.click().await?;
        self.mark_navigated();

        info!(email = %self.config.email, "Credentials submitted");
        Ok(())
    }
}

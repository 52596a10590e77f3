//! Who is signed in, which guild is selected and which view is shown.

use std::fmt;

use crate::error::{ConsoleError, Result};
use crate::models::{Account, AccountUser, Guild, RecordId};
use crate::preferences::PreferencesStorage;

/// Console views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Overview,
    Tickets,
    Messaging,
    Moderation,
    Roles,
    Users,
    Applications,
    Logs,
    Settings,
    Birthdays,
}

impl View {
    pub const ALL: [View; 11] = [
        View::Login,
        View::Overview,
        View::Tickets,
        View::Messaging,
        View::Moderation,
        View::Roles,
        View::Users,
        View::Applications,
        View::Logs,
        View::Settings,
        View::Birthdays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Login => "login",
            View::Overview => "overview",
            View::Tickets => "tickets",
            View::Messaging => "messaging",
            View::Moderation => "moderation",
            View::Roles => "roles",
            View::Users => "users",
            View::Applications => "applications",
            View::Logs => "logs",
            View::Settings => "settings",
            View::Birthdays => "birthdays",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Session {
    account: Option<Account>,
    selected_guild: Option<RecordId>,
    view: View,
    authenticated: bool,
    prefs: PreferencesStorage,
}

impl Session {
    /// Start signed out, with the remembered guild preselected
    pub fn new(prefs: PreferencesStorage) -> Self {
        Self {
            account: None,
            selected_guild: prefs.guild_id().cloned(),
            view: View::Login,
            authenticated: false,
            prefs,
        }
    }

    pub fn user(&self) -> Option<&AccountUser> {
        self.account.as_ref().map(|a| &a.user)
    }

    pub fn guilds(&self) -> &[Guild] {
        self.account
            .as_ref()
            .map(|a| a.guilds.as_slice())
            .unwrap_or(&[])
    }

    pub fn guild(&self, id: &RecordId) -> Option<&Guild> {
        self.guilds().iter().find(|g| &g.id == id)
    }

    pub fn selected_guild(&self) -> Option<&RecordId> {
        self.selected_guild.as_ref()
    }

    /// Selected guild, or [`ConsoleError::GuildMissing`]
    pub fn require_guild(&self) -> Result<&RecordId> {
        self.selected_guild.as_ref().ok_or(ConsoleError::GuildMissing)
    }

    /// Whether `id` may be selected. Anything goes until the account is known.
    pub fn can_select(&self, id: &RecordId) -> bool {
        self.account.is_none() || self.guild(id).is_some()
    }

    pub fn select_guild(&mut self, id: RecordId) {
        tracing::info!(guild = %id, "guild selected");
        self.prefs.remember_guild(id.clone());
        self.selected_guild = Some(id);
    }

    /// Store the account from `GET /api/me`.
    ///
    /// Keeps the selected guild when the operator may still manage it and
    /// drops it otherwise. Returns the selection if it is newly made.
    pub fn set_account(&mut self, account: Account) -> Option<RecordId> {
        let previous = self.selected_guild.take();
        let allowed = |id: &RecordId| account.guilds.iter().any(|g| &g.id == id);
        let selected = previous.clone().filter(|id| allowed(id)).or_else(|| {
            self.prefs
                .guild_id()
                .filter(|id| allowed(id))
                .cloned()
        });

        self.account = Some(account);
        self.authenticated = true;
        if self.view == View::Login {
            self.view = View::Overview;
        }

        match selected {
            Some(id) => {
                self.selected_guild = Some(id.clone());
                (previous.as_ref() != Some(&id)).then_some(id)
            }
            None => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Credential rejected or missing: back to the login view
    pub fn mark_unauthenticated(&mut self) {
        self.authenticated = false;
        self.view = View::Login;
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn show(&mut self, view: View) {
        self.view = view;
    }
}

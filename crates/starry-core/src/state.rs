use std::collections::HashMap;
use std::fmt;

use crate::config::Limits;
use crate::models::{
    Birthday, ConfigBlob, GlobalSummary, GuildSummary, LiveUser, RecordId, Snippet, UserMatch,
};
use crate::notifications::{Notification, NotificationQueue};
use crate::preferences::PreferencesStorage;
use crate::session::Session;
use crate::store::{CacheStore, LogList};
use crate::streaming::LiveFeed;

/// The two backend-owned JSON documents an operator can edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    ApplicationsConfig,
    Overrides,
}

impl BlobKind {
    pub fn label(&self) -> &'static str {
        match self {
            BlobKind::ApplicationsConfig => "Applications config",
            BlobKind::Overrides => "Settings overrides",
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the console shows. Only the runtime mutates it.
#[derive(Debug)]
pub struct ConsoleState {
    pub session: Session,
    pub store: CacheStore,
    /// Rendered log list (bulk rows plus live pushes)
    pub logs: LogList,
    pub feed: LiveFeed,
    pub notifications: NotificationQueue,
    pub limits: Limits,

    pub global_summary: Option<GlobalSummary>,
    pub guild_summary: Option<(RecordId, GuildSummary)>,
    pub birthdays: Vec<Birthday>,

    /// Last loaded blob per kind, with the guild it was loaded for
    blobs: HashMap<BlobKind, (RecordId, ConfigBlob)>,
    /// Editor text, as last loaded or prettified
    drafts: HashMap<BlobKind, String>,
}

impl ConsoleState {
    pub fn new(prefs: PreferencesStorage, limits: Limits) -> Self {
        Self {
            session: Session::new(prefs),
            store: CacheStore::new(),
            logs: LogList::new(),
            feed: LiveFeed::new(),
            notifications: NotificationQueue::new(),
            limits,
            global_summary: None,
            guild_summary: None,
            birthdays: Vec::new(),
            blobs: HashMap::new(),
            drafts: HashMap::new(),
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Blob of the selected guild, if loaded
    pub fn blob(&self, kind: BlobKind) -> Option<&ConfigBlob> {
        let selected = self.session.selected_guild()?;
        self.blobs
            .get(&kind)
            .filter(|(guild, _)| guild == selected)
            .map(|(_, blob)| blob)
    }

    /// Store a freshly loaded blob and reset its editor text
    pub fn set_blob(&mut self, kind: BlobKind, guild: RecordId, blob: ConfigBlob) {
        self.drafts.insert(kind, blob.to_pretty());
        self.blobs.insert(kind, (guild, blob));
    }

    pub fn draft(&self, kind: BlobKind) -> Option<&str> {
        self.drafts.get(&kind).map(String::as_str)
    }

    pub fn set_draft(&mut self, kind: BlobKind, text: String) {
        self.drafts.insert(kind, text);
    }

    /// Member search results for the selected guild
    pub fn user_matches(&self) -> &[UserMatch] {
        self.store.get::<UserMatch>()
    }

    /// Drop everything loaded for the previous guild. In-flight guild
    /// fetches for live users and member search are superseded.
    pub fn clear_guild_data(&mut self) {
        self.guild_summary = None;
        self.blobs.clear();
        self.drafts.clear();
        self.store.reset::<LiveUser>();
        self.store.reset::<UserMatch>();
    }

    /// Guild summary, if it belongs to the selected guild
    pub fn current_guild_summary(&self) -> Option<&GuildSummary> {
        let selected = self.session.selected_guild()?;
        self.guild_summary
            .as_ref()
            .filter(|(guild, _)| guild == selected)
            .map(|(_, summary)| summary)
    }

    /// Canned ticket replies from the loaded settings overrides
    pub fn snippets(&self) -> Vec<Snippet> {
        self.blob(BlobKind::Overrides)
            .map(ConfigBlob::snippets)
            .unwrap_or_default()
    }
}

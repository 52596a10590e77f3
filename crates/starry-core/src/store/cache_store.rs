//! Last-fetched snapshot of every server collection.
//!
//! Each resource kind holds exactly one current snapshot, swapped wholesale.
//! Fetches are tagged with a per-kind sequence number so a slow response
//! issued before a newer reload cannot overwrite fresher data.

use std::fmt;

use crate::filter::{render_into, visible_rows, FilterQuery, RenderTarget};
use crate::models::{Application, LiveUser, LogEvent, Ticket, UserMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tickets,
    Applications,
    LiveUsers,
    Logs,
    UserMatches,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::Applications => "applications",
            Self::LiveUsers => "live users",
            Self::Logs => "logs",
            Self::UserMatches => "user matches",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one issued fetch for a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken {
    pub kind: ResourceKind,
    pub seq: u64,
}

/// One resource's snapshot plus its fetch bookkeeping
#[derive(Debug, Clone)]
pub struct Slot<T> {
    items: Vec<T>,
    latest_issued: u64,
    loaded: bool,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            latest_issued: 0,
            loaded: false,
        }
    }
}

/// Row types the store keeps a snapshot of
pub trait CachedResource: Sized {
    const KIND: ResourceKind;

    fn slot(store: &CacheStore) -> &Slot<Self>;
    fn slot_mut(store: &mut CacheStore) -> &mut Slot<Self>;
}

macro_rules! cached_resource {
    ($ty:ty, $kind:expr, $field:ident) => {
        impl CachedResource for $ty {
            const KIND: ResourceKind = $kind;

            fn slot(store: &CacheStore) -> &Slot<Self> {
                &store.$field
            }

            fn slot_mut(store: &mut CacheStore) -> &mut Slot<Self> {
                &mut store.$field
            }
        }
    };
}

cached_resource!(Ticket, ResourceKind::Tickets, tickets);
cached_resource!(Application, ResourceKind::Applications, applications);
cached_resource!(LiveUser, ResourceKind::LiveUsers, live_users);
cached_resource!(LogEvent, ResourceKind::Logs, logs);
cached_resource!(UserMatch, ResourceKind::UserMatches, user_matches);

/// Explicit store object owned by the runtime. `replace` is the only way
/// collections change.
#[derive(Debug, Default)]
pub struct CacheStore {
    tickets: Slot<Ticket>,
    applications: Slot<Application>,
    live_users: Slot<LiveUser>,
    logs: Slot<LogEvent>,
    user_matches: Slot<UserMatch>,

    ticket_query: FilterQuery,
    application_query: FilterQuery,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Snapshots =====

    /// Last snapshot, or an empty slice if never loaded
    pub fn get<T: CachedResource>(&self) -> &[T] {
        &T::slot(self).items
    }

    pub fn is_loaded<T: CachedResource>(&self) -> bool {
        T::slot(self).loaded
    }

    /// Swap the whole collection; last call wins
    pub fn replace<T: CachedResource>(&mut self, items: Vec<T>) {
        let slot = T::slot_mut(self);
        slot.items = items;
        slot.loaded = true;
    }

    /// Register a new fetch for `T`, superseding every earlier one
    pub fn begin_fetch<T: CachedResource>(&mut self) -> FetchToken {
        let slot = T::slot_mut(self);
        slot.latest_issued += 1;
        FetchToken {
            kind: T::KIND,
            seq: slot.latest_issued,
        }
    }

    /// Empty the snapshot and supersede every fetch still in flight
    pub fn reset<T: CachedResource>(&mut self) {
        let slot = T::slot_mut(self);
        slot.items.clear();
        slot.loaded = false;
        slot.latest_issued += 1;
    }

    pub fn latest_token(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Tickets => self.tickets.latest_issued,
            ResourceKind::Applications => self.applications.latest_issued,
            ResourceKind::LiveUsers => self.live_users.latest_issued,
            ResourceKind::Logs => self.logs.latest_issued,
            ResourceKind::UserMatches => self.user_matches.latest_issued,
        }
    }

    pub fn is_current(&self, token: FetchToken) -> bool {
        token.seq == self.latest_token(token.kind)
    }

    /// Apply a fetch result only if no newer fetch of the same kind was
    /// issued since. Returns whether the snapshot changed.
    pub fn replace_if_current<T: CachedResource>(
        &mut self,
        token: FetchToken,
        items: Vec<T>,
    ) -> bool {
        let kind = T::KIND;
        if token.kind != kind || !self.is_current(token) {
            tracing::debug!(
                kind = %kind,
                seq = token.seq,
                latest = self.latest_token(kind),
                "discarding superseded fetch result"
            );
            return false;
        }
        self.replace(items);
        true
    }

    // ===== Queries =====

    pub fn ticket_query(&self) -> &FilterQuery {
        &self.ticket_query
    }

    pub fn application_query(&self) -> &FilterQuery {
        &self.application_query
    }

    pub fn set_ticket_query(&mut self, query: FilterQuery) {
        self.ticket_query = query;
    }

    pub fn set_application_query(&mut self, query: FilterQuery) {
        self.application_query = query;
    }

    // ===== Derived views =====

    pub fn visible_tickets(&self) -> Vec<&Ticket> {
        visible_rows(self.get::<Ticket>(), &self.ticket_query)
    }

    pub fn visible_applications(&self) -> Vec<&Application> {
        visible_rows(self.get::<Application>(), &self.application_query)
    }

    pub fn render_tickets<R: RenderTarget<Ticket>>(&self, target: &mut R) -> usize {
        render_into(target, self.get::<Ticket>(), &self.ticket_query)
    }

    pub fn render_applications<R: RenderTarget<Application>>(&self, target: &mut R) -> usize {
        render_into(target, self.get::<Application>(), &self.application_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RenderedList;
    use crate::models::{RecordId, TicketStatus};

    fn ticket(id: u64, status: TicketStatus) -> Ticket {
        Ticket {
            id: RecordId::from(id),
            user_id: RecordId::from(id + 100),
            thread_id: RecordId::from(id + 200),
            status,
            claimed_by: None,
            rating: None,
            created_at: None,
            closed_at: None,
        }
    }

    #[test]
    fn test_empty_until_loaded() {
        let store = CacheStore::new();
        assert!(store.get::<Ticket>().is_empty());
        assert!(store.get::<LiveUser>().is_empty());
        assert!(!store.is_loaded::<Ticket>());
    }

    #[test]
    fn test_replace_swaps_whole_collection() {
        let mut store = CacheStore::new();
        store.replace(vec![ticket(1, TicketStatus::Open), ticket(2, TicketStatus::Open)]);
        store.replace(vec![ticket(3, TicketStatus::Closed)]);
        let ids: Vec<&str> = store.get::<Ticket>().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
        assert!(store.is_loaded::<Ticket>());
        // Other kinds untouched
        assert!(!store.is_loaded::<Application>());
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut store = CacheStore::new();
        let slow = store.begin_fetch::<Ticket>();
        let fresh = store.begin_fetch::<Ticket>();

        assert!(store.replace_if_current(fresh, vec![ticket(2, TicketStatus::Open)]));
        // The earlier request lands late
        assert!(!store.replace_if_current(slow, vec![ticket(1, TicketStatus::Open)]));

        assert_eq!(store.get::<Ticket>()[0].id.as_str(), "2");
    }

    #[test]
    fn test_reset_supersedes_in_flight_fetch() {
        let mut store = CacheStore::new();
        let earlier = store.begin_fetch::<UserMatch>();
        store.replace(vec![UserMatch {
            id: RecordId::from(7),
            name: None,
            display_name: "mia".to_string(),
        }]);

        store.reset::<UserMatch>();
        assert!(store.get::<UserMatch>().is_empty());
        assert!(!store.is_loaded::<UserMatch>());
        assert!(!store.replace_if_current(earlier, Vec::<UserMatch>::new()));
    }

    #[test]
    fn test_tokens_are_per_kind() {
        let mut store = CacheStore::new();
        let tickets = store.begin_fetch::<Ticket>();
        let _apps = store.begin_fetch::<Application>();
        assert!(store.is_current(tickets));
        assert!(store.replace_if_current(tickets, vec![ticket(1, TicketStatus::Open)]));
    }

    #[test]
    fn test_query_drives_visible_rows_without_refetch() {
        let mut store = CacheStore::new();
        store.replace(vec![ticket(1, TicketStatus::Open), ticket(2, TicketStatus::Closed)]);

        store.set_ticket_query(FilterQuery::status("closed"));
        assert_eq!(store.visible_tickets().len(), 1);

        store.set_ticket_query(FilterQuery::default());
        let mut target = RenderedList::new();
        assert_eq!(store.render_tickets(&mut target), 2);
    }

    #[test]
    fn test_new_snapshot_drops_stale_rows_from_view() {
        let mut store = CacheStore::new();
        store.set_ticket_query(FilterQuery::status("open"));
        store.replace(vec![ticket(1, TicketStatus::Open)]);
        assert_eq!(store.visible_tickets().len(), 1);
        store.replace(vec![ticket(1, TicketStatus::Closed)]);
        assert!(store.visible_tickets().is_empty());
    }
}

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::{decode_body, ApiClient};
use crate::commands::{self, Action, Effect, OnResponse, Plan, RequestEffect};
use crate::config::{ConsoleConfig, Credential};
use crate::error::{ConsoleError, Result};
use crate::events::ConsoleEvent;
use crate::models::{
    Account, Application, BirthdayPage, ConfigBlob, GlobalSummary, GuildSummary, LiveUser,
    LogEvent, Ticket, UserMatch,
};
use crate::notifications::Notification;
use crate::preferences::PreferencesStorage;
use crate::state::ConsoleState;
use crate::store::{CachedResource, FetchToken};
use crate::streaming::{FeedOutcome, FeedSignal, FeedState, LogSocketClient};

/// A request that has been spawned and not yet answered
#[derive(Debug)]
struct PendingRequest {
    then: OnResponse,
    token: Option<FetchToken>,
    follow_up: Vec<Action>,
    announce: Option<String>,
    description: String,
}

/// Whether a response still described the current data
enum Applied {
    Current(Vec<Action>),
    Superseded,
}

/// What handling one queued event did
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// A request finished and its outcome was applied or reported
    Response { request: String, ok: bool },
    /// Completion for a request this runtime no longer tracks
    Unknown,
    Feed(FeedOutcome),
}

/// Owns the console state and the single event queue every completion
/// arrives on. All state mutation happens here.
pub struct ConsoleRuntime {
    client: ApiClient,
    state: ConsoleState,
    events_tx: mpsc::UnboundedSender<ConsoleEvent>,
    events_rx: mpsc::UnboundedReceiver<ConsoleEvent>,
    pending: HashMap<u64, PendingRequest>,
    next_request_id: u64,
}

impl ConsoleRuntime {
    pub fn new(client: ApiClient, state: ConsoleState) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            client,
            state,
            events_tx,
            events_rx,
            pending: HashMap::new(),
            next_request_id: 1,
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let client = ApiClient::from_config(config)?;
        let prefs = PreferencesStorage::new(&config.data_dir());
        Ok(Self::new(
            client,
            ConsoleState::new(prefs, config.limits.clone()),
        ))
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConsoleState {
        &mut self.state
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.client.set_credential(credential);
    }

    /// Requests spawned and not yet applied
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Plan `action` and execute the result. Failures become notifications.
    pub fn dispatch(&mut self, action: Action) {
        tracing::debug!(?action, "dispatch");
        match commands::plan(&self.state, action) {
            Ok(plan) => self.execute(plan),
            Err(err) => self.report(err),
        }
    }

    fn execute(&mut self, plan: Plan) {
        for effect in plan.effects {
            match effect {
                Effect::SelectGuild(guild) => {
                    self.state.session.select_guild(guild);
                    self.state.clear_guild_data();
                }
                Effect::ShowView(view) => self.state.session.show(view),
                Effect::SetTicketQuery(query) => self.state.store.set_ticket_query(query),
                Effect::SetApplicationQuery(query) => {
                    self.state.store.set_application_query(query)
                }
                Effect::SetDraft(kind, text) => self.state.set_draft(kind, text),
                Effect::Request(request) => self.spawn_request(request),
                Effect::ConnectFeed => self.connect_feed(),
                Effect::Notify(notification) => self.state.notify(notification),
            }
        }
    }

    fn begin_fetch<T: CachedResource>(&mut self) -> Option<FetchToken> {
        Some(self.state.store.begin_fetch::<T>())
    }

    fn spawn_request(&mut self, effect: RequestEffect) {
        let RequestEffect {
            request,
            then,
            follow_up,
            announce,
        } = effect;

        let token = match then {
            OnResponse::Tickets => self.begin_fetch::<Ticket>(),
            OnResponse::Applications => self.begin_fetch::<Application>(),
            OnResponse::LiveUsers => self.begin_fetch::<LiveUser>(),
            OnResponse::Logs => self.begin_fetch::<LogEvent>(),
            OnResponse::UserMatches => self.begin_fetch::<UserMatch>(),
            _ => None,
        };

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending.insert(
            request_id,
            PendingRequest {
                then,
                token,
                follow_up,
                announce,
                description: request.describe(),
            },
        );

        let client = self.client.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = client.send(&request).await;
            // Receiver only goes away with the runtime itself
            let _ = events_tx.send(ConsoleEvent::Response {
                request_id,
                outcome,
            });
        });
    }

    fn connect_feed(&mut self) {
        if !self.client.has_credential() {
            self.report(ConsoleError::Auth { status: None });
            return;
        }
        let Some(generation) = self.state.feed.connect() else {
            return;
        };
        match LogSocketClient::new(self.client.base_url(), self.client.credential(), generation) {
            Ok(socket) => {
                tracing::info!(generation, "connecting live log feed");
                self.state
                    .notify(Notification::info("Live log feed connecting"));
                tokio::spawn(socket.run(self.events_tx.clone()));
            }
            Err(err) => {
                self.state.feed.on_error(generation, err.to_string());
                self.report(err);
            }
        }
    }

    fn report(&mut self, err: ConsoleError) {
        if err.is_auth() {
            self.state.session.mark_unauthenticated();
        }
        self.state.notify(Notification::from(&err));
    }

    /// Apply one queued event
    pub fn handle_event(&mut self, event: ConsoleEvent) -> Handled {
        match event {
            ConsoleEvent::Response {
                request_id,
                outcome,
            } => self.handle_response(request_id, outcome),
            ConsoleEvent::Feed(signal) => Handled::Feed(self.handle_feed(signal)),
        }
    }

    fn handle_response(
        &mut self,
        request_id: u64,
        outcome: Result<Option<Value>>,
    ) -> Handled {
        let Some(pending) = self.pending.remove(&request_id) else {
            return Handled::Unknown;
        };
        let PendingRequest {
            then,
            token,
            follow_up,
            announce,
            description,
        } = pending;

        let applied = outcome.and_then(|body| self.apply_response(&then, token, body));
        match applied {
            Ok(Applied::Current(more)) => {
                if let Some(message) = announce {
                    self.state.notify(Notification::success(message));
                }
                for action in follow_up.into_iter().chain(more) {
                    self.dispatch(action);
                }
                Handled::Response {
                    request: description,
                    ok: true,
                }
            }
            Ok(Applied::Superseded) => {
                tracing::debug!(request = %description, "response superseded");
                Handled::Response {
                    request: description,
                    ok: true,
                }
            }
            Err(err) if !err.is_auth() && self.is_superseded(&then, token) => {
                tracing::debug!(request = %description, error = %err, "superseded request failed");
                Handled::Response {
                    request: description,
                    ok: false,
                }
            }
            Err(err) => {
                tracing::warn!(request = %description, error = %err, "request failed");
                self.report(err);
                Handled::Response {
                    request: description,
                    ok: false,
                }
            }
        }
    }

    /// Whether a newer fetch or a guild switch made this response irrelevant
    fn is_superseded(&self, then: &OnResponse, token: Option<FetchToken>) -> bool {
        if let Some(token) = token {
            if !self.state.store.is_current(token) {
                return true;
            }
        }
        match then {
            OnResponse::GuildSummary(guild) | OnResponse::Blob(_, guild) => {
                self.state.session.selected_guild() != Some(guild)
            }
            _ => false,
        }
    }

    fn apply_response(
        &mut self,
        then: &OnResponse,
        token: Option<FetchToken>,
        body: Option<Value>,
    ) -> Result<Applied> {
        let state = &mut self.state;
        match then {
            OnResponse::Account { start_session } => {
                let account: Account = decode_body(body)?;
                state.session.set_account(account);
                let mut more = Vec::new();
                if *start_session {
                    more.push(Action::RefreshGlobalSummary);
                    if state.session.selected_guild().is_some() {
                        more.push(Action::RefreshGuild);
                    }
                }
                Ok(Applied::Current(more))
            }
            OnResponse::GlobalSummary => {
                let summary: GlobalSummary = decode_body(body)?;
                state.global_summary = Some(summary);
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::GuildSummary(guild) => {
                let summary: GuildSummary = decode_body(body)?;
                if state.session.selected_guild() != Some(guild) {
                    return Ok(Applied::Superseded);
                }
                state.guild_summary = Some((guild.clone(), summary));
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::Tickets => replace_rows::<Ticket>(state, token, body),
            OnResponse::Applications => replace_rows::<Application>(state, token, body),
            OnResponse::LiveUsers => replace_rows::<LiveUser>(state, token, body),
            OnResponse::Logs => {
                let rows: Vec<LogEvent> = decode_body(body)?;
                let Some(token) = token else {
                    return Ok(Applied::Superseded);
                };
                if !state.store.replace_if_current(token, rows.clone()) {
                    return Ok(Applied::Superseded);
                }
                state.logs.bulk_load(rows);
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::Blob(kind, guild) => {
                let blob = match body {
                    Some(value) => ConfigBlob::from_value(value).map_err(ConsoleError::decode)?,
                    None => ConfigBlob::default(),
                };
                if state.session.selected_guild() != Some(guild) {
                    return Ok(Applied::Superseded);
                }
                state.set_blob(*kind, guild.clone(), blob);
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::BlobSaved(kind, guild) => {
                state.notify(Notification::success(format!("{} saved", kind)));
                // No reload once another guild is selected
                if state.session.selected_guild() != Some(guild) {
                    return Ok(Applied::Superseded);
                }
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::UserMatches => {
                let matches: Vec<UserMatch> = decode_body(body)?;
                let empty = matches.is_empty();
                let Some(token) = token else {
                    return Ok(Applied::Superseded);
                };
                if !state.store.replace_if_current(token, matches) {
                    return Ok(Applied::Superseded);
                }
                if empty {
                    state.notify(Notification::info("No matching users"));
                }
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::Birthdays => {
                let page: BirthdayPage = decode_body(body)?;
                state.birthdays = page.items;
                Ok(Applied::Current(Vec::new()))
            }
            OnResponse::FormSubmitted(form) => {
                state.notify(Notification::success(form.success_message(body.as_ref())));
                Ok(Applied::Current(Vec::new()))
            }
        }
    }

    fn handle_feed(&mut self, signal: FeedSignal) -> FeedOutcome {
        let state = &mut self.state;
        let outcome = state.feed.apply(signal, &mut state.logs);
        match &outcome {
            FeedOutcome::State(FeedState::Connected) => {
                state.notify(Notification::success("Live log feed connected"));
            }
            FeedOutcome::State(FeedState::Disconnected) => {
                state.notify(Notification::warning("Live log feed disconnected"));
            }
            FeedOutcome::Failed(message) => {
                state.notify(Notification::error(format!("Live log feed: {}", message)));
            }
            _ => {}
        }
        outcome
    }

    /// Process completions until no request is in flight
    pub async fn settle(&mut self) {
        while !self.pending.is_empty() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.handle_event(event);
        }
    }

    /// Wait for and apply the next queued event
    pub async fn next_event(&mut self) -> Option<Handled> {
        let event = self.events_rx.recv().await?;
        Some(self.handle_event(event))
    }
}

fn replace_rows<T>(
    state: &mut ConsoleState,
    token: Option<FetchToken>,
    body: Option<Value>,
) -> Result<Applied>
where
    T: CachedResource + serde::de::DeserializeOwned,
{
    let rows: Vec<T> = decode_body(body)?;
    match token {
        Some(token) if state.store.replace_if_current(token, rows) => {
            Ok(Applied::Current(Vec::new()))
        }
        _ => Ok(Applied::Superseded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::forms::{GuildForm, PurgeForm, TicketActionForm};
    use crate::config::Limits;
    use crate::filter::FilterQuery;
    use crate::models::RecordId;
    use crate::notifications::NotificationLevel;
    use crate::session::View;
    use crate::state::BlobKind;
    use crate::test_support::spawn_backend;
    use axum::extract::ws::{Message, WebSocketUpgrade};
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use reqwest::Url;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn runtime(base: Url) -> ConsoleRuntime {
        let client = ApiClient::new(base, Some(Credential::Bearer("t".to_string())));
        let state = ConsoleState::new(PreferencesStorage::in_memory(), Limits::default());
        ConsoleRuntime::new(client, state)
    }

    fn ticket_json(id: u64, status: &str) -> Value {
        json!({"id": id, "user_id": id + 100, "thread_id": id + 200, "status": status})
    }

    fn messages(rt: &mut ConsoleRuntime) -> Vec<String> {
        rt.state_mut()
            .notifications
            .drain()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_guild_fills_every_collection() {
        let app = Router::new()
            .route(
                "/api/guilds/7/summary",
                get(|| async { Json(json!({"tickets": {"open": 1, "total": 2}})) }),
            )
            .route(
                "/api/guilds/7/tickets",
                get(|| async { Json(json!([ticket_json(1, "open"), ticket_json(2, "closed")])) }),
            )
            .route(
                "/api/guilds/7/applications",
                get(|| async { Json(json!({"enabled": true})) }),
            )
            .route(
                "/api/guilds/7/applications/list",
                get(|| async {
                    Json(json!([{"id": 5, "user_id": 6, "thread_id": 7, "status": "pending"}]))
                }),
            );
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(7));

        rt.dispatch(Action::RefreshGuild);
        assert_eq!(rt.in_flight(), 4);
        rt.settle().await;

        let state = rt.state();
        assert_eq!(state.store.get::<Ticket>().len(), 2);
        assert_eq!(state.store.get::<Application>().len(), 1);
        assert_eq!(state.current_guild_summary().unwrap().tickets.open, 1);
        assert!(state.blob(BlobKind::ApplicationsConfig).is_some());
        assert!(!state.notifications.has_errors());
    }

    #[tokio::test]
    async fn test_unauthorized_leaves_store_untouched() {
        let app = Router::new().route(
            "/api/guilds/1/tickets",
            get(|| async { (StatusCode::UNAUTHORIZED, "expired") }),
        );
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(1));
        rt.state_mut().session.show(View::Tickets);
        let before: Vec<Ticket> =
            serde_json::from_value(json!([ticket_json(9, "open")])).unwrap();
        rt.state_mut().store.replace(before.clone());

        rt.dispatch(Action::ReloadTickets);
        rt.settle().await;

        assert_eq!(rt.state().store.get::<Ticket>(), before.as_slice());
        assert_eq!(rt.state().session.view(), View::Login);
        assert_eq!(messages(&mut rt), vec!["Not authenticated (status 401)"]);
    }

    #[tokio::test]
    async fn test_stale_ticket_fetch_is_discarded() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/guilds/1/tickets",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        Json(json!([ticket_json(1, "open")]))
                    } else {
                        Json(json!([ticket_json(2, "open")]))
                    }
                }),
            )
            .with_state(hits.clone());
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(1));

        rt.dispatch(Action::ReloadTickets);
        while hits.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        rt.dispatch(Action::ReloadTickets);
        rt.settle().await;

        let ids: Vec<&str> = rt
            .state()
            .store
            .get::<Ticket>()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[tokio::test]
    async fn test_slow_blob_of_previous_guild_is_discarded() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/guilds/:guild/summary",
                get(|| async { Json(json!({"tickets": {"open": 0}})) }),
            )
            .route("/api/guilds/:guild/tickets", get(|| async { Json(json!([])) }))
            .route(
                "/api/guilds/:guild/applications/list",
                get(|| async { Json(json!([])) }),
            )
            .route(
                "/api/guilds/:guild/applications",
                get(
                    |State(hits): State<Arc<AtomicUsize>>, Path(guild): Path<u64>| async move {
                        if guild == 1 {
                            hits.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(300)).await;
                        }
                        Json(json!({ "guild": guild }))
                    },
                ),
            )
            .with_state(hits.clone());
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(1));

        rt.dispatch(Action::RefreshGuild);
        while hits.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        rt.dispatch(Action::SelectGuild(RecordId::from(2)));
        rt.settle().await;

        let state = rt.state();
        assert_eq!(state.session.selected_guild(), Some(&RecordId::from(2)));
        assert_eq!(
            state.blob(BlobKind::ApplicationsConfig).map(ConfigBlob::to_value),
            Some(json!({"guild": 2}))
        );
        assert!(state
            .draft(BlobKind::ApplicationsConfig)
            .unwrap()
            .contains("\"guild\": 2"));
        assert!(!state.notifications.has_errors());
    }

    #[tokio::test]
    async fn test_superseded_failure_is_not_reported() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/guilds/1/tickets",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "slow"})))
                    } else {
                        (StatusCode::OK, Json(json!([ticket_json(2, "open")])))
                    }
                }),
            )
            .with_state(hits.clone());
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(1));

        rt.dispatch(Action::ReloadTickets);
        while hits.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        rt.dispatch(Action::ReloadTickets);
        rt.settle().await;

        assert_eq!(rt.state().store.get::<Ticket>()[0].id.as_str(), "2");
        assert!(!rt.state().notifications.has_errors());
        assert_eq!(messages(&mut rt), vec!["Tickets loaded"]);
    }

    #[tokio::test]
    async fn test_earlier_user_search_cannot_overwrite_newer() {
        let app = Router::new().route(
            "/api/guilds/1/users/search",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let query = q.get("query").cloned().unwrap_or_default();
                if query == "slow" {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }
                Json(json!([{ "id": 1, "display_name": query }]))
            }),
        );
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(1));

        rt.dispatch(Action::SearchUsers("slow".to_string()));
        rt.dispatch(Action::SearchUsers("fast".to_string()));
        rt.settle().await;

        let names: Vec<&str> = rt
            .state()
            .user_matches()
            .iter()
            .map(|m| m.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["fast"]);
    }

    #[tokio::test]
    async fn test_ticket_action_refreshes_tickets_and_summary() {
        let app = Router::new()
            .route(
                "/api/guilds/3/tickets/action",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["thread_id"], "44");
                    StatusCode::NO_CONTENT
                }),
            )
            .route(
                "/api/guilds/3/tickets",
                get(|| async { Json(json!([ticket_json(44, "closed")])) }),
            )
            .route(
                "/api/guilds/3/summary",
                get(|| async { Json(json!({"tickets": {"closed": 1}})) }),
            );
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(3));

        rt.dispatch(Action::SubmitForm(GuildForm::TicketAction(TicketActionForm {
            thread_id: " 44 ".to_string(),
            actor_id: "1".to_string(),
            action: "close".to_string(),
            ..Default::default()
        })));
        rt.settle().await;

        assert_eq!(rt.state().store.get::<Ticket>().len(), 1);
        assert_eq!(rt.state().current_guild_summary().unwrap().tickets.closed, 1);
        let notices = messages(&mut rt);
        assert_eq!(notices[0], "Ticket action executed");
        assert!(notices.contains(&"Tickets loaded".to_string()));
    }

    #[tokio::test]
    async fn test_purge_reports_deleted() {
        let app = Router::new().route(
            "/api/guilds/3/moderation/purge",
            post(|| async { Json(json!({"ok": true, "deleted": 3})) }),
        );
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(3));
        rt.dispatch(Action::SubmitForm(GuildForm::Purge(PurgeForm {
            channel_id: "1".to_string(),
            amount: "3".to_string(),
            ..Default::default()
        })));
        rt.settle().await;
        assert_eq!(messages(&mut rt), vec!["Purge: 3"]);
    }

    #[tokio::test]
    async fn test_invalid_settings_never_reach_the_backend() {
        let puts = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/guilds/1/overrides",
                get(|| async { Json(json!({})) }).put(
                    |State(puts): State<Arc<AtomicUsize>>| async move {
                        puts.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NO_CONTENT
                    },
                ),
            )
            .with_state(puts.clone());
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(1));

        rt.dispatch(Action::SaveOverrides("{\"ticket\": ".to_string()));
        assert_eq!(rt.in_flight(), 0);
        rt.settle().await;
        assert_eq!(puts.load(Ordering::SeqCst), 0);
        assert!(messages(&mut rt)[0].starts_with("Invalid input: invalid JSON"));

        rt.dispatch(Action::SaveOverrides(r#"{"ticket": {"snippets": {}}}"#.to_string()));
        rt.settle().await;
        assert_eq!(puts.load(Ordering::SeqCst), 1);
        assert_eq!(
            messages(&mut rt),
            vec!["Settings overrides saved", "Overrides loaded"]
        );
    }

    #[tokio::test]
    async fn test_missing_guild_is_reported_without_requests() {
        let mut rt = runtime(Url::parse("http://127.0.0.1:9/").unwrap());
        rt.dispatch(Action::ReloadTickets);
        assert_eq!(rt.in_flight(), 0);
        let notices = rt.state_mut().notifications.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NotificationLevel::Error);
        assert_eq!(notices[0].message, "No guild selected");
    }

    #[tokio::test]
    async fn test_start_session_selects_remembered_guild() {
        let app = Router::new()
            .route(
                "/api/me",
                get(|| async {
                    Json(json!({
                        "user": {"id": 1, "username": "mod"},
                        "guilds": [{"id": 5, "name": "Starry"}]
                    }))
                }),
            )
            .route("/api/global/summary", get(|| async { Json(json!({"birthdays": 4})) }))
            .route("/api/guilds/5/summary", get(|| async { Json(json!({})) }))
            .route("/api/guilds/5/tickets", get(|| async { Json(json!([])) }))
            .route("/api/guilds/5/applications", get(|| async { Json(json!({})) }))
            .route("/api/guilds/5/applications/list", get(|| async { Json(json!([])) }));
        let mut rt = runtime(spawn_backend(app).await);
        rt.state_mut().session.select_guild(RecordId::from(5));

        rt.dispatch(Action::StartSession);
        rt.settle().await;

        let state = rt.state();
        assert_eq!(state.session.view(), View::Overview);
        assert_eq!(state.session.user().unwrap().username, "mod");
        assert_eq!(state.global_summary.as_ref().unwrap().birthdays, 4);
        assert!(state.store.is_loaded::<Ticket>());
        assert!(state.current_guild_summary().is_some());
    }

    #[tokio::test]
    async fn test_bulk_logs_then_live_pushes() {
        let app = Router::new()
            .route(
                "/api/logs",
                get(|| async { Json(json!([{"id": 1, "event": "bulk"}])) }),
            )
            .route(
                "/ws/logs",
                get(|ws: WebSocketUpgrade| async move {
                    ws.on_upgrade(|mut socket| async move {
                        socket.send(Message::Text("not json".to_string())).await.ok();
                        socket
                            .send(Message::Text(r#"{"id": 2, "event": "live"}"#.to_string()))
                            .await
                            .ok();
                        // Hold the socket open until the client goes away
                        while let Some(Ok(_)) = socket.recv().await {}
                    })
                }),
            );
        let mut rt = runtime(spawn_backend(app).await);

        rt.dispatch(Action::ReloadLogs);
        rt.settle().await;
        assert_eq!(rt.state().logs.len(), 1);

        rt.dispatch(Action::ConnectLiveLogs);
        assert_eq!(rt.state().feed.state(), FeedState::Connecting);
        // A second connect while one is pending does nothing
        rt.dispatch(Action::ConnectLiveLogs);

        assert_eq!(
            rt.next_event().await,
            Some(Handled::Feed(FeedOutcome::State(FeedState::Connected)))
        );
        assert_eq!(
            rt.next_event().await,
            Some(Handled::Feed(FeedOutcome::Malformed))
        );
        assert_eq!(rt.state().logs.len(), 1);
        assert_eq!(rt.state().feed.state(), FeedState::Connected);

        assert_eq!(
            rt.next_event().await,
            Some(Handled::Feed(FeedOutcome::Prepended))
        );
        let events: Vec<&str> = rt.state().logs.rows().map(|r| r.event.as_str()).collect();
        assert_eq!(events, vec!["live", "bulk"]);
        // The cached snapshot only ever holds the bulk result
        assert_eq!(rt.state().store.get::<LogEvent>().len(), 1);
    }

    #[tokio::test]
    async fn test_ticket_query_is_applied_locally() {
        let mut rt = runtime(Url::parse("http://127.0.0.1:9/").unwrap());
        let rows: Vec<Ticket> =
            serde_json::from_value(json!([ticket_json(1, "open"), ticket_json(2, "closed")]))
                .unwrap();
        rt.state_mut().store.replace(rows);

        rt.dispatch(Action::SetTicketQuery(FilterQuery::text("2")));
        assert_eq!(rt.in_flight(), 0);
        let visible: Vec<&str> = rt
            .state()
            .store
            .visible_tickets()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(visible, vec!["2"]);
    }
}

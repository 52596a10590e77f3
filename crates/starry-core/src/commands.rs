//! Operator actions and the pure planner that turns them into effects.
//!
//! `plan` only reads state. Everything it wants to happen (mutations, HTTP
//! calls, the feed connect) is returned as a [`Plan`] for the runtime to
//! execute, so every validation failure happens before any request exists.

use crate::api::endpoints;
use crate::api::forms::GuildForm;
use crate::api::ApiRequest;
use crate::config::Limits;
use crate::error::{ConsoleError, Result};
use crate::filter::FilterQuery;
use crate::models::{prettify, ConfigBlob, RecordId};
use crate::notifications::Notification;
use crate::session::View;
use crate::state::{BlobKind, ConsoleState};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Session
    /// Load the account, then the global summary and the selected guild
    StartSession,
    LoadAccount,
    SelectGuild(RecordId),
    ShowView(View),

    // Overview
    RefreshGlobalSummary,
    RefreshGuildSummary,
    /// Summary, tickets, applications config and list, issued together
    RefreshGuild,

    // Tickets
    ReloadTickets,
    SetTicketQuery(FilterQuery),

    /// Ticket action, message, embed, moderation and role forms
    SubmitForm(GuildForm),

    // Applications
    ReloadApplicationsConfig,
    SaveApplicationsConfig(String),
    ReloadApplicationList,
    SetApplicationQuery(FilterQuery),

    // Settings
    ReloadOverrides,
    SaveOverrides(String),
    PrettifyOverrides(String),

    // Users
    SearchUsers(String),
    ReloadLiveUsers,

    // Logs
    ReloadLogs,
    ConnectLiveLogs,

    ReloadBirthdays,
}

/// How a successful response is applied
#[derive(Debug, Clone, PartialEq)]
pub enum OnResponse {
    Account { start_session: bool },
    GlobalSummary,
    GuildSummary(RecordId),
    Tickets,
    Applications,
    LiveUsers,
    Logs,
    /// Blob loaded for the given guild
    Blob(BlobKind, RecordId),
    BlobSaved(BlobKind, RecordId),
    UserMatches,
    Birthdays,
    FormSubmitted(GuildForm),
}

/// One outbound call and what follows it
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEffect {
    pub request: ApiRequest,
    pub then: OnResponse,
    /// Dispatched after the response was applied successfully
    pub follow_up: Vec<Action>,
    /// Success notice
    pub announce: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SelectGuild(RecordId),
    ShowView(View),
    SetTicketQuery(FilterQuery),
    SetApplicationQuery(FilterQuery),
    SetDraft(BlobKind, String),
    Request(RequestEffect),
    ConnectFeed,
    Notify(Notification),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub effects: Vec<Effect>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) -> &mut Self {
        self.effects.push(effect);
        self
    }

    fn request(&mut self, effect: RequestEffect) -> &mut Self {
        self.push(Effect::Request(effect))
    }

    /// Outbound calls in this plan
    pub fn requests(&self) -> impl Iterator<Item = &ApiRequest> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Request(r) => Some(&r.request),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl RequestEffect {
    pub fn new(request: ApiRequest, then: OnResponse) -> Self {
        Self {
            request,
            then,
            follow_up: Vec::new(),
            announce: None,
        }
    }

    fn announce(mut self, message: &str) -> Self {
        self.announce = Some(message.to_string());
        self
    }

    fn then_dispatch(mut self, actions: Vec<Action>) -> Self {
        self.follow_up = actions;
        self
    }
}

fn guild_refresh(plan: &mut Plan, guild: &RecordId, limits: &Limits) {
    plan.request(RequestEffect::new(
        endpoints::guild_summary(guild),
        OnResponse::GuildSummary(guild.clone()),
    ))
    .request(RequestEffect::new(
        endpoints::tickets(guild, limits.tickets),
        OnResponse::Tickets,
    ))
    .request(RequestEffect::new(
        endpoints::applications_config(guild),
        OnResponse::Blob(BlobKind::ApplicationsConfig, guild.clone()),
    ))
    .request(RequestEffect::new(
        endpoints::application_list(guild, limits.applications),
        OnResponse::Applications,
    ));
}

/// Decide what `action` does given the current state
pub fn plan(state: &ConsoleState, action: Action) -> Result<Plan> {
    let limits = &state.limits;
    let session = &state.session;
    let mut plan = Plan::new();

    match action {
        Action::StartSession => {
            plan.request(RequestEffect::new(
                endpoints::me(),
                OnResponse::Account { start_session: true },
            ));
        }
        Action::LoadAccount => {
            plan.request(RequestEffect::new(
                endpoints::me(),
                OnResponse::Account {
                    start_session: false,
                },
            ));
        }
        Action::SelectGuild(guild) => {
            if !session.can_select(&guild) {
                return Err(ConsoleError::validation(format!(
                    "guild {} is not managed by this account",
                    guild
                )));
            }
            plan.push(Effect::SelectGuild(guild.clone()));
            guild_refresh(&mut plan, &guild, limits);
        }
        Action::ShowView(view) => {
            plan.push(Effect::ShowView(view));
        }
        Action::RefreshGlobalSummary => {
            plan.request(
                RequestEffect::new(endpoints::global_summary(), OnResponse::GlobalSummary)
                    .announce("Global summary refreshed"),
            );
        }
        Action::RefreshGuildSummary => {
            let guild = session.require_guild()?;
            plan.request(
                RequestEffect::new(
                    endpoints::guild_summary(guild),
                    OnResponse::GuildSummary(guild.clone()),
                )
                .announce("Guild summary refreshed"),
            );
        }
        Action::RefreshGuild => {
            let guild = session.require_guild()?;
            guild_refresh(&mut plan, guild, limits);
        }
        Action::ReloadTickets => {
            let guild = session.require_guild()?;
            plan.request(
                RequestEffect::new(
                    endpoints::tickets(guild, limits.tickets),
                    OnResponse::Tickets,
                )
                .announce("Tickets loaded"),
            );
        }
        Action::SetTicketQuery(query) => {
            plan.push(Effect::SetTicketQuery(query));
        }
        Action::SubmitForm(form) => {
            let guild = session.require_guild()?;
            let body = form.body()?;
            let follow_up = if form.changes_tickets() {
                vec![Action::ReloadTickets, Action::RefreshGuildSummary]
            } else {
                Vec::new()
            };
            let request = endpoints::guild_post(guild, form.route(), body);
            plan.request(
                RequestEffect::new(request, OnResponse::FormSubmitted(form))
                    .then_dispatch(follow_up),
            );
        }
        Action::ReloadApplicationsConfig => {
            let guild = session.require_guild()?;
            plan.request(
                RequestEffect::new(
                    endpoints::applications_config(guild),
                    OnResponse::Blob(BlobKind::ApplicationsConfig, guild.clone()),
                )
                .announce("Applications config loaded"),
            );
        }
        Action::SaveApplicationsConfig(raw) => {
            let guild = session.require_guild()?;
            let blob = ConfigBlob::parse(&raw)?;
            plan.request(
                RequestEffect::new(
                    endpoints::save_applications_config(guild, &blob),
                    OnResponse::BlobSaved(BlobKind::ApplicationsConfig, guild.clone()),
                )
                .then_dispatch(vec![Action::ReloadApplicationsConfig]),
            );
        }
        Action::ReloadApplicationList => {
            let guild = session.require_guild()?;
            plan.request(
                RequestEffect::new(
                    endpoints::application_list(guild, limits.applications),
                    OnResponse::Applications,
                )
                .announce("Applications refreshed"),
            );
        }
        Action::SetApplicationQuery(query) => {
            plan.push(Effect::SetApplicationQuery(query));
        }
        Action::ReloadOverrides => {
            let guild = session.require_guild()?;
            plan.request(
                RequestEffect::new(
                    endpoints::overrides(guild),
                    OnResponse::Blob(BlobKind::Overrides, guild.clone()),
                )
                .announce("Overrides loaded"),
            );
        }
        Action::SaveOverrides(raw) => {
            let guild = session.require_guild()?;
            let blob = ConfigBlob::parse(&raw)?;
            plan.request(
                RequestEffect::new(
                    endpoints::save_overrides(guild, &blob),
                    OnResponse::BlobSaved(BlobKind::Overrides, guild.clone()),
                )
                .then_dispatch(vec![Action::ReloadOverrides]),
            );
        }
        Action::PrettifyOverrides(raw) => {
            let pretty = prettify(&raw)?;
            plan.push(Effect::SetDraft(BlobKind::Overrides, pretty))
                .push(Effect::Notify(Notification::info("Formatted")));
        }
        Action::SearchUsers(query) => {
            let query = query.trim();
            if query.is_empty() {
                return Ok(plan);
            }
            let guild = session.require_guild()?;
            plan.request(RequestEffect::new(
                endpoints::user_search(guild, query),
                OnResponse::UserMatches,
            ));
        }
        Action::ReloadLiveUsers => {
            let guild = session.require_guild()?;
            plan.request(
                RequestEffect::new(
                    endpoints::live_users(guild, limits.live_users),
                    OnResponse::LiveUsers,
                )
                .announce("Live users loaded"),
            );
        }
        Action::ReloadLogs => {
            plan.request(
                RequestEffect::new(endpoints::logs(limits.logs), OnResponse::Logs)
                    .announce("Logs loaded"),
            );
        }
        Action::ConnectLiveLogs => {
            plan.push(Effect::ConnectFeed);
        }
        Action::ReloadBirthdays => {
            plan.request(
                RequestEffect::new(
                    endpoints::birthdays(limits.birthdays, 0),
                    OnResponse::Birthdays,
                )
                .announce("Birthdays loaded"),
            );
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::forms::{KickForm, TicketActionForm};
    use crate::preferences::PreferencesStorage;
    use reqwest::Method;

    fn state() -> ConsoleState {
        ConsoleState::new(PreferencesStorage::in_memory(), Limits::default())
    }

    fn state_with_guild(id: u64) -> ConsoleState {
        let mut state = state();
        state.session.select_guild(RecordId::from(id));
        state
    }

    fn paths(plan: &Plan) -> Vec<String> {
        plan.requests().map(|r| r.describe()).collect()
    }

    #[test]
    fn test_guild_scoped_actions_need_a_guild() {
        let state = state();
        for action in [
            Action::RefreshGuild,
            Action::RefreshGuildSummary,
            Action::ReloadTickets,
            Action::ReloadApplicationsConfig,
            Action::ReloadApplicationList,
            Action::ReloadOverrides,
            Action::ReloadLiveUsers,
            Action::SaveOverrides("{}".to_string()),
            Action::SearchUsers("mia".to_string()),
            Action::SubmitForm(GuildForm::Kick(KickForm::default())),
        ] {
            assert!(
                matches!(plan(&state, action.clone()), Err(ConsoleError::GuildMissing)),
                "{:?} should need a guild",
                action
            );
        }
    }

    #[test]
    fn test_global_actions_need_no_guild() {
        let state = state();
        assert_eq!(
            paths(&plan(&state, Action::ReloadLogs).unwrap()),
            vec!["GET /api/logs?limit=200"]
        );
        assert_eq!(
            paths(&plan(&state, Action::ReloadBirthdays).unwrap()),
            vec!["GET /api/global/birthdays?limit=50&offset=0"]
        );
        assert_eq!(
            paths(&plan(&state, Action::LoadAccount).unwrap()),
            vec!["GET /api/me"]
        );
    }

    #[test]
    fn test_refresh_guild_issues_four_requests() {
        let state = state_with_guild(42);
        let plan = plan(&state, Action::RefreshGuild).unwrap();
        assert_eq!(
            paths(&plan),
            vec![
                "GET /api/guilds/42/summary",
                "GET /api/guilds/42/tickets?limit=200",
                "GET /api/guilds/42/applications",
                "GET /api/guilds/42/applications/list?limit=100",
            ]
        );
    }

    #[test]
    fn test_select_guild_refreshes_that_guild() {
        let state = state_with_guild(1);
        let plan = plan(&state, Action::SelectGuild(RecordId::from(2))).unwrap();
        assert_eq!(plan.effects[0], Effect::SelectGuild(RecordId::from(2)));
        assert!(paths(&plan).iter().all(|p| p.contains("/api/guilds/2/")));
    }

    #[test]
    fn test_invalid_json_save_sends_nothing() {
        let state = state_with_guild(1);
        let err = plan(&state, Action::SaveOverrides("{\"a\": ".to_string())).unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));

        let err = plan(&state, Action::SaveApplicationsConfig("[1]".to_string())).unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));
    }

    #[test]
    fn test_save_overrides_reloads_afterwards() {
        let state = state_with_guild(1);
        let plan = plan(&state, Action::SaveOverrides("  ".to_string())).unwrap();
        match &plan.effects[0] {
            Effect::Request(effect) => {
                assert_eq!(effect.request.method, Method::PUT);
                assert_eq!(effect.request.body, Some(serde_json::json!({})));
                assert_eq!(effect.follow_up, vec![Action::ReloadOverrides]);
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_blank_user_search_is_noop() {
        let state = state();
        assert!(plan(&state, Action::SearchUsers("   ".to_string()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_user_search_query_is_trimmed() {
        let state = state_with_guild(3);
        let plan = plan(&state, Action::SearchUsers(" mia ".to_string())).unwrap();
        assert_eq!(paths(&plan), vec!["GET /api/guilds/3/users/search?query=mia"]);
    }

    #[test]
    fn test_ticket_action_refreshes_tickets_and_summary() {
        let state = state_with_guild(9);
        let form = GuildForm::TicketAction(TicketActionForm {
            thread_id: " 77 ".to_string(),
            actor_id: "1".to_string(),
            action: "close".to_string(),
            ..Default::default()
        });
        let plan = plan(&state, Action::SubmitForm(form)).unwrap();
        match &plan.effects[0] {
            Effect::Request(effect) => {
                assert_eq!(effect.request.path, "/api/guilds/9/tickets/action");
                assert_eq!(effect.request.body.as_ref().unwrap()["thread_id"], "77");
                assert_eq!(
                    effect.follow_up,
                    vec![Action::ReloadTickets, Action::RefreshGuildSummary]
                );
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_queries_and_views_are_local() {
        let state = state();
        let plan_query = plan(&state, Action::SetTicketQuery(FilterQuery::text("2"))).unwrap();
        assert_eq!(plan_query.requests().count(), 0);
        let plan_view = plan(&state, Action::ShowView(View::Logs)).unwrap();
        assert_eq!(plan_view.effects, vec![Effect::ShowView(View::Logs)]);
    }

    #[test]
    fn test_prettify_sets_draft() {
        let state = state();
        let formatted = plan(&state, Action::PrettifyOverrides(r#"{"a":1}"#.to_string())).unwrap();
        assert_eq!(
            formatted.effects[0],
            Effect::SetDraft(BlobKind::Overrides, "{\n  \"a\": 1\n}".to_string())
        );
        assert!(plan(&state, Action::PrettifyOverrides("nope".to_string())).is_err());
    }
}

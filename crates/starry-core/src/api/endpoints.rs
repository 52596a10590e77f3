//! Request builders for every backend route the console uses.

use serde_json::Value;

use super::ApiRequest;
use crate::constants::routes;
use crate::models::{ConfigBlob, RecordId};

pub fn me() -> ApiRequest {
    ApiRequest::get(routes::ME)
}

pub fn global_summary() -> ApiRequest {
    ApiRequest::get(routes::GLOBAL_SUMMARY)
}

pub fn birthdays(limit: u32, offset: u32) -> ApiRequest {
    ApiRequest::get(routes::GLOBAL_BIRTHDAYS)
        .with_query("limit", limit)
        .with_query("offset", offset)
}

pub fn logs(limit: u32) -> ApiRequest {
    ApiRequest::get(routes::LOGS).with_query("limit", limit)
}

pub fn guild_summary(guild: &RecordId) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "summary"))
}

pub fn tickets(guild: &RecordId, limit: u32) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "tickets")).with_query("limit", limit)
}

pub fn applications_config(guild: &RecordId) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "applications"))
}

pub fn save_applications_config(guild: &RecordId, blob: &ConfigBlob) -> ApiRequest {
    ApiRequest::put(routes::guild(guild.as_str(), "applications"), blob.to_value())
}

pub fn application_list(guild: &RecordId, limit: u32) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "applications/list")).with_query("limit", limit)
}

pub fn user_search(guild: &RecordId, query: &str) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "users/search")).with_query("query", query)
}

pub fn live_users(guild: &RecordId, limit: u32) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "users/live")).with_query("limit", limit)
}

pub fn overrides(guild: &RecordId) -> ApiRequest {
    ApiRequest::get(routes::guild(guild.as_str(), "overrides"))
}

pub fn save_overrides(guild: &RecordId, blob: &ConfigBlob) -> ApiRequest {
    ApiRequest::put(routes::guild(guild.as_str(), "overrides"), blob.to_value())
}

/// POST a form to a guild-scoped route (`tickets/action`, `moderation/kick`, ...)
pub fn guild_post(guild: &RecordId, route: &str, body: Value) -> ApiRequest {
    ApiRequest::post(routes::guild(guild.as_str(), route), body)
}

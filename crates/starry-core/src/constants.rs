//! Application-wide constants
//!
//! Centralized location for backend routes, fetch limits and storage keys
//! that are used across multiple modules.

/// Default dashboard backend (the bot serves its API on port 8787)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8787";

/// Path of the live log push channel, relative to the API base
pub const LOGS_SOCKET_PATH: &str = "/ws/logs";

/// Name of the session cookie sent when authenticating with a cookie
pub const SESSION_COOKIE_NAME: &str = "session";

// Fetch limits (mirrors what the dashboard asks the backend for)
pub const TICKET_LIMIT: u32 = 200;
pub const APPLICATION_LIMIT: u32 = 100;
pub const LIVE_USER_LIMIT: u32 = 50;
pub const LOG_LIMIT: u32 = 200;
pub const BIRTHDAY_LIMIT: u32 = 50;

/// Status filter value that disables status filtering
pub const STATUS_FILTER_ALL: &str = "all";

/// Settings path holding the canned ticket replies
pub const SNIPPETS_SETTING: &str = "ticket.snippets";

/// Preferences file stored inside the data dir
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Data dir name used when the platform data dir is unknown
pub const DEFAULT_DATA_DIR: &str = "starry_data";

// Environment overrides read by the CLI
pub mod env {
    pub const BASE_URL: &str = "STARRY_BASE_URL";
    pub const TOKEN: &str = "STARRY_TOKEN";
    pub const LOG_FILTER: &str = "STARRY_LOG";
    pub const LOG_FILE: &str = "STARRY_LOG_FILE";
}

// Backend routes
pub mod routes {
    pub const ME: &str = "/api/me";
    pub const GLOBAL_SUMMARY: &str = "/api/global/summary";
    pub const GLOBAL_BIRTHDAYS: &str = "/api/global/birthdays";
    pub const LOGS: &str = "/api/logs";

    /// Prefix for every guild-scoped route
    pub fn guild(guild_id: &str, rest: &str) -> String {
        format!("/api/guilds/{}/{}", guild_id, rest.trim_start_matches('/'))
    }
}

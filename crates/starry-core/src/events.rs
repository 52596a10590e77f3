use serde_json::Value;

use crate::error::ConsoleError;
use crate::streaming::FeedSignal;

/// Completions delivered to the runtime's event queue
#[derive(Debug)]
pub enum ConsoleEvent {
    /// A spawned request finished
    Response {
        request_id: u64,
        outcome: Result<Option<Value>, ConsoleError>,
    },
    /// Something happened on the live log socket
    Feed(FeedSignal),
}

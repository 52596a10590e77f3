mod live_feed;
mod socket_client;

pub use live_feed::{FeedEvent, FeedOutcome, FeedSignal, FeedState, LiveFeed};
pub use socket_client::{feed_url, LogSocketClient};

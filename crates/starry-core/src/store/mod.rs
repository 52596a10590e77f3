pub mod cache_store;
pub mod log_list;

pub use cache_store::{CacheStore, CachedResource, FetchToken, ResourceKind};
pub use log_list::LogList;

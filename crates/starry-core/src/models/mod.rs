pub mod account;
pub mod application;
pub mod config_blob;
pub mod log_event;
pub mod record_id;
pub mod summary;
pub mod ticket;
pub mod user;

pub use account::{Account, AccountUser, Guild};
pub use application::Application;
pub use config_blob::{prettify, ConfigBlob, Snippet};
pub use log_event::LogEvent;
pub use record_id::RecordId;
pub use summary::{GlobalSummary, GuildSummary, TicketCounts};
pub use ticket::{Ticket, TicketAction, TicketStatus};
pub use user::{Birthday, LiveUser, UserMatch};
pub(crate) use user::BirthdayPage;

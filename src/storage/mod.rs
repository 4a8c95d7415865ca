mod channel_cache;
mod schema;
mod subscriptions;
mod types;

pub use channel_cache::DEFAULT_CHANNEL_TTL_MINUTES;
pub use schema::Database;
pub use types::{DatabaseError, NewSubscription, Subscription};

//! Change notification: commit subscribers and revision-keyed memos.
//!
//! There is no implicit recomputation graph. The store publishes each
//! commit to its [`Subscribers`]; derived data is recomputed on demand and
//! may be cached in a [`Memo`] keyed by the store revision.

pub mod memo;
pub mod subscribers;

pub use memo::Memo;
pub use subscribers::{SubscriptionId, Subscribers};

/// Feed module
///
/// Ownership-gated post CRUD with paging, and an in-process hub that fans
/// post mutations out to subscribers.

mod events;
mod service;

pub use events::{PostEvent, PostEvents};
pub use service::{FeedService, PostPage};

//! Activity streams: scopes, activities and the hashtag pipeline.

mod activity;
mod content;
mod hashtag;
mod scope;
mod store_hashtags;

pub use activity::{Activity, BaseObject, BaseObjectType};
pub use hashtag::{HashTag, StreamHashTag};
pub use scope::{ScopeType, StreamScope};
pub use store_hashtags::{CachedHashTagMapper, StoreStreamHashTagsForActivity};

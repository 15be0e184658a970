//! Storing stream hashtags for a newly posted activity.
//!
//! The lookup and insert mappers are traits so the strategy can be driven by
//! in-memory fakes; the production implementations sit on the database and
//! the shared cache.

use super::activity::Activity;
use super::content::ActivityContentExtractor;
use super::hashtag::{HashTag, HashTagExtractor, StreamHashTag};
use crate::cache::{MemoryCache, keys};
use crate::db::{Database, DbError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves hashtag contents to stored hashtags, creating missing ones.
#[async_trait]
pub trait HashTagMapper: Send + Sync {
    /// One hashtag per distinct requested content, in request order.
    async fn execute(&self, contents: &[String]) -> Result<Vec<HashTag>, DbError>;
}

/// Inserts one stream hashtag association.
#[async_trait]
pub trait StreamHashTagInserter: Send + Sync {
    /// Returns false when the identical association already exists.
    async fn insert(&self, stream_hash_tag: &StreamHashTag) -> Result<bool, DbError>;
}

/// Hashtag lookup served from the cache first, then the database.
pub struct CachedHashTagMapper {
    db: Database,
    cache: Arc<MemoryCache>,
}

impl CachedHashTagMapper {
    pub fn new(db: Database, cache: Arc<MemoryCache>) -> Self {
        Self { db, cache }
    }
}

#[async_trait]
impl HashTagMapper for CachedHashTagMapper {
    async fn execute(&self, contents: &[String]) -> Result<Vec<HashTag>, DbError> {
        let mut requested: Vec<&String> = Vec::with_capacity(contents.len());
        for content in contents {
            if !requested.contains(&content) {
                requested.push(content);
            }
        }

        let cache_keys: Vec<String> = requested.iter().map(|c| keys::hashtag(c)).collect();
        let hits: HashMap<String, HashTag> = self.cache.multi_get(&cache_keys);

        let mut resolved: HashMap<String, HashTag> = hits
            .into_values()
            .map(|tag| (tag.content.clone(), tag))
            .collect();

        let misses: Vec<String> = requested
            .iter()
            .filter(|c| !resolved.contains_key(c.as_str()))
            .map(|c| c.to_string())
            .collect();

        if !misses.is_empty() {
            debug!(hits = resolved.len(), misses = misses.len(), "Resolving hashtags from database");
            for tag in self.db.hashtags().find_or_create(&misses).await? {
                self.cache.set(keys::hashtag(&tag.content), &tag);
                resolved.insert(tag.content.clone(), tag);
            }
        }

        Ok(requested
            .into_iter()
            .filter_map(|content| resolved.remove(content.as_str()))
            .collect())
    }
}

#[async_trait]
impl StreamHashTagInserter for Database {
    async fn insert(&self, stream_hash_tag: &StreamHashTag) -> Result<bool, DbError> {
        self.hashtags().insert_stream_hashtag(stream_hash_tag).await
    }
}

/// Extracts the hashtags of an activity and records them for its stream.
pub struct StoreStreamHashTagsForActivity {
    content_extractor: ActivityContentExtractor,
    hashtag_extractor: HashTagExtractor,
    mapper: Arc<dyn HashTagMapper>,
    inserter: Arc<dyn StreamHashTagInserter>,
}

impl StoreStreamHashTagsForActivity {
    pub fn new(mapper: Arc<dyn HashTagMapper>, inserter: Arc<dyn StreamHashTagInserter>) -> Self {
        Self {
            content_extractor: ActivityContentExtractor,
            hashtag_extractor: HashTagExtractor,
            mapper,
            inserter,
        }
    }

    /// Run for one activity. Returns the number of inserts attempted.
    ///
    /// Only PERSON and GROUP streams carry stream hashtags; any other
    /// destination is a no-op.
    pub async fn execute(&self, activity: &Activity) -> Result<usize, DbError> {
        let scope = &activity.recipient_stream_scope;
        if !scope.scope_type.tracks_hashtags() {
            debug!(
                activity = activity.id,
                scope_type = %scope.scope_type,
                "Destination stream does not track hashtags"
            );
            return Ok(0);
        }

        let Some(content) = self
            .content_extractor
            .extract_content(activity.base_object_type, &activity.base_object)
        else {
            return Ok(0);
        };

        let contents = self.hashtag_extractor.extract_all(&content);
        if contents.is_empty() {
            return Ok(0);
        }

        let hashtags = self.mapper.execute(&contents).await?;

        let mut attempted = 0;
        let mut stored = 0;
        for hashtag in hashtags {
            let row = StreamHashTag {
                hashtag,
                stream_unique_key: scope.unique_key.clone(),
                stream_scope_type: scope.scope_type,
                activity_id: activity.id,
                activity_date: activity.posted_at,
                is_public: activity.is_destination_stream_public,
            };
            attempted += 1;
            if self.inserter.insert(&row).await? {
                stored += 1;
            }
        }

        crate::metrics::record_hashtags_stored(stored);
        info!(
            activity = activity.id,
            stream = %scope,
            is_public = activity.is_destination_stream_public,
            attempted,
            stored,
            "Stored stream hashtags"
        );

        Ok(attempted)
    }
}

//! Stream actions: groups, activities, comments and stream hashtags.

use super::{Access, ActionContext, ExecutionStrategy, Services};
use crate::db::{Database, NewActivity};
use crate::error::ExecutionError;
use crate::stream::{BaseObject, BaseObjectType, ScopeType, StoreStreamHashTagsForActivity, StreamScope};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

const DEFAULT_HASHTAG_LIMIT: i64 = 20;
const MAX_HASHTAG_LIMIT: i64 = 100;

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ExecutionError> {
    serde_json::to_value(value).map_err(|e| ExecutionError::Internal(e.to_string()))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CreateGroupParams {
    short_name: String,
    name: String,
    #[serde(default = "default_true")]
    is_public: bool,
}

/// `create_group`: create a group coordinated by the caller.
pub struct CreateGroup {
    db: Database,
}

impl CreateGroup {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for CreateGroup {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: CreateGroupParams = ctx.params()?;

        let short_name = params.short_name.trim();
        if short_name.is_empty()
            || !short_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        {
            return Err(ExecutionError::InvalidParams(format!(
                "invalid group short name: {}",
                params.short_name
            )));
        }

        let group = self
            .db
            .groups()
            .create(short_name, params.name.trim(), params.is_public, principal.id)
            .await?;

        info!(group = %group.short_name, public = group.is_public, "Group created");
        to_value(&group)
    }
}

#[derive(Debug, Deserialize)]
struct PostActivityParams {
    stream: StreamScope,
    base_object_type: BaseObjectType,
    #[serde(default)]
    base_object: BaseObject,
}

/// `post_activity`: store an activity and record its stream hashtags.
pub struct PostActivity {
    db: Database,
    hashtags: Arc<StoreStreamHashTagsForActivity>,
}

impl PostActivity {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
            hashtags: services.hashtags.clone(),
        }
    }

    /// Canonical destination scope and whether the stream is public.
    async fn resolve_destination(&self, stream: &StreamScope) -> Result<(StreamScope, bool), ExecutionError> {
        match stream.scope_type {
            ScopeType::Person => {
                let person = self
                    .db
                    .people()
                    .find_by_account_id(&stream.unique_key)
                    .await?
                    .ok_or_else(|| ExecutionError::NotFound(format!("person {}", stream.unique_key)))?;
                Ok((StreamScope::person(person.account_id), true))
            }
            ScopeType::Group => {
                let group = self
                    .db
                    .groups()
                    .find_by_short_name(&stream.unique_key)
                    .await?
                    .ok_or_else(|| ExecutionError::NotFound(format!("group {}", stream.unique_key)))?;
                Ok((StreamScope::group(group.short_name), group.is_public))
            }
            other => Err(ExecutionError::InvalidParams(format!(
                "cannot post to a {other} stream"
            ))),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for PostActivity {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: PostActivityParams = ctx.params()?;

        let (destination, is_public) = self.resolve_destination(&params.stream).await?;

        let activity = self
            .db
            .activities()
            .insert(NewActivity {
                actor_person_id: principal.id,
                recipient_stream_scope: destination,
                is_destination_stream_public: is_public,
                base_object_type: params.base_object_type,
                base_object: params.base_object,
            })
            .await?;

        let hashtag_count = self.hashtags.execute(&activity).await?;

        info!(
            activity = activity.id,
            stream = %activity.recipient_stream_scope,
            hashtags = hashtag_count,
            "Activity posted"
        );
        Ok(json!({ "activity": to_value(&activity)?, "hashtag_count": hashtag_count }))
    }
}

#[derive(Debug, Deserialize)]
struct PostCommentParams {
    activity_id: i64,
    body: String,
}

/// `post_comment`: comment on an activity.
pub struct PostComment {
    db: Database,
}

impl PostComment {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for PostComment {
    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let principal = ctx.principal()?;
        let params: PostCommentParams = ctx.params()?;
        let body = params.body.trim();
        if body.is_empty() {
            return Err(ExecutionError::InvalidParams("comment body is empty".to_string()));
        }

        let comment = self
            .db
            .activities()
            .add_comment(params.activity_id, principal.id, body)
            .await?;
        to_value(&comment)
    }
}

#[derive(Debug, Deserialize)]
struct StreamHashTagsParams {
    scope_type: ScopeType,
    unique_key: String,
    limit: Option<i64>,
}

/// `get_stream_hashtags`: hashtags used in a stream, most used first.
///
/// Private rows count only for administrators and the owner of a PERSON stream.
pub struct GetStreamHashTags {
    db: Database,
}

impl GetStreamHashTags {
    pub fn new(services: &Services) -> Self {
        Self {
            db: services.db.clone(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for GetStreamHashTags {
    fn access(&self) -> Access {
        Access::Public
    }

    async fn execute(&self, ctx: &ActionContext) -> Result<Value, ExecutionError> {
        let params: StreamHashTagsParams = ctx.params()?;
        let limit = params
            .limit
            .unwrap_or(DEFAULT_HASHTAG_LIMIT)
            .clamp(1, MAX_HASHTAG_LIMIT);
        let scope = StreamScope::new(params.scope_type, params.unique_key);

        let include_private = ctx.principal.as_ref().is_some_and(|p| {
            p.is_administrator
                || (scope.scope_type == ScopeType::Person
                    && p.account_id.eq_ignore_ascii_case(&scope.unique_key))
        });

        let counts = self
            .db
            .hashtags()
            .stream_hashtag_counts(&scope, include_private, limit)
            .await?;
        to_value(&counts)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::actions::Registry;

    fn note(stream: Value, text: &str) -> Value {
        json!({
            "stream": stream,
            "base_object_type": "NOTE",
            "base_object": {"content": text},
        })
    }

    #[tokio::test]
    async fn post_to_public_group_stores_public_hashtags() {
        let services = services().await;
        let registry = Registry::new(&services);
        let jane = person(&services, "jdoe", false).await;

        registry
            .dispatch("create_group", &ctx(&jane, json!({"short_name": "rust", "name": "Rust"})))
            .await
            .unwrap();

        let posted = registry
            .dispatch(
                "post_activity",
                &ctx(
                    &jane,
                    note(json!({"scope_type": "GROUP", "unique_key": "RUST"}), "hi #there #potato"),
                ),
            )
            .await
            .unwrap();
        assert_eq!(posted["hashtag_count"], json!(2));
        assert_eq!(posted["activity"]["recipient_stream_scope"]["unique_key"], json!("rust"));

        let tags = registry
            .dispatch(
                "get_stream_hashtags",
                &ActionContext::new(None, json!({"scope_type": "GROUP", "unique_key": "rust"})),
            )
            .await
            .unwrap();
        assert_eq!(tags.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn private_group_hashtags_are_hidden_from_outsiders() {
        let services = services().await;
        let registry = Registry::new(&services);
        let jane = person(&services, "jdoe", false).await;
        let admin = person(&services, "admin", true).await;

        registry
            .dispatch(
                "create_group",
                &ctx(&jane, json!({"short_name": "secret", "name": "Secret", "is_public": false})),
            )
            .await
            .unwrap();
        let posted = registry
            .dispatch(
                "post_activity",
                &ctx(&jane, note(json!({"scope_type": "GROUP", "unique_key": "secret"}), "#hush")),
            )
            .await
            .unwrap();
        assert_eq!(posted["activity"]["is_destination_stream_public"], json!(false));

        let params = json!({"scope_type": "GROUP", "unique_key": "secret"});
        let outsider = registry
            .dispatch("get_stream_hashtags", &ctx(&jane, params.clone()))
            .await
            .unwrap();
        assert_eq!(outsider, json!([]));

        let as_admin = registry
            .dispatch("get_stream_hashtags", &ctx(&admin, params))
            .await
            .unwrap();
        assert_eq!(as_admin, json!([{"content": "#hush", "count": 1}]));
    }

    #[tokio::test]
    async fn cannot_post_to_unknown_or_aggregate_streams() {
        let services = services().await;
        let registry = Registry::new(&services);
        let jane = person(&services, "jdoe", false).await;

        let err = registry
            .dispatch(
                "post_activity",
                &ctx(&jane, note(json!({"scope_type": "PERSON", "unique_key": "ghost"}), "#x")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotFound(_)));

        let err = registry
            .dispatch(
                "post_activity",
                &ctx(&jane, note(json!({"scope_type": "ALL", "unique_key": "all"}), "#x")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn comment_on_posted_activity() {
        let services = services().await;
        let registry = Registry::new(&services);
        let jane = person(&services, "jdoe", false).await;

        let posted = registry
            .dispatch(
                "post_activity",
                &ctx(&jane, note(json!({"scope_type": "PERSON", "unique_key": "jdoe"}), "hello")),
            )
            .await
            .unwrap();
        assert_eq!(posted["hashtag_count"], json!(0));

        let comment = registry
            .dispatch(
                "post_comment",
                &ctx(&jane, json!({"activity_id": posted["activity"]["id"], "body": " nice "})),
            )
            .await
            .unwrap();
        assert_eq!(comment["body"], json!("nice"));

        let err = registry
            .dispatch("post_comment", &ctx(&jane, json!({"activity_id": 999, "body": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NotFound(_)));
    }
}

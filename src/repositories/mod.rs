use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error as ThisError;

use crate::entities::{
    Attachment, AttachmentId, Date, Follow, FollowId, FromType, Gender, Like, LikeId,
    LikeTargetType, Status, StatusCounter, StatusId, User, UserCounter, UserId,
};

pub(crate) mod mock;
pub(crate) mod mongo;

type StdResult<T, E> = ::std::result::Result<T, E>;
pub(crate) type Result<T> = StdResult<T, RepositoryError>;

/// Descending-id window over a collection.
///
/// `until` keeps items whose id is `<=` the given key, `skip` and `limit` are
/// applied after sorting by id, newest first. `limit: None` reads to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<K> {
    pub until: Option<K>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl<K> Window<K> {
    pub fn all() -> Self {
        Window {
            until: None,
            skip: 0,
            limit: None,
        }
    }
}

#[async_trait]
pub(crate) trait SequenceRepository {
    async fn next(&self, name: &str) -> Result<u64>;
}

#[async_trait]
pub(crate) trait UserRepository {
    async fn insert(&self, item: User) -> Result<bool>;

    async fn find(&self, id: UserId) -> Result<User>;
    async fn finds(&self, query: UserQuery) -> Result<Vec<User>>;
    async fn count(&self, query: UserQuery) -> Result<u64>;

    async fn update(&self, id: UserId, mutation: UserMutation) -> Result<User>;
    async fn inc_counter(&self, id: UserId, counter: UserCounter, value: i64) -> Result<()>;
}

#[async_trait]
pub(crate) trait FollowRepository {
    async fn insert(&self, item: Follow) -> Result<bool>;

    async fn find(&self, uid: UserId, focus_uid: UserId) -> Result<Follow>;
    async fn finds(&self, query: FollowQuery, window: Window<FollowId>) -> Result<Vec<Follow>>;
    async fn count(&self, query: FollowQuery) -> Result<u64>;

    async fn set_friend(&self, id: FollowId, is_friend: bool, now: Date) -> Result<()>;

    async fn delete(&self, uid: UserId, focus_uid: UserId) -> Result<bool>;
}

#[async_trait]
pub(crate) trait StatusRepository {
    async fn insert(&self, item: Status) -> Result<bool>;

    async fn find(&self, id: StatusId) -> Result<Status>;
    async fn finds(&self, query: StatusQuery, window: Window<StatusId>) -> Result<Vec<Status>>;

    async fn inc_counter(&self, id: StatusId, counter: StatusCounter, value: i64) -> Result<()>;

    async fn delete(&self, id: StatusId, now: Date) -> Result<()>;
}

#[async_trait]
pub(crate) trait LikeRepository {
    async fn insert(&self, item: Like) -> Result<bool>;

    async fn find(
        &self,
        uid: UserId,
        target_id: StatusId,
        target_type: LikeTargetType,
    ) -> Result<Like>;
    async fn finds(&self, query: LikeQuery) -> Result<Vec<Like>>;

    async fn delete(&self, id: LikeId, now: Date) -> Result<()>;
}

#[async_trait]
pub(crate) trait AttachmentRepository {
    async fn insert(&self, item: Attachment) -> Result<bool>;

    async fn find(&self, id: AttachmentId) -> Result<Attachment>;
    async fn finds(&self, ids: HashSet<AttachmentId>) -> Result<Vec<Attachment>>;
}

#[derive(Debug, Clone, Default)]
pub(crate) struct UserQuery {
    pub(crate) ids: Option<HashSet<UserId>>,
    pub(crate) external_id: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) exclude_id: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct UserMutation {
    pub(crate) username: Option<String>,
    pub(crate) gender: Option<Gender>,
    pub(crate) mobile: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) avatar_id: Option<AttachmentId>,
    pub(crate) updated: Option<Date>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FollowQuery {
    pub(crate) uid: Option<UserId>,
    pub(crate) focus_uid: Option<UserId>,
    pub(crate) focus_uids: Option<HashSet<UserId>>,
    pub(crate) is_friend: Option<bool>,
}

/// Soft-deleted statuses never match.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusQuery {
    pub(crate) ids: Option<HashSet<StatusId>>,
    pub(crate) uids: Option<HashSet<UserId>>,
    pub(crate) parent_id: Option<StatusId>,
    pub(crate) from_types: Option<HashSet<FromType>>,
}

/// Matches active likes only.
#[derive(Debug, Clone)]
pub(crate) struct LikeQuery {
    pub(crate) uid: UserId,
    pub(crate) target_ids: HashSet<StatusId>,
    pub(crate) target_type: LikeTargetType,
}

#[derive(Debug, ThisError)]
pub enum RepositoryError {
    #[error("cannot find object.")]
    NotFound,
    #[error("expected unique object, found non-unique objects (matched: {matched})")]
    NoUnique { matched: u32 },
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

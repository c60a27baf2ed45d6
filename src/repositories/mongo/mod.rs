use std::collections::HashSet;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};
use tracing::Instrument;

use super::{
    AttachmentRepository, FollowQuery, FollowRepository, LikeQuery, LikeRepository,
    RepositoryError, Result, SequenceRepository, StatusQuery, StatusRepository, UserMutation,
    UserQuery, UserRepository, Window,
};
use crate::entities::{
    Attachment, AttachmentId, Date, Follow, FollowId, Like, LikeId, LikeTargetType, Status,
    StatusCounter, StatusId, User, UserCounter, UserId,
};
use crate::utils::LetChain;

mod converters;
mod helpers;
mod models;
mod type_convert;

use converters::{convert_404_or, convert_repo_err, expect_matched, is_duplicate_key, try_unique_check};
use helpers::{find_all, index, initialize_coll, unique_index};
use models::{
    MongoAttachmentModel, MongoFollowModel, MongoLikeModel, MongoSequenceModel, MongoStatusModel,
    MongoUserModel,
};
use type_convert::apply_window;

pub struct MongoSequenceRepository {
    coll: Collection<MongoSequenceModel>,
}

impl MongoSequenceRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        Ok(Self {
            coll: db.collection("sequences"),
        })
    }
}

#[async_trait]
impl SequenceRepository for MongoSequenceRepository {
    async fn next(&self, name: &str) -> Result<u64> {
        let opts = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let MongoSequenceModel { seq, .. } = self
            .coll
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } }, opts)
            .instrument(tracing::trace_span!("find_one_and_update"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?;

        Ok(seq as u64)
    }
}

pub struct MongoUserRepository {
    coll: Collection<MongoUserModel>,
}

impl MongoUserRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "users",
            vec![
                unique_index("unique_external_id", doc! { "external_id": 1 }),
                doc! {
                    "name": "unique_username",
                    "key": { "username": 1 },
                    "unique": true,
                    "partialFilterExpression": { "username": { "$gt": "" } },
                },
            ],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("users"),
        })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, item: User) -> Result<bool> {
        let model: MongoUserModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: UserId) -> Result<User> {
        self.coll
            .find_one(doc! { "_id": id as i64 }, None)
            .instrument(tracing::trace_span!("find_one"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .try_into()
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        find_all(&self.coll, query.into(), None).await
    }

    async fn count(&self, query: UserQuery) -> Result<u64> {
        let filter: Document = query.into();

        self.coll
            .count_documents(filter, None)
            .instrument(tracing::trace_span!("count_documents"))
            .await
            .let_(convert_repo_err)
    }

    async fn update(&self, id: UserId, mutation: UserMutation) -> Result<User> {
        let mutation_doc: Document = mutation.into();
        let opts = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let res = self
            .coll
            .find_one_and_update(doc! { "_id": id as i64 }, doc! { "$set": mutation_doc }, opts)
            .instrument(tracing::trace_span!("find_one_and_update"))
            .await;

        match res {
            Err(e) if is_duplicate_key(&e) => Err(RepositoryError::NoUnique { matched: 2 }),
            r => r.let_(convert_repo_err)?.let_(convert_404_or)?.try_into(),
        }
    }

    async fn inc_counter(&self, id: UserId, counter: UserCounter, value: i64) -> Result<()> {
        self.coll
            .update_one(
                doc! { "_id": id as i64 },
                doc! { "$inc": { counter.field(): value } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?
            .matched_count
            .let_(expect_matched)
    }
}

pub struct MongoFollowRepository {
    coll: Collection<MongoFollowModel>,
}

impl MongoFollowRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "follows",
            vec![
                unique_index("unique_edge", doc! { "uid": 1, "focus_uid": 1 }),
                index("focus_uid", doc! { "focus_uid": 1 }),
            ],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("follows"),
        })
    }
}

#[async_trait]
impl FollowRepository for MongoFollowRepository {
    async fn insert(&self, item: Follow) -> Result<bool> {
        let model: MongoFollowModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, uid: UserId, focus_uid: UserId) -> Result<Follow> {
        self.coll
            .find_one(
                doc! { "uid": uid as i64, "focus_uid": focus_uid as i64 },
                None,
            )
            .instrument(tracing::trace_span!("find_one"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .try_into()
    }

    async fn finds(&self, query: FollowQuery, window: Window<FollowId>) -> Result<Vec<Follow>> {
        let mut filter: Document = query.into();
        let opts = apply_window(&mut filter, window);

        find_all(&self.coll, filter, opts).await
    }

    async fn count(&self, query: FollowQuery) -> Result<u64> {
        let filter: Document = query.into();

        self.coll
            .count_documents(filter, None)
            .instrument(tracing::trace_span!("count_documents"))
            .await
            .let_(convert_repo_err)
    }

    async fn set_friend(&self, id: FollowId, is_friend: bool, now: Date) -> Result<()> {
        self.coll
            .update_one(
                doc! { "_id": ObjectId::from(id) },
                doc! { "$set": { "is_friend": is_friend, "updated": DateTime::from_chrono(now) } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?
            .matched_count
            .let_(expect_matched)
    }

    async fn delete(&self, uid: UserId, focus_uid: UserId) -> Result<bool> {
        self.coll
            .delete_one(
                doc! { "uid": uid as i64, "focus_uid": focus_uid as i64 },
                None,
            )
            .instrument(tracing::trace_span!("delete_one"))
            .await
            .let_(convert_repo_err)?
            .deleted_count
            .let_(converters::to_bool)
            .let_(Ok)
    }
}

pub struct MongoStatusRepository {
    coll: Collection<MongoStatusModel>,
}

impl MongoStatusRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "statuses",
            vec![
                index("uid_id", doc! { "uid": 1, "_id": -1 }),
                index("parent_id", doc! { "parent_id": 1 }),
            ],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("statuses"),
        })
    }
}

#[async_trait]
impl StatusRepository for MongoStatusRepository {
    async fn insert(&self, item: Status) -> Result<bool> {
        let model: MongoStatusModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: StatusId) -> Result<Status> {
        self.coll
            .find_one(doc! { "_id": ObjectId::from(id), "deleted": null }, None)
            .instrument(tracing::trace_span!("find_one"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .try_into()
    }

    async fn finds(&self, query: StatusQuery, window: Window<StatusId>) -> Result<Vec<Status>> {
        let mut filter: Document = query.into();
        let opts = apply_window(&mut filter, window);

        find_all(&self.coll, filter, opts).await
    }

    async fn inc_counter(&self, id: StatusId, counter: StatusCounter, value: i64) -> Result<()> {
        self.coll
            .update_one(
                doc! { "_id": ObjectId::from(id) },
                doc! { "$inc": { counter.field(): value } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?
            .matched_count
            .let_(expect_matched)
    }

    async fn delete(&self, id: StatusId, now: Date) -> Result<()> {
        let now = DateTime::from_chrono(now);

        self.coll
            .update_one(
                doc! { "_id": ObjectId::from(id), "deleted": null },
                doc! { "$set": { "deleted": now, "updated": now } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?
            .matched_count
            .let_(expect_matched)
    }
}

pub struct MongoLikeRepository {
    coll: Collection<MongoLikeModel>,
}

impl MongoLikeRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "likes",
            vec![doc! {
                "name": "unique_active_like",
                "key": { "uid": 1, "target_id": 1, "target_type": 1 },
                "unique": true,
                "partialFilterExpression": { "active": true },
            }],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("likes"),
        })
    }
}

#[async_trait]
impl LikeRepository for MongoLikeRepository {
    async fn insert(&self, item: Like) -> Result<bool> {
        let model: MongoLikeModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(
        &self,
        uid: UserId,
        target_id: StatusId,
        target_type: LikeTargetType,
    ) -> Result<Like> {
        self.coll
            .find_one(
                doc! {
                    "uid": uid as i64,
                    "target_id": ObjectId::from(target_id),
                    "target_type": target_type.as_str(),
                    "active": true,
                },
                None,
            )
            .instrument(tracing::trace_span!("find_one"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .try_into()
    }

    async fn finds(&self, query: LikeQuery) -> Result<Vec<Like>> {
        find_all(&self.coll, query.into(), None).await
    }

    async fn delete(&self, id: LikeId, now: Date) -> Result<()> {
        let now = DateTime::from_chrono(now);

        self.coll
            .update_one(
                doc! { "_id": ObjectId::from(id), "active": true },
                doc! { "$set": { "active": false, "deleted": now, "updated": now } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?
            .matched_count
            .let_(expect_matched)
    }
}

pub struct MongoAttachmentRepository {
    coll: Collection<MongoAttachmentModel>,
}

impl MongoAttachmentRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        Ok(Self {
            coll: db.collection("attachments"),
        })
    }
}

#[async_trait]
impl AttachmentRepository for MongoAttachmentRepository {
    async fn insert(&self, item: Attachment) -> Result<bool> {
        let model: MongoAttachmentModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: AttachmentId) -> Result<Attachment> {
        self.coll
            .find_one(doc! { "_id": id as i64 }, None)
            .instrument(tracing::trace_span!("find_one"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .try_into()
    }

    async fn finds(&self, ids: HashSet<AttachmentId>) -> Result<Vec<Attachment>> {
        let ids = ids.into_iter().map(|i| i as i64).collect::<Vec<_>>();

        find_all(&self.coll, doc! { "_id": { "$in": ids } }, None).await
    }
}

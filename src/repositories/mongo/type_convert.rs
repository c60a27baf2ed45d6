use anyhow::anyhow;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::FindOptions;

use super::models::{
    MongoAttachmentModel, MongoFollowModel, MongoLikeModel, MongoLinkMetaModel, MongoStatusModel,
    MongoUserModel,
};
use super::{
    FollowQuery, LikeQuery, RepositoryError, Result as RepoResult, StatusQuery, UserMutation,
    UserQuery, Window,
};
use crate::entities::{
    Attachment, Follow, Like, LinkMeta, Status, StatusMeta, StatusType, User,
};
use crate::utils::LetChain;

fn parse_tag<T>(s: &str) -> RepoResult<T>
where
    T: ::core::str::FromStr,
    T::Err: ::core::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| RepositoryError::Internal(anyhow!("stored value is broken: {}", e)))
}

fn to_count(n: i64) -> u64 { n.max(0) as u64 }

impl From<User> for MongoUserModel {
    fn from(
        User {
            id,
            username,
            external_id,
            gender,
            mobile,
            email,
            address,
            avatar_id,
            following_count,
            fans_count,
            created,
            updated,
        }: User,
    ) -> Self {
        Self {
            id: id as i64,
            username,
            external_id,
            gender: gender.as_str().to_string(),
            mobile,
            email,
            address,
            avatar_id: avatar_id.map(|a| a as i64),
            following_count,
            fans_count,
            created: DateTime::from_chrono(created),
            updated: DateTime::from_chrono(updated),
        }
    }
}
impl TryFrom<MongoUserModel> for User {
    type Error = RepositoryError;

    fn try_from(m: MongoUserModel) -> RepoResult<Self> {
        Ok(Self {
            id: m.id as u64,
            gender: parse_tag(&m.gender)?,
            username: m.username,
            external_id: m.external_id,
            mobile: m.mobile,
            email: m.email,
            address: m.address,
            avatar_id: m.avatar_id.map(|a| a as u64),
            following_count: m.following_count,
            fans_count: m.fans_count,
            created: m.created.to_chrono(),
            updated: m.updated.to_chrono(),
        })
    }
}

impl From<Follow> for MongoFollowModel {
    fn from(f: Follow) -> Self {
        Self {
            id: f.id.into(),
            uid: f.uid as i64,
            focus_uid: f.focus_uid as i64,
            is_friend: f.is_friend,
            created: DateTime::from_chrono(f.created),
            updated: DateTime::from_chrono(f.updated),
        }
    }
}
impl TryFrom<MongoFollowModel> for Follow {
    type Error = RepositoryError;

    fn try_from(m: MongoFollowModel) -> RepoResult<Self> {
        Ok(Self {
            id: m.id.into(),
            uid: m.uid as u64,
            focus_uid: m.focus_uid as u64,
            is_friend: m.is_friend,
            created: m.created.to_chrono(),
            updated: m.updated.to_chrono(),
        })
    }
}

impl From<Status> for MongoStatusModel {
    fn from(s: Status) -> Self {
        let link = s.meta.link().map(|l| MongoLinkMetaModel {
            title: l.title.clone(),
            host: l.host.clone(),
            link: l.link.clone(),
            attachment_id: l.attachment_id.map(|a| a as i64),
        });

        Self {
            id: s.id.into(),
            parent_id: s.parent_id.map(Into::into),
            origin_id: s.origin_id.map(Into::into),
            uid: s.uid as i64,
            from_type: s.from_type.as_str().to_string(),
            status_type: s.meta.status_type().as_str().to_string(),
            link,
            content: s.content,
            comments_count: s.comments_count as i64,
            likes_count: s.likes_count as i64,
            forwards_count: s.forwards_count as i64,
            deleted: s.deleted.map(DateTime::from_chrono),
            created: DateTime::from_chrono(s.created),
            updated: DateTime::from_chrono(s.updated),
        }
    }
}
impl TryFrom<MongoStatusModel> for Status {
    type Error = RepositoryError;

    fn try_from(m: MongoStatusModel) -> RepoResult<Self> {
        let meta = match (parse_tag::<StatusType>(&m.status_type)?, m.link) {
            (StatusType::Text, _) => StatusMeta::Text,
            (StatusType::Link, Some(l)) => StatusMeta::Link(LinkMeta {
                title: l.title,
                host: l.host,
                link: l.link,
                attachment_id: l.attachment_id.map(|a| a as u64),
            }),
            (StatusType::Link, None) => {
                return Err(RepositoryError::Internal(anyhow!(
                    "link status {} has no link meta",
                    m.id
                )))
            },
        };

        Ok(Self {
            id: m.id.into(),
            parent_id: m.parent_id.map(Into::into),
            origin_id: m.origin_id.map(Into::into),
            uid: m.uid as u64,
            from_type: parse_tag(&m.from_type)?,
            meta,
            content: m.content,
            comments_count: to_count(m.comments_count),
            likes_count: to_count(m.likes_count),
            forwards_count: to_count(m.forwards_count),
            deleted: m.deleted.map(|d| d.to_chrono()),
            created: m.created.to_chrono(),
            updated: m.updated.to_chrono(),
        })
    }
}

impl From<Like> for MongoLikeModel {
    fn from(l: Like) -> Self {
        Self {
            id: l.id.into(),
            uid: l.uid as i64,
            target_id: l.target_id.into(),
            target_type: l.target_type.as_str().to_string(),
            active: l.deleted.is_none(),
            deleted: l.deleted.map(DateTime::from_chrono),
            created: DateTime::from_chrono(l.created),
            updated: DateTime::from_chrono(l.updated),
        }
    }
}
impl TryFrom<MongoLikeModel> for Like {
    type Error = RepositoryError;

    fn try_from(m: MongoLikeModel) -> RepoResult<Self> {
        Ok(Self {
            id: m.id.into(),
            uid: m.uid as u64,
            target_id: m.target_id.into(),
            target_type: parse_tag(&m.target_type)?,
            deleted: m.deleted.map(|d| d.to_chrono()),
            created: m.created.to_chrono(),
            updated: m.updated.to_chrono(),
        })
    }
}

impl From<Attachment> for MongoAttachmentModel {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id as i64,
            filename: a.filename,
            file_type: a.file_type.as_str().to_string(),
            created: DateTime::from_chrono(a.created),
            updated: DateTime::from_chrono(a.updated),
        }
    }
}
impl TryFrom<MongoAttachmentModel> for Attachment {
    type Error = RepositoryError;

    fn try_from(m: MongoAttachmentModel) -> RepoResult<Self> {
        Ok(Self {
            id: m.id as u64,
            file_type: parse_tag(&m.file_type)?,
            filename: m.filename,
            created: m.created.to_chrono(),
            updated: m.updated.to_chrono(),
        })
    }
}

impl From<UserQuery> for Document {
    fn from(
        UserQuery {
            ids,
            external_id,
            username,
            exclude_id,
        }: UserQuery,
    ) -> Self {
        let mut query = doc! {};

        let mut id_q = doc! {};
        if let Some(set) = ids {
            let set = set.into_iter().map(|i| i as i64).collect::<Vec<_>>();
            id_q.insert("$in", set);
        }
        if let Some(id) = exclude_id {
            id_q.insert("$ne", id as i64);
        }
        if !id_q.is_empty() {
            query.insert("_id", id_q);
        }

        if let Some(e) = external_id {
            query.insert("external_id", e);
        }
        if let Some(n) = username {
            query.insert("username", n);
        }

        query
    }
}

impl From<UserMutation> for Document {
    fn from(
        UserMutation {
            username,
            gender,
            mobile,
            email,
            address,
            avatar_id,
            updated,
        }: UserMutation,
    ) -> Self {
        let mut mutation = doc! {};

        if let Some(v) = username {
            mutation.insert("username", v);
        }
        if let Some(v) = gender {
            mutation.insert("gender", v.as_str());
        }
        if let Some(v) = mobile {
            mutation.insert("mobile", v);
        }
        if let Some(v) = email {
            mutation.insert("email", v);
        }
        if let Some(v) = address {
            mutation.insert("address", v);
        }
        if let Some(v) = avatar_id {
            mutation.insert("avatar_id", v as i64);
        }
        if let Some(v) = updated {
            mutation.insert("updated", DateTime::from_chrono(v));
        }

        mutation
    }
}

impl From<FollowQuery> for Document {
    fn from(
        FollowQuery {
            uid,
            focus_uid,
            focus_uids,
            is_friend,
        }: FollowQuery,
    ) -> Self {
        let mut query = doc! {};

        if let Some(u) = uid {
            query.insert("uid", u as i64);
        }
        match (focus_uid, focus_uids) {
            (Some(u), _) => query.insert("focus_uid", u as i64).let_(::core::mem::drop),
            (None, Some(set)) => {
                let set = set.into_iter().map(|i| i as i64).collect::<Vec<_>>();
                query
                    .insert("focus_uid", doc! { "$in": set })
                    .let_(::core::mem::drop)
            },
            (None, None) => (),
        }
        if let Some(b) = is_friend {
            query.insert("is_friend", b);
        }

        query
    }
}

impl From<StatusQuery> for Document {
    fn from(
        StatusQuery {
            ids,
            uids,
            parent_id,
            from_types,
        }: StatusQuery,
    ) -> Self {
        let mut query = doc! { "deleted": null };

        if let Some(set) = ids {
            let set = set.into_iter().map(ObjectId::from).collect::<Vec<_>>();
            query.insert("_id", doc! { "$in": set });
        }
        if let Some(set) = uids {
            let set = set.into_iter().map(|i| i as i64).collect::<Vec<_>>();
            query.insert("uid", doc! { "$in": set });
        }
        if let Some(p) = parent_id {
            query.insert("parent_id", ObjectId::from(p));
        }
        if let Some(set) = from_types {
            let set = set.into_iter().map(|t| t.as_str()).collect::<Vec<_>>();
            query.insert("from_type", doc! { "$in": set });
        }

        query
    }
}

impl From<LikeQuery> for Document {
    fn from(
        LikeQuery {
            uid,
            target_ids,
            target_type,
        }: LikeQuery,
    ) -> Self {
        let target_ids = target_ids
            .into_iter()
            .map(ObjectId::from)
            .collect::<Vec<_>>();

        doc! {
            "uid": uid as i64,
            "target_id": { "$in": target_ids },
            "target_type": target_type.as_str(),
            "active": true,
        }
    }
}

/// Adds the `_id` upper bound to `filter` and returns the matching find options.
pub fn apply_window<K>(filter: &mut Document, Window { until, skip, limit }: Window<K>) -> FindOptions
where K: Into<ObjectId> {
    if let Some(k) = until {
        filter.insert("_id", doc! { "$lte": k.into() });
    }

    FindOptions::builder()
        .sort(doc! { "_id": -1 })
        .skip(skip)
        .limit(limit.map(|l| l as i64))
        .build()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entities::{FromType, StatusId};

    fn link_status() -> Status {
        let now = Utc::now();
        Status {
            id: StatusId::new(),
            parent_id: None,
            origin_id: None,
            uid: 7,
            from_type: FromType::Post,
            meta: StatusMeta::Link(LinkMeta {
                title: "t".to_string(),
                host: "example.com".to_string(),
                link: "https://example.com/a".to_string(),
                attachment_id: Some(3),
            }),
            content: "look".to_string(),
            comments_count: 0,
            likes_count: 2,
            forwards_count: 0,
            deleted: None,
            created: now,
            updated: now,
        }
    }

    #[test]
    fn link_meta_survives_the_model() {
        let status = link_status();
        let model = MongoStatusModel::from(status.clone());
        assert_eq!(model.status_type, "link");

        let back = Status::try_from(model).unwrap();
        assert_eq!(back.id, status.id);
        assert_eq!(back.meta.link().unwrap().attachment_id, Some(3));
        assert_eq!(back.likes_count, 2);
    }

    #[test]
    fn broken_documents_are_internal_errors() {
        let mut model = MongoStatusModel::from(link_status());
        model.link = None;
        assert!(matches!(
            Status::try_from(model),
            Err(RepositoryError::Internal(_))
        ));

        let mut model = MongoUserModel::from(User::new(1, "ext".to_string(), Utc::now()));
        model.gender = "???".to_string();
        assert!(matches!(
            User::try_from(model),
            Err(RepositoryError::Internal(_))
        ));
    }

    #[test]
    fn status_queries_skip_deleted() {
        let q = Document::from(StatusQuery {
            parent_id: Some(StatusId::new()),
            ..Default::default()
        });

        assert_eq!(q.get("deleted"), Some(&mongodb::bson::Bson::Null));
        assert!(q.contains_key("parent_id"));
        assert!(!q.contains_key("uid"));
    }
}

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoSequenceModel {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUserModel {
    #[serde(rename = "_id")]
    pub id: i64,
    pub username: String,
    pub external_id: String,
    pub gender: String,
    pub mobile: String,
    pub email: String,
    pub address: String,
    pub avatar_id: Option<i64>,
    pub following_count: i64,
    pub fans_count: i64,
    pub created: DateTime,
    pub updated: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoFollowModel {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uid: i64,
    pub focus_uid: i64,
    pub is_friend: bool,
    pub created: DateTime,
    pub updated: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoStatusModel {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub parent_id: Option<ObjectId>,
    pub origin_id: Option<ObjectId>,
    pub uid: i64,
    pub from_type: String,
    pub status_type: String,
    pub link: Option<MongoLinkMetaModel>,
    pub content: String,
    pub comments_count: i64,
    pub likes_count: i64,
    pub forwards_count: i64,
    pub deleted: Option<DateTime>,
    pub created: DateTime,
    pub updated: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoLinkMetaModel {
    pub title: String,
    pub host: String,
    pub link: String,
    pub attachment_id: Option<i64>,
}

/// `active` backs the partial unique index; it is cleared on unlike.
#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoLikeModel {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub uid: i64,
    pub target_id: ObjectId,
    pub target_type: String,
    pub active: bool,
    pub deleted: Option<DateTime>,
    pub created: DateTime,
    pub updated: DateTime,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoAttachmentModel {
    #[serde(rename = "_id")]
    pub id: i64,
    pub filename: String,
    pub file_type: String,
    pub created: DateTime,
    pub updated: DateTime,
}

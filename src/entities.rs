use core::fmt::{Display, Formatter, Result as FmtResult};
use core::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::errors::Error;

pub type UserId = u64;
pub type AttachmentId = u64;
pub type Date = DateTime<Utc>;

macro_rules! object_id {
    ($n:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $n(pub ObjectId);

        impl $n {
            pub fn new() -> Self { Self(ObjectId::new()) }
        }
        impl Default for $n {
            fn default() -> Self { Self::new() }
        }

        impl From<ObjectId> for $n {
            fn from(id: ObjectId) -> Self { Self(id) }
        }
        impl From<$n> for ObjectId {
            fn from($n(id): $n) -> Self { id }
        }

        impl Display for $n {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult { write!(f, "{}", self.0.to_hex()) }
        }
        impl FromStr for $n {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                ObjectId::parse_str(s)
                    .map(Self)
                    .map_err(|_| Error::InvalidArgument(format!("invalid id {}", s)))
            }
        }
    };
}

object_id!(StatusId);
object_id!(FollowId);
object_id!(LikeId);

macro_rules! string_enum {
    ($n:ident ($what:literal) { $( $v:ident => $s:literal ),+ $(,)? }) => {
        impl $n {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$v => $s, )+
                }
            }
        }

        impl Display for $n {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult { f.write_str(self.as_str()) }
        }

        impl FromStr for $n {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $s => Ok(Self::$v), )+
                    _ => Err(Error::InvalidArgument(format!(concat!("invalid ", $what, ": {}"), s))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    #[default]
    Other,
    Male,
    Female,
}
string_enum!(Gender ("gender") { Other => "other", Male => "male", Female => "female" });

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub external_id: String,
    pub gender: Gender,
    pub mobile: String,
    pub email: String,
    pub address: String,
    pub avatar_id: Option<AttachmentId>,
    pub following_count: i64,
    pub fans_count: i64,
    pub created: Date,
    pub updated: Date,
}

impl User {
    pub fn new(id: UserId, external_id: impl Into<String>, now: Date) -> Self {
        User {
            id,
            username: String::new(),
            external_id: external_id.into(),
            gender: Gender::Other,
            mobile: String::new(),
            email: String::new(),
            address: String::new(),
            avatar_id: None,
            following_count: 0,
            fans_count: 0,
            created: now,
            updated: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserCounter {
    Following,
    Fans,
}

impl UserCounter {
    pub fn field(&self) -> &'static str {
        match self {
            UserCounter::Following => "following_count",
            UserCounter::Fans => "fans_count",
        }
    }
}

/// Directed edge `uid -> focus_uid`.
#[derive(Debug, Clone)]
pub struct Follow {
    pub id: FollowId,
    pub uid: UserId,
    pub focus_uid: UserId,
    pub is_friend: bool,
    pub created: Date,
    pub updated: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    Fan,
    Following,
    Friend,
}
string_enum!(RelationType ("relation type") { Fan => "fan", Following => "following", Friend => "friend" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FromType {
    Post,
    Forward,
    Comment,
}
string_enum!(FromType ("from type") { Post => "post", Forward => "forward", Comment => "comment" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCounter {
    Comments,
    Likes,
    Forwards,
}

impl StatusCounter {
    pub fn field(&self) -> &'static str {
        match self {
            StatusCounter::Comments => "comments_count",
            StatusCounter::Likes => "likes_count",
            StatusCounter::Forwards => "forwards_count",
        }
    }
}

impl FromType {
    /// The counter bumped on related statuses when a status of this type is created.
    pub fn counter(&self) -> Option<StatusCounter> {
        match self {
            FromType::Post => None,
            FromType::Forward => Some(StatusCounter::Forwards),
            FromType::Comment => Some(StatusCounter::Comments),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusType {
    Text,
    Link,
}
string_enum!(StatusType ("status type") { Text => "text", Link => "link" });

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkMeta {
    pub title: String,
    pub host: String,
    pub link: String,
    pub attachment_id: Option<AttachmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMeta {
    Text,
    Link(LinkMeta),
}

impl StatusMeta {
    pub fn status_type(&self) -> StatusType {
        match self {
            StatusMeta::Text => StatusType::Text,
            StatusMeta::Link(_) => StatusType::Link,
        }
    }

    pub fn link(&self) -> Option<&LinkMeta> {
        match self {
            StatusMeta::Link(l) => Some(l),
            StatusMeta::Text => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Status {
    pub id: StatusId,
    pub parent_id: Option<StatusId>,
    pub origin_id: Option<StatusId>,
    pub uid: UserId,
    pub from_type: FromType,
    pub meta: StatusMeta,
    pub content: String,
    pub comments_count: u64,
    pub likes_count: u64,
    pub forwards_count: u64,
    pub deleted: Option<Date>,
    pub created: Date,
    pub updated: Date,
}

impl Status {
    pub fn status_type(&self) -> StatusType { self.meta.status_type() }

    pub fn counter_mut(&mut self, counter: StatusCounter) -> &mut u64 {
        match counter {
            StatusCounter::Comments => &mut self.comments_count,
            StatusCounter::Likes => &mut self.likes_count,
            StatusCounter::Forwards => &mut self.forwards_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTargetType {
    Status,
}
string_enum!(LikeTargetType ("like target type") { Status => "status" });

#[derive(Debug, Clone)]
pub struct Like {
    pub id: LikeId,
    pub uid: UserId,
    pub target_id: StatusId,
    pub target_type: LikeTargetType,
    pub deleted: Option<Date>,
    pub created: Date,
    pub updated: Date,
}

impl Like {
    pub fn is_active(&self) -> bool { self.deleted.is_none() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Image,
    Video,
}
string_enum!(FileType ("file type") { Image => "image", Video => "video" });

#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    pub file_type: FileType,
    pub created: Date,
    pub updated: Date,
}

impl Attachment {
    /// Storage directory of the file, relative to the upload prefix.
    pub fn file_path(&self) -> String {
        format!("attachment/{}/{}/", self.created.format("%Y/%m/%d"), self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    pub seq: u64,
}

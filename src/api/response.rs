use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};

use crate::entities::{Attachment, AttachmentId, UserId};
use crate::views::{FriendshipView, StatusView, UserView};

/// Success envelope shared by every route.
#[derive(Debug, ::serde::Serialize)]
pub struct Envelope<T, P = ()> {
    code: u32,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<P>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            data,
            pagination: None,
        }
    }
}

impl<T, P> Envelope<T, P> {
    pub fn paged(data: T, pagination: P) -> Self {
        Self {
            code: 0,
            data,
            pagination: Some(pagination),
        }
    }
}

impl<T, P> IntoResponse for Envelope<T, P>
where
    T: ::serde::Serialize,
    P: ::serde::Serialize,
{
    fn into_response(self) -> Response { Json(self).into_response() }
}

#[derive(Debug, ::serde::Serialize)]
pub struct AvatarResp {
    pub small: String,
    pub medium: String,
    pub large: String,
}

#[derive(Debug, ::serde::Serialize)]
pub struct UserResp {
    pub uid: UserId,
    pub username: String,
    pub gender: &'static str,
    pub mobile: String,
    pub email: String,
    pub address: String,
    pub avatar: Option<AvatarResp>,
    pub is_followed: bool,
    pub following_count: i64,
    pub fans_count: i64,
}

impl From<UserView> for UserResp {
    fn from(
        UserView {
            user,
            avatar_url,
            is_followed,
        }: UserView,
    ) -> Self {
        UserResp {
            uid: user.id,
            username: user.username,
            gender: user.gender.as_str(),
            mobile: user.mobile,
            email: user.email,
            address: user.address,
            avatar: avatar_url.map(|url| AvatarResp {
                small: url.clone(),
                medium: url.clone(),
                large: url,
            }),
            is_followed,
            following_count: user.following_count,
            fans_count: user.fans_count,
        }
    }
}

#[derive(Debug, ::serde::Serialize)]
pub struct LinkMetaResp {
    pub title: String,
    pub host: String,
    pub link: String,
    pub attachment_id: Option<AttachmentId>,
    pub attachment_url: Option<String>,
}

#[derive(Debug, ::serde::Serialize)]
pub struct StatusResp {
    pub id: String,
    pub user: Option<UserResp>,
    pub content: String,
    pub from_type: &'static str,
    pub status_type: &'static str,
    pub parent_status: Option<Box<StatusResp>>,
    pub origin_status: Option<Box<StatusResp>>,
    pub comments_count: u64,
    pub likes_count: u64,
    pub forwards_count: u64,
    pub is_liked: bool,
    pub link_meta: Option<LinkMetaResp>,
    pub created_at: DateTime<Utc>,
}

impl From<StatusView> for StatusResp {
    fn from(
        StatusView {
            status,
            user,
            parent,
            origin,
            is_liked,
            attachment_url,
        }: StatusView,
    ) -> Self {
        let link_meta = status.meta.link().map(|l| LinkMetaResp {
            title: l.title.clone(),
            host: l.host.clone(),
            link: l.link.clone(),
            attachment_id: l.attachment_id,
            attachment_url,
        });

        StatusResp {
            id: status.id.to_string(),
            user: user.map(Into::into),
            from_type: status.from_type.as_str(),
            status_type: status.status_type().as_str(),
            parent_status: parent.map(|p| Box::new((*p).into())),
            origin_status: origin.map(|o| Box::new((*o).into())),
            comments_count: status.comments_count,
            likes_count: status.likes_count,
            forwards_count: status.forwards_count,
            is_liked,
            link_meta,
            created_at: status.created,
            content: status.content,
        }
    }
}

#[derive(Debug, ::serde::Serialize)]
pub struct FriendshipResp {
    pub user: UserResp,
    pub relation_type: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<FriendshipView> for FriendshipResp {
    fn from(v: FriendshipView) -> Self {
        FriendshipResp {
            user: v.user.into(),
            relation_type: v.relation.as_str(),
            created_at: v.created,
        }
    }
}

#[derive(Debug, ::serde::Serialize)]
pub struct AttachmentResp {
    pub id: AttachmentId,
    pub filename: String,
    pub file_type: &'static str,
    pub url: String,
}

impl AttachmentResp {
    pub fn new(attachment: Attachment, url: String) -> Self {
        AttachmentResp {
            id: attachment.id,
            file_type: attachment.file_type.as_str(),
            filename: attachment.filename,
            url,
        }
    }
}

#[derive(Debug, ::serde::Serialize)]
pub struct SignInResp {
    pub token: String,
}

pub fn statuses(views: Vec<StatusView>) -> Vec<StatusResp> {
    views.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_omits_missing_pagination() {
        let v = serde_json::to_value(Envelope::ok(())).unwrap();
        assert_eq!(v, json!({ "code": 0, "data": null }));

        let v = serde_json::to_value(Envelope::paged(vec![1], json!({ "limit": 1 }))).unwrap();
        assert_eq!(v["pagination"]["limit"], 1);
    }
}

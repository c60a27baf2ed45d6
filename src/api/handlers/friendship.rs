use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use super::parse_uid;
use crate::api::auth::{CurrentUser, MaybeUser};
use crate::api::response::{Envelope, FriendshipResp};
use crate::api::AppState;
use crate::entities::{RelationType, UserId};
use crate::errors::Result;
use crate::pagination::{OffsetPagination, OffsetParams};
use crate::usecases::follow::{follow, list_friendship, unfollow};

#[derive(Debug, ::serde::Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    relation_type: String,
    #[serde(default)]
    page: i64,
    #[serde(default)]
    per_page: i64,
}

pub async fn list(
    State(app): State<AppState>,
    viewer: MaybeUser,
    Path(uid): Path<String>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope<Vec<FriendshipResp>, OffsetPagination>> {
    let user_id = parse_uid(&uid)?;
    let Query(query) = query?;

    // unknown relation types list fans
    let relation = query
        .relation_type
        .parse::<RelationType>()
        .unwrap_or(RelationType::Fan);

    let list_friendship::Output {
        friendships,
        pagination,
    } = app
        .list_friendship
        .handle(list_friendship::Input {
            viewer: viewer.uid(),
            user_id,
            relation,
            page: OffsetParams::new(query.page, query.per_page),
        })
        .await?;

    Ok(Envelope::paged(
        friendships.into_iter().map(Into::into).collect(),
        pagination,
    ))
}

#[derive(Debug, ::serde::Deserialize)]
pub struct FollowBody {
    to_user_id: UserId,
}

pub async fn follow(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    body: std::result::Result<Json<FollowBody>, JsonRejection>,
) -> Result<Envelope<()>> {
    let Json(FollowBody { to_user_id }) = body?;

    app.follow
        .handle(follow::Input {
            user_id: me.uid,
            target_id: to_user_id,
        })
        .await?;

    Ok(Envelope::ok(()))
}

pub async fn unfollow(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    query: std::result::Result<Query<FollowBody>, QueryRejection>,
) -> Result<Envelope<()>> {
    let Query(FollowBody { to_user_id }) = query?;

    app.unfollow
        .handle(unfollow::Input {
            user_id: me.uid,
            target_id: to_user_id,
        })
        .await?;

    Ok(Envelope::ok(()))
}

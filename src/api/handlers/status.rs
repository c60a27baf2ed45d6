use std::collections::HashSet;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use super::parse_uid;
use crate::api::auth::{CurrentUser, MaybeUser};
use crate::api::response::{self, Envelope, StatusResp};
use crate::api::AppState;
use crate::entities::{FromType, StatusId, StatusType};
use crate::errors::Result;
use crate::pagination::{QuickPagination, QuickParams};
use crate::usecases::like::{like, unlike};
use crate::usecases::status::{comments, create, delete, get, list, recommend, timeline};

type Page = Envelope<Vec<StatusResp>, QuickPagination>;

#[derive(Debug, ::serde::Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    limit: i64,
    #[serde(default)]
    next_id: String,
    /// Comma separated, e.g. `post,forward`.
    #[serde(default)]
    from_types: String,
}

impl PageQuery {
    fn params(&self) -> QuickParams { QuickParams::new(self.limit, self.next_id.clone()) }

    fn from_types(&self) -> Result<Option<HashSet<FromType>>> {
        if self.from_types.is_empty() {
            return Ok(None);
        }

        self.from_types
            .split(',')
            .map(|t| t.trim().parse::<FromType>())
            .collect::<Result<HashSet<_>>>()
            .map(Some)
    }
}

fn parse_status_id(raw: &str) -> Result<StatusId> { raw.parse() }

pub async fn list_by_user(
    State(app): State<AppState>,
    viewer: MaybeUser,
    Path(uid): Path<String>,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Page> {
    let user_id = parse_uid(&uid)?;
    let Query(query) = query?;

    let list::Output {
        statuses,
        pagination,
    } = app
        .status_list
        .handle(list::Input {
            viewer: viewer.uid(),
            user_ids: Some(HashSet::from([user_id])),
            parent_id: None,
            from_types: query.from_types()?,
            page: query.params(),
        })
        .await?;

    Ok(Envelope::paged(response::statuses(statuses), pagination))
}

pub async fn timeline(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Page> {
    let Query(query) = query?;

    let timeline::Output {
        statuses,
        pagination,
    } = app
        .timeline
        .handle(timeline::Input {
            user_id: me.uid,
            page: query.params(),
        })
        .await?;

    Ok(Envelope::paged(response::statuses(statuses), pagination))
}

pub async fn recommend(
    State(app): State<AppState>,
    viewer: MaybeUser,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Page> {
    let Query(query) = query?;

    let recommend::Output {
        statuses,
        pagination,
    } = app
        .recommend
        .handle(recommend::Input {
            viewer: viewer.uid(),
            page: query.params(),
        })
        .await?;

    Ok(Envelope::paged(response::statuses(statuses), pagination))
}

pub async fn find(
    State(app): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<String>,
) -> Result<Envelope<StatusResp>> {
    let get::Output { status } = app
        .status_get
        .handle(get::Input {
            viewer: viewer.uid(),
            status_id: parse_status_id(&id)?,
        })
        .await?;

    Ok(Envelope::ok(status.into()))
}

#[derive(Debug, ::serde::Deserialize)]
pub struct CreateBody {
    status_type: String,
    #[serde(default)]
    parent_status_id: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    meta: Option<::serde_json::Value>,
}

/// A parent turns the new status into a forward.
pub async fn create(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    body: std::result::Result<Json<CreateBody>, JsonRejection>,
) -> Result<Envelope<StatusResp>> {
    let Json(body) = body?;

    let parent_id = body
        .parent_status_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status_id)
        .transpose()?;

    let create::Output { status } = app
        .status_create
        .handle(create::Input {
            user_id: me.uid,
            parent_id,
            from_type: match parent_id {
                Some(_) => FromType::Forward,
                None => FromType::Post,
            },
            status_type: body.status_type,
            meta: body.meta,
            content: body.content,
        })
        .await?;

    Ok(Envelope::ok(status.into()))
}

pub async fn remove(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    app.status_delete
        .handle(delete::Input {
            user_id: me.uid,
            status_id: parse_status_id(&id)?,
        })
        .await?;

    Ok(Envelope::ok(()))
}

pub async fn like(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    app.like
        .handle(like::Input {
            user_id: me.uid,
            status_id: parse_status_id(&id)?,
        })
        .await?;

    Ok(Envelope::ok(()))
}

pub async fn unlike(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    app.unlike
        .handle(unlike::Input {
            user_id: me.uid,
            status_id: parse_status_id(&id)?,
        })
        .await?;

    Ok(Envelope::ok(()))
}

#[derive(Debug, ::serde::Deserialize)]
pub struct CommentQuery {
    commentable_id: String,
    #[serde(default)]
    limit: i64,
    #[serde(default)]
    next_id: String,
}

pub async fn list_comments(
    State(app): State<AppState>,
    viewer: MaybeUser,
    query: std::result::Result<Query<CommentQuery>, QueryRejection>,
) -> Result<Page> {
    let Query(query) = query?;

    let comments::Output {
        statuses,
        pagination,
    } = app
        .comments
        .handle(comments::Input {
            viewer: viewer.uid(),
            status_id: parse_status_id(&query.commentable_id)?,
            page: QuickParams::new(query.limit, query.next_id),
        })
        .await?;

    Ok(Envelope::paged(response::statuses(statuses), pagination))
}

#[derive(Debug, ::serde::Deserialize)]
pub struct CommentBody {
    commentable_id: String,
    #[serde(default)]
    content: String,
}

pub async fn create_comment(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    body: std::result::Result<Json<CommentBody>, JsonRejection>,
) -> Result<Envelope<StatusResp>> {
    let Json(body) = body?;

    let create::Output { status } = app
        .status_create
        .handle(create::Input {
            user_id: me.uid,
            parent_id: Some(parse_status_id(&body.commentable_id)?),
            from_type: FromType::Comment,
            status_type: StatusType::Text.as_str().to_string(),
            meta: None,
            content: body.content,
        })
        .await?;

    Ok(Envelope::ok(status.into()))
}

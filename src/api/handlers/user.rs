use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::parse_uid;
use crate::api::auth::{CurrentUser, MaybeUser};
use crate::api::response::{Envelope, SignInResp, UserResp};
use crate::api::AppState;
use crate::entities::{AttachmentId, Gender};
use crate::errors::{Error, Result};
use crate::usecases::user::{edit_profile, get, rename, set_avatar, sign_in};

#[derive(Debug, ::serde::Deserialize)]
pub struct UserAuthz {
    #[serde(alias = "misesid")]
    external_id: String,
    #[serde(default)]
    auth_code: String,
}

#[derive(Debug, ::serde::Deserialize)]
pub struct SignInBody {
    user_authz: UserAuthz,
}

pub async fn sign_in(
    State(app): State<AppState>,
    body: std::result::Result<Json<SignInBody>, JsonRejection>,
) -> Result<Envelope<SignInResp>> {
    let Json(SignInBody { user_authz }) = body?;

    let sign_in::Output { token, .. } = app
        .sign_in
        .handle(sign_in::Input {
            external_id: user_authz.external_id,
            auth_code: user_authz.auth_code,
        })
        .await?;

    Ok(Envelope::ok(SignInResp { token }))
}

pub async fn me(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> Result<Envelope<UserResp>> {
    let get::Output { user } = app
        .user_get
        .handle(get::Input {
            viewer: Some(me.uid),
            user_id: me.uid,
        })
        .await?;

    Ok(Envelope::ok(user.into()))
}

pub async fn find(
    State(app): State<AppState>,
    viewer: MaybeUser,
    Path(uid): Path<String>,
) -> Result<Envelope<UserResp>> {
    let get::Output { user } = app
        .user_get
        .handle(get::Input {
            viewer: viewer.uid(),
            user_id: parse_uid(&uid)?,
        })
        .await?;

    Ok(Envelope::ok(user.into()))
}

#[derive(Debug, Default, ::serde::Deserialize)]
pub struct ProfileBody {
    gender: Option<String>,
    mobile: Option<String>,
    email: Option<String>,
    address: Option<String>,
}

#[derive(Debug, ::serde::Deserialize)]
pub struct AvatarBody {
    attachment_id: AttachmentId,
}

/// `by` picks which part of the profile the request changes.
#[derive(Debug, ::serde::Deserialize)]
pub struct UpdateBody {
    by: String,
    profile: Option<ProfileBody>,
    username: Option<String>,
    avatar: Option<AvatarBody>,
}

pub async fn update_me(
    State(app): State<AppState>,
    CurrentUser(me): CurrentUser,
    body: std::result::Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Envelope<UserResp>> {
    let Json(body) = body?;

    let user = match body.by.as_str() {
        "profile" => {
            let profile = body.profile.unwrap_or_default();
            let gender = profile
                .gender
                .as_deref()
                .map(str::parse::<Gender>)
                .transpose()?;

            app.user_edit_profile
                .handle(edit_profile::Input {
                    user_id: me.uid,
                    gender,
                    mobile: profile.mobile,
                    email: profile.email,
                    address: profile.address,
                })
                .await?
                .user
        },
        "username" => {
            app.user_rename
                .handle(rename::Input {
                    user_id: me.uid,
                    username: body.username.unwrap_or_default(),
                })
                .await?
                .user
        },
        "avatar" => {
            let avatar = body
                .avatar
                .ok_or_else(|| Error::InvalidArgument("avatar is required".to_string()))?;

            app.user_set_avatar
                .handle(set_avatar::Input {
                    user_id: me.uid,
                    attachment_id: avatar.attachment_id,
                })
                .await?
                .user
        },
        by => return Err(Error::InvalidArgument(format!("invalid update by {}", by))),
    };

    Ok(Envelope::ok(user.into()))
}

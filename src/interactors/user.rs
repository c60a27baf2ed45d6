use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;

use super::preload::Preloader;
use super::{attachment_err_fmt, sequence_err_fmt, user_err_fmt};
use crate::entities::User;
use crate::errors::{Error, Result};
use crate::repositories::{
    AttachmentRepository, RepositoryError, SequenceRepository, UserMutation, UserQuery,
    UserRepository,
};
use crate::session::{IdentityVerifier, Sessions};
use crate::usecases::user::{authenticate, edit_profile, get, rename, set_avatar, sign_in};
use crate::utils::{AlsoChain, LetChain};

pub(crate) const USER_SEQUENCE: &str = "userid";

lazy_static::lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^\w{2,20}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^\w+@[a-z0-9]+(\.[a-z]+){1,3}$").unwrap();
}

pub struct SignInInteractor {
    pub verifier: Arc<dyn IdentityVerifier + Sync + Send>,
    pub sessions: Arc<Sessions>,
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub sequence_repository: Arc<dyn SequenceRepository + Sync + Send>,
}

impl SignInInteractor {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.user_repository
            .finds(UserQuery {
                external_id: Some(external_id.to_string()),
                ..Default::default()
            })
            .await
            .map_err(user_err_fmt)
            .map(|mut v| v.pop())
    }
}

#[async_trait]
impl sign_in::Usecase for SignInInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: sign_in::Input) -> Result<sign_in::Output> {
        tracing::trace!("input - {:?}", data);

        let sign_in::Input {
            external_id,
            auth_code,
        } = data;

        self.verifier
            .verify(&external_id, &auth_code)
            .await
            .map_err(|e| {
                tracing::warn!("identity verification failed: {}", e);
                Error::InvalidAuth
            })?;

        let user = match self.find_by_external_id(&external_id).await? {
            Some(u) => u,
            None => {
                let id = self
                    .sequence_repository
                    .next(USER_SEQUENCE)
                    .await
                    .map_err(sequence_err_fmt)?;
                let new_user = User::new(id, external_id.clone(), Utc::now());

                match self
                    .user_repository
                    .insert(new_user.clone())
                    .await
                    .map_err(user_err_fmt)?
                {
                    true => new_user,
                    false => self
                        .find_by_external_id(&external_id)
                        .await?
                        .ok_or(Error::NotFound("user"))?,
                }
            },
        };

        let token = self.sessions.issue(&user)?;

        Ok(sign_in::Output { token, user }.also_(|o| tracing::trace!("output - {:?}", o.user)))
    }
}

pub struct AuthenticateInteractor {
    pub sessions: Arc<Sessions>,
}
#[async_trait]
impl authenticate::Usecase for AuthenticateInteractor {
    async fn handle(&self, data: authenticate::Input) -> Result<authenticate::Output> {
        let authenticate::Input { token } = data;

        self.sessions
            .authenticate(&token)
            .map(|identity| authenticate::Output { identity })
    }
}

pub struct UserGetInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl get::Usecase for UserGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { viewer, user_id } = data;

        let user = self
            .user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?;

        self.preloader
            .user(viewer, user)
            .await?
            .let_(|user| get::Output { user })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserEditProfileInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl edit_profile::Usecase for UserEditProfileInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: edit_profile::Input) -> Result<edit_profile::Output> {
        tracing::trace!("input - {:?}", data);

        let edit_profile::Input {
            user_id,
            gender,
            mobile,
            email,
            address,
        } = data;

        if let Some(ref e) = email {
            if !e.is_empty() && !EMAIL_RE.is_match(e) {
                return Err(Error::Unprocessable(format!("invalid email {}", e)));
            }
        }

        let mutation = UserMutation {
            gender,
            mobile,
            email,
            address,
            updated: Some(Utc::now()),
            ..Default::default()
        };

        let user = self
            .user_repository
            .update(user_id, mutation)
            .await
            .map_err(user_err_fmt)?;

        self.preloader
            .user(Some(user_id), user)
            .await?
            .let_(|user| edit_profile::Output { user })
            .let_(Ok)
    }
}

pub struct UserRenameInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl rename::Usecase for UserRenameInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: rename::Input) -> Result<rename::Output> {
        tracing::trace!("input - {:?}", data);

        let rename::Input { user_id, username } = data;

        if !USERNAME_RE.is_match(&username) {
            return Err(Error::Unprocessable(format!("invalid username {}", username)));
        }

        let taken = self
            .user_repository
            .count(UserQuery {
                username: Some(username.clone()),
                exclude_id: Some(user_id),
                ..Default::default()
            })
            .await
            .map_err(user_err_fmt)?;
        if taken > 0 {
            return Err(Error::UsernameExisted);
        }

        let mutation = UserMutation {
            username: Some(username),
            updated: Some(Utc::now()),
            ..Default::default()
        };

        let user = match self.user_repository.update(user_id, mutation).await {
            Ok(u) => u,
            Err(RepositoryError::NoUnique { .. }) => return Err(Error::UsernameExisted),
            Err(e) => return Err(user_err_fmt(e)),
        };

        self.preloader
            .user(Some(user_id), user)
            .await?
            .let_(|user| rename::Output { user })
            .let_(Ok)
    }
}

pub struct UserSetAvatarInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub attachment_repository: Arc<dyn AttachmentRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl set_avatar::Usecase for UserSetAvatarInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: set_avatar::Input) -> Result<set_avatar::Output> {
        tracing::trace!("input - {:?}", data);

        let set_avatar::Input {
            user_id,
            attachment_id,
        } = data;

        self.attachment_repository
            .find(attachment_id)
            .await
            .map_err(attachment_err_fmt)?;

        let mutation = UserMutation {
            avatar_id: Some(attachment_id),
            updated: Some(Utc::now()),
            ..Default::default()
        };

        let user = self
            .user_repository
            .update(user_id, mutation)
            .await
            .map_err(user_err_fmt)?;

        self.preloader
            .user(Some(user_id), user)
            .await?
            .let_(|user| set_avatar::Output { user })
            .let_(Ok)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::entities::Gender;
    use crate::interactors::testing::Fixture;
    use crate::repositories::AttachmentRepository as _;
    use crate::session::PassthroughVerifier;

    fn sign_in(f: &Fixture) -> SignInInteractor {
        SignInInteractor {
            verifier: Arc::new(PassthroughVerifier),
            sessions: Arc::new(Sessions::new("secret", Duration::hours(1))),
            user_repository: f.users.clone(),
            sequence_repository: f.sequences.clone(),
        }
    }

    fn rename(f: &Fixture) -> UserRenameInteractor {
        UserRenameInteractor {
            user_repository: f.users.clone(),
            preloader: f.preloader(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn sign_in_creates_user_once() {
        let f = Fixture::new();
        let i = sign_in(&f);
        let input = || sign_in::Input {
            external_id: "did:test:alice".to_string(),
            auth_code: "code".to_string(),
        };

        let first = sign_in::Usecase::handle(&i, input()).await.unwrap();
        let second = sign_in::Usecase::handle(&i, input()).await.unwrap();

        assert_eq!(first.user.id, 1);
        assert_eq!(second.user.id, 1);
        assert_eq!(
            i.sessions.authenticate(&second.token).unwrap().uid,
            first.user.id
        );
    }

    #[tokio::test]
    async fn sign_in_rejects_empty_identity() {
        let f = Fixture::new();

        let res = sign_in::Usecase::handle(&sign_in(&f), sign_in::Input {
            external_id: String::new(),
            auth_code: String::new(),
        })
        .await;

        assert!(matches!(res, Err(Error::InvalidAuth)));
    }

    #[tokio::test]
    async fn rename_validates_and_detects_duplicates() {
        let f = Fixture::new();
        f.user(1).await;
        f.user(2).await;
        let i = rename(&f);
        let input = |user_id, username: &str| rename::Input {
            user_id,
            username: username.to_string(),
        };

        let bad = rename::Usecase::handle(&i, input(1, "a")).await;
        assert!(matches!(bad, Err(Error::Unprocessable(_))));

        let ok = rename::Usecase::handle(&i, input(1, "alice")).await.unwrap();
        assert_eq!(ok.user.user.username, "alice");

        let again = rename::Usecase::handle(&i, input(1, "alice")).await;
        assert!(again.is_ok());

        let dup = rename::Usecase::handle(&i, input(2, "alice")).await;
        assert!(matches!(dup, Err(Error::UsernameExisted)));
    }

    #[tokio::test]
    async fn profile_email_is_checked() {
        let f = Fixture::new();
        f.user(1).await;
        let i = UserEditProfileInteractor {
            user_repository: f.users.clone(),
            preloader: f.preloader(),
        };
        let input = |email: &str| edit_profile::Input {
            user_id: 1,
            gender: Some(Gender::Female),
            mobile: None,
            email: Some(email.to_string()),
            address: None,
        };

        let bad = edit_profile::Usecase::handle(&i, input("nope")).await;
        assert!(matches!(bad, Err(Error::Unprocessable(_))));

        edit_profile::Usecase::handle(&i, input("bob@example.com"))
            .await
            .unwrap();
        let user = f.find_user(1).await;
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(user.gender, Gender::Female);
    }

    #[tokio::test]
    async fn avatar_needs_existing_attachment() {
        let f = Fixture::new();
        f.user(1).await;
        let i = UserSetAvatarInteractor {
            user_repository: f.users.clone(),
            attachment_repository: f.attachments.clone(),
            preloader: f.preloader(),
        };

        let missing = set_avatar::Usecase::handle(&i, set_avatar::Input {
            user_id: 1,
            attachment_id: 9,
        })
        .await;
        assert!(matches!(missing, Err(Error::NotFound("attachment"))));

        f.attachments.insert(Fixture::attachment(9)).await.unwrap();
        let out = set_avatar::Usecase::handle(&i, set_avatar::Input {
            user_id: 1,
            attachment_id: 9,
        })
        .await
        .unwrap();

        let url = out.user.avatar_url.unwrap();
        assert!(url.starts_with("http://assets.test/upload/attachment/"));
        assert!(url.ends_with("/9/9.png"));
    }
}

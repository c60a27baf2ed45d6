use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{attachment_err_fmt, follow_err_fmt, like_err_fmt, status_err_fmt, user_err_fmt};
use crate::entities::{Attachment, AttachmentId, LikeTargetType, Status, StatusId, User, UserId};
use crate::errors::Result;
use crate::repositories::{
    AttachmentRepository, FollowQuery, FollowRepository, LikeQuery, LikeRepository, StatusQuery,
    StatusRepository, UserQuery, UserRepository, Window,
};
use crate::storage::file_url;
use crate::views::{StatusView, UserView};

/// Batch enrichment of statuses and users into views.
///
/// Every kind of related record is loaded with a single query per call, never
/// one per item.
pub struct Preloader {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub follow_repository: Arc<dyn FollowRepository + Sync + Send>,
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub attachment_repository: Arc<dyn AttachmentRepository + Sync + Send>,
    pub asset_host: String,
}

impl Preloader {
    #[tracing::instrument(skip(self, users), fields(users = users.len()))]
    pub async fn users(&self, viewer: Option<UserId>, users: Vec<User>) -> Result<Vec<UserView>> {
        if users.is_empty() {
            return Ok(vec![]);
        }

        let avatar_ids = users.iter().filter_map(|u| u.avatar_id).collect();
        let attachments = self.attachments(avatar_ids).await?;
        let followed = self
            .followed(viewer, users.iter().map(|u| u.id).collect())
            .await?;

        Ok(users
            .into_iter()
            .map(|u| self.user_view(u, &attachments, &followed))
            .collect())
    }

    pub async fn user(&self, viewer: Option<UserId>, user: User) -> Result<UserView> {
        let mut views = self.users(viewer, vec![user]).await?;

        Ok(views.remove(0))
    }

    #[tracing::instrument(skip(self, statuses), fields(statuses = statuses.len()))]
    pub async fn statuses(
        &self,
        viewer: Option<UserId>,
        statuses: Vec<Status>,
    ) -> Result<Vec<StatusView>> {
        if statuses.is_empty() {
            return Ok(vec![]);
        }

        let related_ids = statuses
            .iter()
            .flat_map(|s| s.parent_id.into_iter().chain(s.origin_id))
            .collect::<HashSet<_>>();
        let related = match related_ids.is_empty() {
            true => HashMap::new(),
            false => self
                .status_repository
                .finds(
                    StatusQuery {
                        ids: Some(related_ids),
                        ..Default::default()
                    },
                    Window::all(),
                )
                .await
                .map_err(status_err_fmt)?
                .into_iter()
                .map(|s| (s.id, s))
                .collect::<HashMap<_, _>>(),
        };

        let involved = || statuses.iter().chain(related.values());

        let user_ids = involved().map(|s| s.uid).collect::<HashSet<_>>();
        let users = self
            .user_repository
            .finds(UserQuery {
                ids: Some(user_ids.clone()),
                ..Default::default()
            })
            .await
            .map_err(user_err_fmt)?;

        let attachment_ids = users
            .iter()
            .filter_map(|u| u.avatar_id)
            .chain(
                involved()
                    .filter_map(|s| s.meta.link())
                    .filter_map(|l| l.attachment_id),
            )
            .collect();
        let attachments = self.attachments(attachment_ids).await?;

        let followed = self.followed(viewer, user_ids).await?;
        let liked = self
            .liked(viewer, involved().map(|s| s.id).collect())
            .await?;

        let users = users
            .into_iter()
            .map(|u| (u.id, self.user_view(u, &attachments, &followed)))
            .collect::<HashMap<_, _>>();

        let assemble = |status: Status| {
            let attachment_url = status
                .meta
                .link()
                .and_then(|l| l.attachment_id)
                .and_then(|id| attachments.get(&id))
                .map(|a| file_url(&self.asset_host, a));

            StatusView {
                user: users.get(&status.uid).cloned(),
                is_liked: liked.contains(&status.id),
                parent: None,
                origin: None,
                attachment_url,
                status,
            }
        };

        Ok(statuses
            .into_iter()
            .map(|s| {
                let parent = s.parent_id.and_then(|id| related.get(&id));
                let origin = s.origin_id.and_then(|id| related.get(&id));

                StatusView {
                    parent: parent.cloned().map(|p| Box::new(assemble(p))),
                    origin: origin.cloned().map(|o| Box::new(assemble(o))),
                    ..assemble(s)
                }
            })
            .collect())
    }

    pub async fn status(&self, viewer: Option<UserId>, status: Status) -> Result<StatusView> {
        let mut views = self.statuses(viewer, vec![status]).await?;

        Ok(views.remove(0))
    }

    fn user_view(
        &self,
        user: User,
        attachments: &HashMap<AttachmentId, Attachment>,
        followed: &HashSet<UserId>,
    ) -> UserView {
        UserView {
            avatar_url: user
                .avatar_id
                .and_then(|id| attachments.get(&id))
                .map(|a| file_url(&self.asset_host, a)),
            is_followed: followed.contains(&user.id),
            user,
        }
    }

    async fn attachments(
        &self,
        ids: HashSet<AttachmentId>,
    ) -> Result<HashMap<AttachmentId, Attachment>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .attachment_repository
            .finds(ids)
            .await
            .map_err(attachment_err_fmt)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect())
    }

    async fn followed(
        &self,
        viewer: Option<UserId>,
        candidates: HashSet<UserId>,
    ) -> Result<HashSet<UserId>> {
        let viewer = match viewer {
            Some(v) if !candidates.is_empty() => v,
            _ => return Ok(HashSet::new()),
        };

        Ok(self
            .follow_repository
            .finds(
                FollowQuery {
                    uid: Some(viewer),
                    focus_uids: Some(candidates),
                    ..Default::default()
                },
                Window::all(),
            )
            .await
            .map_err(follow_err_fmt)?
            .into_iter()
            .map(|f| f.focus_uid)
            .collect())
    }

    async fn liked(
        &self,
        viewer: Option<UserId>,
        targets: HashSet<StatusId>,
    ) -> Result<HashSet<StatusId>> {
        let viewer = match viewer {
            Some(v) if !targets.is_empty() => v,
            _ => return Ok(HashSet::new()),
        };

        Ok(self
            .like_repository
            .finds(LikeQuery {
                uid: viewer,
                target_ids: targets,
                target_type: LikeTargetType::Status,
            })
            .await
            .map_err(like_err_fmt)?
            .into_iter()
            .map(|l| l.target_id)
            .collect())
    }
}

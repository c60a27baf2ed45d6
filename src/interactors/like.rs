use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{like_err_fmt, status_err_fmt};
use crate::entities::{Like, LikeId, LikeTargetType, StatusCounter, StatusId, UserId};
use crate::errors::Result;
use crate::repositories::{LikeRepository, RepositoryError, StatusRepository};
use crate::usecases::like::{like, unlike};
use crate::utils::AlsoChain;

async fn find_active(
    repo: &(dyn LikeRepository + Sync + Send),
    uid: UserId,
    target_id: StatusId,
) -> Result<Option<Like>> {
    match repo.find(uid, target_id, LikeTargetType::Status).await {
        Ok(l) => Ok(Some(l)),
        Err(RepositoryError::NotFound) => Ok(None),
        Err(e) => Err(like_err_fmt(e)),
    }
}

pub struct LikeInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
}
#[async_trait]
impl like::Usecase for LikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: like::Input) -> Result<like::Output> {
        tracing::trace!("input - {:?}", data);

        let like::Input { user_id, status_id } = data;

        self.status_repository
            .find(status_id)
            .await
            .map_err(status_err_fmt)?;

        let repo = &*self.like_repository;
        if let Some(existing) = find_active(repo, user_id, status_id).await? {
            return Ok(like::Output { like: existing });
        }

        let now = Utc::now();
        let new_like = Like {
            id: LikeId::new(),
            uid: user_id,
            target_id: status_id,
            target_type: LikeTargetType::Status,
            deleted: None,
            created: now,
            updated: now,
        };

        let inserted = repo
            .insert(new_like.clone())
            .await
            .map_err(like_err_fmt)?;
        if !inserted {
            tracing::debug!("lost a like race, reading the winner");
            let like = repo
                .find(user_id, status_id, LikeTargetType::Status)
                .await
                .map_err(like_err_fmt)?;
            return Ok(like::Output { like });
        }

        // not atomic with the insert above
        self.status_repository
            .inc_counter(status_id, StatusCounter::Likes, 1)
            .await
            .map_err(status_err_fmt)?;

        Ok(like::Output { like: new_like }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

pub struct UnlikeInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
}
#[async_trait]
impl unlike::Usecase for UnlikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: unlike::Input) -> Result<unlike::Output> {
        tracing::trace!("input - {:?}", data);

        let unlike::Input { user_id, status_id } = data;

        let like = self
            .like_repository
            .find(user_id, status_id, LikeTargetType::Status)
            .await
            .map_err(like_err_fmt)?;

        self.status_repository
            .find(status_id)
            .await
            .map_err(status_err_fmt)?;

        self.like_repository
            .delete(like.id, Utc::now())
            .await
            .map_err(like_err_fmt)?;

        self.status_repository
            .inc_counter(status_id, StatusCounter::Likes, -1)
            .await
            .map_err(status_err_fmt)?;

        Ok(unlike::Output {})
    }
}

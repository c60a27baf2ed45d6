use std::sync::Arc;

use chrono::Utc;

use super::preload::Preloader;
use crate::entities::{
    Attachment, FileType, Follow, Like, Sequence, Status, StatusId, User, UserId,
};
use crate::repositories::mock::InMemoryRepository;
use crate::repositories::{StatusRepository, UserRepository};

pub(crate) const ASSET_HOST: &str = "http://assets.test/";

/// In-memory repositories wired the same way the runtime wires them.
pub(crate) struct Fixture {
    pub(crate) sequences: Arc<InMemoryRepository<Sequence>>,
    pub(crate) users: Arc<InMemoryRepository<User>>,
    pub(crate) follows: Arc<InMemoryRepository<Follow>>,
    pub(crate) statuses: Arc<InMemoryRepository<Status>>,
    pub(crate) likes: Arc<InMemoryRepository<Like>>,
    pub(crate) attachments: Arc<InMemoryRepository<Attachment>>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            sequences: Arc::new(InMemoryRepository::new()),
            users: Arc::new(InMemoryRepository::new()),
            follows: Arc::new(InMemoryRepository::new()),
            statuses: Arc::new(InMemoryRepository::new()),
            likes: Arc::new(InMemoryRepository::new()),
            attachments: Arc::new(InMemoryRepository::new()),
        }
    }

    pub(crate) fn preloader(&self) -> Arc<Preloader> {
        Arc::new(Preloader {
            user_repository: self.users.clone(),
            follow_repository: self.follows.clone(),
            status_repository: self.statuses.clone(),
            like_repository: self.likes.clone(),
            attachment_repository: self.attachments.clone(),
            asset_host: ASSET_HOST.to_string(),
        })
    }

    pub(crate) async fn user(&self, id: UserId) -> User {
        let user = User::new(id, format!("ext-{}", id), Utc::now());
        assert!(UserRepository::insert(&*self.users, user.clone())
            .await
            .unwrap());
        user
    }

    pub(crate) async fn find_user(&self, id: UserId) -> User {
        UserRepository::find(&*self.users, id).await.unwrap()
    }

    pub(crate) async fn find_status(&self, id: StatusId) -> Status {
        StatusRepository::find(&*self.statuses, id).await.unwrap()
    }

    pub(crate) fn attachment(id: u64) -> Attachment {
        let now = Utc::now();
        Attachment {
            id,
            filename: format!("{}.png", id),
            file_type: FileType::Image,
            created: now,
            updated: now,
        }
    }
}

use std::sync::Arc;

use crate::config::{Config, StorageProvider};
use crate::entities::{Attachment, Follow, Like, Sequence, Status, User};
use crate::interactors::attachment::AttachmentUploadInteractor;
use crate::interactors::follow::{FollowInteractor, FriendshipListInteractor, UnfollowInteractor};
use crate::interactors::like::{LikeInteractor, UnlikeInteractor};
use crate::interactors::preload::Preloader;
use crate::interactors::status::{
    CommentListInteractor, RecommendInteractor, StatusCreateInteractor, StatusDeleteInteractor,
    StatusGetInteractor, StatusListInteractor, TimelineInteractor,
};
use crate::interactors::user::{
    AuthenticateInteractor, SignInInteractor, UserEditProfileInteractor, UserGetInteractor,
    UserRenameInteractor, UserSetAvatarInteractor,
};
use crate::repositories::mock::InMemoryRepository;
use crate::repositories::mongo::{
    MongoAttachmentRepository, MongoFollowRepository, MongoLikeRepository,
    MongoSequenceRepository, MongoStatusRepository, MongoUserRepository,
};
use crate::repositories::{
    AttachmentRepository, FollowRepository, LikeRepository, SequenceRepository, StatusRepository,
    UserRepository,
};
use crate::session::{IdentityVerifier, PassthroughVerifier, Sessions};
use crate::storage::{BlobStorage, FileStore, MemoryStore, OssStorage, S3Storage};
use crate::usecases::{attachment, follow, like, status, user};

/// Every usecase the boundary can drive.
pub struct App {
    pub sign_in: Arc<dyn user::sign_in::Usecase + Sync + Send>,
    pub authenticate: Arc<dyn user::authenticate::Usecase + Sync + Send>,
    pub user_get: Arc<dyn user::get::Usecase + Sync + Send>,
    pub user_edit_profile: Arc<dyn user::edit_profile::Usecase + Sync + Send>,
    pub user_rename: Arc<dyn user::rename::Usecase + Sync + Send>,
    pub user_set_avatar: Arc<dyn user::set_avatar::Usecase + Sync + Send>,

    pub follow: Arc<dyn follow::follow::Usecase + Sync + Send>,
    pub unfollow: Arc<dyn follow::unfollow::Usecase + Sync + Send>,
    pub list_friendship: Arc<dyn follow::list_friendship::Usecase + Sync + Send>,

    pub status_create: Arc<dyn status::create::Usecase + Sync + Send>,
    pub status_get: Arc<dyn status::get::Usecase + Sync + Send>,
    pub status_list: Arc<dyn status::list::Usecase + Sync + Send>,
    pub timeline: Arc<dyn status::timeline::Usecase + Sync + Send>,
    pub recommend: Arc<dyn status::recommend::Usecase + Sync + Send>,
    pub comments: Arc<dyn status::comments::Usecase + Sync + Send>,
    pub status_delete: Arc<dyn status::delete::Usecase + Sync + Send>,

    pub like: Arc<dyn like::like::Usecase + Sync + Send>,
    pub unlike: Arc<dyn like::unlike::Usecase + Sync + Send>,

    pub upload: Arc<dyn attachment::upload::Usecase + Sync + Send>,
}

struct Repositories {
    sequence: Arc<dyn SequenceRepository + Sync + Send>,
    user: Arc<dyn UserRepository + Sync + Send>,
    follow: Arc<dyn FollowRepository + Sync + Send>,
    status: Arc<dyn StatusRepository + Sync + Send>,
    like: Arc<dyn LikeRepository + Sync + Send>,
    attachment: Arc<dyn AttachmentRepository + Sync + Send>,
}

fn storage(config: &Config) -> Arc<dyn BlobStorage + Sync + Send> {
    match config.storage_provider {
        StorageProvider::Local => Arc::new(FileStore::new(&config.root_path)),
        StorageProvider::Memory => Arc::new(MemoryStore::new()),
        StorageProvider::S3 => Arc::new(S3Storage),
        StorageProvider::Oss => Arc::new(OssStorage),
    }
}

fn assemble(
    config: &Config,
    r: Repositories,
    verifier: Arc<dyn IdentityVerifier + Sync + Send>,
    storage: Arc<dyn BlobStorage + Sync + Send>,
) -> App {
    let sessions = Arc::new(Sessions::new(config.jwt_secret.clone(), config.token_ttl()));
    let preloader = Arc::new(Preloader {
        user_repository: r.user.clone(),
        follow_repository: r.follow.clone(),
        status_repository: r.status.clone(),
        like_repository: r.like.clone(),
        attachment_repository: r.attachment.clone(),
        asset_host: config.asset_host.clone(),
    });

    App {
        sign_in: Arc::new(SignInInteractor {
            verifier,
            sessions: sessions.clone(),
            user_repository: r.user.clone(),
            sequence_repository: r.sequence.clone(),
        }),
        authenticate: Arc::new(AuthenticateInteractor { sessions }),
        user_get: Arc::new(UserGetInteractor {
            user_repository: r.user.clone(),
            preloader: preloader.clone(),
        }),
        user_edit_profile: Arc::new(UserEditProfileInteractor {
            user_repository: r.user.clone(),
            preloader: preloader.clone(),
        }),
        user_rename: Arc::new(UserRenameInteractor {
            user_repository: r.user.clone(),
            preloader: preloader.clone(),
        }),
        user_set_avatar: Arc::new(UserSetAvatarInteractor {
            user_repository: r.user.clone(),
            attachment_repository: r.attachment.clone(),
            preloader: preloader.clone(),
        }),

        follow: Arc::new(FollowInteractor {
            user_repository: r.user.clone(),
            follow_repository: r.follow.clone(),
        }),
        unfollow: Arc::new(UnfollowInteractor {
            user_repository: r.user.clone(),
            follow_repository: r.follow.clone(),
        }),
        list_friendship: Arc::new(FriendshipListInteractor {
            user_repository: r.user.clone(),
            follow_repository: r.follow.clone(),
            preloader: preloader.clone(),
        }),

        status_create: Arc::new(StatusCreateInteractor {
            status_repository: r.status.clone(),
            preloader: preloader.clone(),
        }),
        status_get: Arc::new(StatusGetInteractor {
            status_repository: r.status.clone(),
            preloader: preloader.clone(),
        }),
        status_list: Arc::new(StatusListInteractor {
            status_repository: r.status.clone(),
            preloader: preloader.clone(),
        }),
        timeline: Arc::new(TimelineInteractor {
            follow_repository: r.follow.clone(),
            status_repository: r.status.clone(),
            preloader: preloader.clone(),
        }),
        recommend: Arc::new(RecommendInteractor {
            status_repository: r.status.clone(),
            preloader: preloader.clone(),
        }),
        comments: Arc::new(CommentListInteractor {
            status_repository: r.status.clone(),
            preloader,
        }),
        status_delete: Arc::new(StatusDeleteInteractor {
            status_repository: r.status.clone(),
        }),

        like: Arc::new(LikeInteractor {
            status_repository: r.status.clone(),
            like_repository: r.like.clone(),
        }),
        unlike: Arc::new(UnlikeInteractor {
            status_repository: r.status.clone(),
            like_repository: r.like,
        }),

        upload: Arc::new(AttachmentUploadInteractor {
            attachment_repository: r.attachment,
            sequence_repository: r.sequence,
            storage,
            asset_host: config.asset_host.clone(),
        }),
    }
}

/// Wires every usecase over in-memory repositories.
pub fn in_memory(config: &Config) -> App {
    let repositories = Repositories {
        sequence: Arc::new(InMemoryRepository::<Sequence>::new()),
        user: Arc::new(InMemoryRepository::<User>::new()),
        follow: Arc::new(InMemoryRepository::<Follow>::new()),
        status: Arc::new(InMemoryRepository::<Status>::new()),
        like: Arc::new(InMemoryRepository::<Like>::new()),
        attachment: Arc::new(InMemoryRepository::<Attachment>::new()),
    };

    assemble(
        config,
        repositories,
        Arc::new(PassthroughVerifier),
        storage(config),
    )
}

/// Wires every usecase over MongoDB, creating indexes on the way.
pub async fn mongo(config: &Config, uri_str: impl AsRef<str>) -> ::anyhow::Result<App> {
    let c = ::mongodb::Client::with_uri_str(uri_str).await?;
    let db = c.database(&config.db_name);

    let repositories = Repositories {
        sequence: Arc::new(MongoSequenceRepository::new_with(&db).await?),
        user: Arc::new(MongoUserRepository::new_with(&db).await?),
        follow: Arc::new(MongoFollowRepository::new_with(&db).await?),
        status: Arc::new(MongoStatusRepository::new_with(&db).await?),
        like: Arc::new(MongoLikeRepository::new_with(&db).await?),
        attachment: Arc::new(MongoAttachmentRepository::new_with(&db).await?),
    };

    Ok(assemble(
        config,
        repositories,
        Arc::new(PassthroughVerifier),
        storage(config),
    ))
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::preload::Preloader;
use super::{follow_err_fmt, user_err_fmt};
use crate::entities::{Follow, FollowId, RelationType, UserCounter, UserId};
use crate::errors::{Error, Result};
use crate::pagination::offset;
use crate::repositories::{
    FollowQuery, FollowRepository, RepositoryError, UserQuery, UserRepository, Window,
};
use crate::usecases::follow::{follow, list_friendship, unfollow};
use crate::utils::{AlsoChain, LetChain};
use crate::views::FriendshipView;

/// Every user `uid` follows.
pub(crate) async fn following_ids(
    repo: &(dyn FollowRepository + Sync + Send),
    uid: UserId,
) -> Result<HashSet<UserId>> {
    Ok(repo
        .finds(
            FollowQuery {
                uid: Some(uid),
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

async fn find_edge(
    repo: &(dyn FollowRepository + Sync + Send),
    uid: UserId,
    focus_uid: UserId,
) -> Result<Option<Follow>> {
    match repo.find(uid, focus_uid).await {
        Ok(f) => Ok(Some(f)),
        Err(RepositoryError::NotFound) => Ok(None),
        Err(e) => Err(follow_err_fmt(e)),
    }
}

pub struct FollowInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub follow_repository: Arc<dyn FollowRepository + Sync + Send>,
}
#[async_trait]
impl follow::Usecase for FollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: follow::Input) -> Result<follow::Output> {
        tracing::trace!("input - {:?}", data);

        let follow::Input { user_id, target_id } = data;

        if user_id == target_id {
            return Err(Error::InvalidArgument("cannot follow yourself".to_string()));
        }

        self.user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?;
        self.user_repository
            .find(target_id)
            .await
            .map_err(user_err_fmt)?;

        let repo = &*self.follow_repository;

        if let Some(existing) = find_edge(repo, user_id, target_id).await? {
            return Ok(follow::Output { follow: existing });
        }

        let now = Utc::now();
        let reciprocal = find_edge(repo, target_id, user_id).await?;

        if let Some(ref r) = reciprocal {
            if !r.is_friend {
                repo.set_friend(r.id, true, now)
                    .await
                    .map_err(follow_err_fmt)?;
            }
        }

        let new_edge = Follow {
            id: FollowId::new(),
            uid: user_id,
            focus_uid: target_id,
            is_friend: reciprocal.is_some(),
            created: now,
            updated: now,
        };

        let inserted = repo
            .insert(new_edge.clone())
            .await
            .map_err(follow_err_fmt)?;
        if !inserted {
            tracing::debug!("lost a follow race, reading the winner");
            return repo
                .find(user_id, target_id)
                .await
                .map_err(follow_err_fmt)?
                .let_(|follow| Ok(follow::Output { follow }));
        }

        self.user_repository
            .inc_counter(user_id, UserCounter::Following, 1)
            .await
            .map_err(user_err_fmt)?;
        self.user_repository
            .inc_counter(target_id, UserCounter::Fans, 1)
            .await
            .map_err(user_err_fmt)?;

        Ok(follow::Output { follow: new_edge }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

pub struct UnfollowInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub follow_repository: Arc<dyn FollowRepository + Sync + Send>,
}
#[async_trait]
impl unfollow::Usecase for UnfollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: unfollow::Input) -> Result<unfollow::Output> {
        tracing::trace!("input - {:?}", data);

        let unfollow::Input { user_id, target_id } = data;
        let repo = &*self.follow_repository;

        if find_edge(repo, user_id, target_id).await?.is_none() {
            return Ok(unfollow::Output {});
        }

        if let Some(r) = find_edge(repo, target_id, user_id).await? {
            if r.is_friend {
                repo.set_friend(r.id, false, Utc::now())
                    .await
                    .map_err(follow_err_fmt)?;
            }
        }

        let deleted = repo
            .delete(user_id, target_id)
            .await
            .map_err(follow_err_fmt)?;
        if deleted {
            self.user_repository
                .inc_counter(user_id, UserCounter::Following, -1)
                .await
                .map_err(user_err_fmt)?;
            self.user_repository
                .inc_counter(target_id, UserCounter::Fans, -1)
                .await
                .map_err(user_err_fmt)?;
        }

        Ok(unfollow::Output {})
    }
}

pub struct FriendshipListInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub follow_repository: Arc<dyn FollowRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl list_friendship::Usecase for FriendshipListInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: list_friendship::Input) -> Result<list_friendship::Output> {
        tracing::trace!("input - {:?}", data);

        let list_friendship::Input {
            viewer,
            user_id,
            relation,
            page,
        } = data;

        self.user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?;

        let query = match relation {
            RelationType::Fan => FollowQuery {
                focus_uid: Some(user_id),
                ..Default::default()
            },
            RelationType::Following => FollowQuery {
                uid: Some(user_id),
                ..Default::default()
            },
            RelationType::Friend => FollowQuery {
                uid: Some(user_id),
                is_friend: Some(true),
                ..Default::default()
            },
        };

        let repo = &*self.follow_repository;
        let query = &query;
        let (edges, pagination) = offset::paginate(
            &page,
            || async { repo.count(query.clone()).await.map_err(follow_err_fmt) },
            |skip, limit| async move {
                repo.finds(query.clone(), Window {
                    until: None,
                    skip,
                    limit: Some(limit),
                })
                .await
                .map_err(follow_err_fmt)
            },
        )
        .await?;

        let counterpart = |f: &Follow| match relation {
            RelationType::Fan => f.uid,
            RelationType::Following | RelationType::Friend => f.focus_uid,
        };

        let users = match edges.is_empty() {
            true => vec![],
            false => self
                .user_repository
                .finds(UserQuery {
                    ids: Some(edges.iter().map(counterpart).collect()),
                    ..Default::default()
                })
                .await
                .map_err(user_err_fmt)?,
        };
        let mut users = self
            .preloader
            .users(viewer, users)
            .await?
            .into_iter()
            .map(|v| (v.user.id, v))
            .collect::<HashMap<_, _>>();

        let friendships = edges
            .iter()
            .filter_map(|f| {
                let user = users.remove(&counterpart(f))?;
                Some(FriendshipView {
                    user,
                    relation: match f.is_friend {
                        true => RelationType::Friend,
                        false => relation,
                    },
                    created: f.created,
                })
            })
            .collect();

        Ok(list_friendship::Output {
            friendships,
            pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::entities::Date;
    use crate::interactors::testing::Fixture;
    use crate::pagination::OffsetParams;
    use crate::repositories::mock::InMemoryRepository;
    use crate::repositories::Result as RepoResult;

    struct Engine {
        f: Fixture,
        follow: FollowInteractor,
        unfollow: UnfollowInteractor,
    }

    async fn engine(users: &[UserId]) -> Engine {
        let f = Fixture::new();
        for id in users {
            f.user(*id).await;
        }
        Engine {
            follow: FollowInteractor {
                user_repository: f.users.clone(),
                follow_repository: f.follows.clone(),
            },
            unfollow: UnfollowInteractor {
                user_repository: f.users.clone(),
                follow_repository: f.follows.clone(),
            },
            f,
        }
    }

    impl Engine {
        async fn follow(&self, user_id: UserId, target_id: UserId) -> Result<Follow> {
            follow::Usecase::handle(&self.follow, follow::Input { user_id, target_id })
                .await
                .map(|o| o.follow)
        }

        async fn unfollow(&self, user_id: UserId, target_id: UserId) -> Result<()> {
            unfollow::Usecase::handle(&self.unfollow, unfollow::Input { user_id, target_id })
                .await
                .map(|_| ())
        }

        async fn edge(&self, uid: UserId, focus_uid: UserId) -> Option<Follow> {
            find_edge(&*self.f.follows, uid, focus_uid).await.unwrap()
        }
    }

    #[test_log::test(tokio::test)]
    async fn follow_twice_keeps_one_edge() {
        let e = engine(&[1, 2]).await;

        let first = e.follow(1, 2).await.unwrap();
        let second = e.follow(1, 2).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(!second.is_friend);
        let count = e.f.follows.count(FollowQuery::default()).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(e.f.find_user(1).await.following_count, 1);
        assert_eq!(e.f.find_user(2).await.fans_count, 1);
    }

    #[tokio::test]
    async fn mutual_follow_promotes_both_edges() {
        let e = engine(&[1, 2]).await;

        e.follow(1, 2).await.unwrap();
        let back = e.follow(2, 1).await.unwrap();

        assert!(back.is_friend);
        assert!(e.edge(1, 2).await.unwrap().is_friend);
        assert!(e.edge(2, 1).await.unwrap().is_friend);
    }

    #[tokio::test]
    async fn unfollow_demotes_reciprocal_edge() {
        let e = engine(&[1, 2]).await;
        e.follow(1, 2).await.unwrap();
        e.follow(2, 1).await.unwrap();

        e.unfollow(1, 2).await.unwrap();

        assert!(e.edge(1, 2).await.is_none());
        assert!(!e.edge(2, 1).await.unwrap().is_friend);
        assert_eq!(e.f.find_user(1).await.following_count, 0);
        assert_eq!(e.f.find_user(2).await.fans_count, 0);
        assert_eq!(e.f.find_user(2).await.following_count, 1);
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_noop() {
        let e = engine(&[1, 2]).await;

        e.unfollow(1, 2).await.unwrap();

        assert_eq!(e.f.find_user(1).await.following_count, 0);
    }

    /// Misses the first edge lookup, as if a concurrent follow landed after it.
    struct LateEdges {
        inner: Arc<InMemoryRepository<Follow>>,
        missed: AtomicBool,
    }

    #[async_trait]
    impl FollowRepository for LateEdges {
        async fn insert(&self, item: Follow) -> RepoResult<bool> {
            FollowRepository::insert(&*self.inner, item).await
        }

        async fn find(&self, uid: UserId, focus_uid: UserId) -> RepoResult<Follow> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Err(RepositoryError::NotFound);
            }
            FollowRepository::find(&*self.inner, uid, focus_uid).await
        }

        async fn finds(
            &self,
            query: FollowQuery,
            window: Window<FollowId>,
        ) -> RepoResult<Vec<Follow>> {
            FollowRepository::finds(&*self.inner, query, window).await
        }

        async fn count(&self, query: FollowQuery) -> RepoResult<u64> {
            FollowRepository::count(&*self.inner, query).await
        }

        async fn set_friend(&self, id: FollowId, is_friend: bool, now: Date) -> RepoResult<()> {
            FollowRepository::set_friend(&*self.inner, id, is_friend, now).await
        }

        async fn delete(&self, uid: UserId, focus_uid: UserId) -> RepoResult<bool> {
            FollowRepository::delete(&*self.inner, uid, focus_uid).await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_returns_winning_edge() {
        let f = Fixture::new();
        f.user(1).await;
        f.user(2).await;
        let now = Utc::now();
        let winner = Follow {
            id: FollowId::new(),
            uid: 1,
            focus_uid: 2,
            is_friend: false,
            created: now,
            updated: now,
        };
        assert!(FollowRepository::insert(&*f.follows, winner.clone())
            .await
            .unwrap());

        let interactor = FollowInteractor {
            user_repository: f.users.clone(),
            follow_repository: Arc::new(LateEdges {
                inner: f.follows.clone(),
                missed: AtomicBool::new(false),
            }),
        };
        let out = follow::Usecase::handle(&interactor, follow::Input {
            user_id: 1,
            target_id: 2,
        })
        .await
        .unwrap();

        assert_eq!(out.follow.id, winner.id);
        assert_eq!(f.follows.count(FollowQuery::default()).await.unwrap(), 1);
        assert_eq!(f.find_user(1).await.following_count, 0);
        assert_eq!(f.find_user(2).await.fans_count, 0);
    }

    #[tokio::test]
    async fn rejects_missing_users_and_self() {
        let e = engine(&[1]).await;

        assert!(matches!(e.follow(1, 9).await, Err(Error::NotFound("user"))));
        assert!(matches!(e.follow(9, 1).await, Err(Error::NotFound("user"))));
        assert!(matches!(e.follow(1, 1).await, Err(Error::InvalidArgument(_))));
        assert!(e.edge(1, 9).await.is_none());
    }

    #[tokio::test]
    async fn lists_each_relation() {
        let e = engine(&[1, 2, 3, 4]).await;
        e.follow(2, 1).await.unwrap();
        e.follow(3, 1).await.unwrap();
        e.follow(1, 3).await.unwrap();
        e.follow(1, 4).await.unwrap();

        let list = FriendshipListInteractor {
            user_repository: e.f.users.clone(),
            follow_repository: e.f.follows.clone(),
            preloader: e.f.preloader(),
        };
        let run = |relation| {
            list_friendship::Usecase::handle(&list, list_friendship::Input {
                viewer: Some(1),
                user_id: 1,
                relation,
                page: OffsetParams::new(1, 10),
            })
        };

        let fans = run(RelationType::Fan).await.unwrap();
        let mut fan_ids = fans
            .friendships
            .iter()
            .map(|v| v.user.user.id)
            .collect::<Vec<_>>();
        fan_ids.sort();
        assert_eq!(fan_ids, vec![2, 3]);
        assert_eq!(fans.pagination.total_records, 2);

        let following = run(RelationType::Following).await.unwrap();
        assert_eq!(following.friendships.len(), 2);
        assert!(following.friendships.iter().all(|v| v.user.is_followed));

        let friends = run(RelationType::Friend).await.unwrap();
        assert_eq!(friends.friendships.len(), 1);
        assert_eq!(friends.friendships[0].user.user.id, 3);
        assert_eq!(friends.friendships[0].relation, RelationType::Friend);
    }

    #[tokio::test]
    async fn friendship_pages_by_offset() {
        let e = engine(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).await;
        for fan in 2..=9 {
            e.follow(fan, 1).await.unwrap();
        }
        let list = FriendshipListInteractor {
            user_repository: e.f.users.clone(),
            follow_repository: e.f.follows.clone(),
            preloader: e.f.preloader(),
        };

        let out = list_friendship::Usecase::handle(&list, list_friendship::Input {
            viewer: None,
            user_id: 1,
            relation: RelationType::Fan,
            page: OffsetParams::new(3, 3),
        })
        .await
        .unwrap();

        assert_eq!(out.friendships.len(), 2);
        assert_eq!(out.pagination.total_pages, 3);
        let ids = out
            .friendships
            .iter()
            .map(|v| v.user.user.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 2]);
    }
}

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    AttachmentRepository, FollowQuery, FollowRepository, LikeQuery, LikeRepository,
    RepositoryError, Result, SequenceRepository, StatusQuery, StatusRepository, UserMutation,
    UserQuery, UserRepository, Window,
};
use crate::entities::{
    Attachment, AttachmentId, Date, Follow, FollowId, Like, LikeId, LikeTargetType, Sequence,
    Status, StatusCounter, StatusId, User, UserCounter, UserId,
};

mod helpers;

use helpers::{apply_inc, apply_window, find_mut, find_ref};

pub struct InMemoryRepository<T>(Mutex<Vec<T>>);

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self { Self(Mutex::new(vec![])) }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

fn is_absent<T>(res: Result<T>) -> Result<bool> {
    match res {
        Ok(_) => Ok(false),
        Err(RepositoryError::NotFound) => Ok(true),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl SequenceRepository for InMemoryRepository<Sequence> {
    async fn next(&self, name: &str) -> Result<u64> {
        let mut guard = self.0.lock().await;

        match find_mut(&mut guard, |s| s.name == name) {
            Ok(s) => {
                s.seq += 1;
                Ok(s.seq)
            },
            Err(RepositoryError::NotFound) => {
                guard.push(Sequence {
                    name: name.to_string(),
                    seq: 1,
                });
                Ok(1)
            },
            Err(e) => Err(e),
        }
    }
}

fn matches_user(
    UserQuery {
        ids,
        external_id,
        username,
        exclude_id,
    }: &UserQuery,
    u: &User,
) -> bool {
    ids.as_ref().map(|s| s.contains(&u.id)).unwrap_or(true)
        && external_id
            .as_ref()
            .map(|e| *e == u.external_id)
            .unwrap_or(true)
        && username.as_ref().map(|n| *n == u.username).unwrap_or(true)
        && exclude_id.map(|e| e != u.id).unwrap_or(true)
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn insert(&self, item: User) -> Result<bool> {
        let mut guard = self.0.lock().await;

        let clashes = guard.iter().any(|v| {
            v.id == item.id
                || v.external_id == item.external_id
                || (!item.username.is_empty() && v.username == item.username)
        });
        if clashes {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: UserId) -> Result<User> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|u| matches_user(&query, u))
            .cloned()
            .collect())
    }

    async fn count(&self, query: UserQuery) -> Result<u64> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|u| matches_user(&query, u))
            .count() as u64)
    }

    async fn update(&self, id: UserId, mutation: UserMutation) -> Result<User> {
        let mut guard = self.0.lock().await;

        let UserMutation {
            username,
            gender,
            mobile,
            email,
            address,
            avatar_id,
            updated,
        } = mutation;

        if let Some(ref name) = username {
            if guard.iter().any(|u| u.id != id && u.username == *name) {
                return Err(RepositoryError::NoUnique { matched: 2 });
            }
        }

        let item = find_mut(&mut guard, |v| v.id == id)?;

        if let Some(val) = username {
            item.username = val;
        }
        if let Some(val) = gender {
            item.gender = val;
        }
        if let Some(val) = mobile {
            item.mobile = val;
        }
        if let Some(val) = email {
            item.email = val;
        }
        if let Some(val) = address {
            item.address = val;
        }
        if let Some(val) = avatar_id {
            item.avatar_id = Some(val);
        }
        if let Some(val) = updated {
            item.updated = val;
        }

        Ok(item.clone())
    }

    async fn inc_counter(&self, id: UserId, counter: UserCounter, value: i64) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id)?;

        match counter {
            UserCounter::Following => item.following_count += value,
            UserCounter::Fans => item.fans_count += value,
        }

        Ok(())
    }
}

fn matches_follow(
    FollowQuery {
        uid,
        focus_uid,
        focus_uids,
        is_friend,
    }: &FollowQuery,
    f: &Follow,
) -> bool {
    uid.map(|u| u == f.uid).unwrap_or(true)
        && focus_uid.map(|u| u == f.focus_uid).unwrap_or(true)
        && focus_uids
            .as_ref()
            .map(|s| s.contains(&f.focus_uid))
            .unwrap_or(true)
        && is_friend.map(|b| b == f.is_friend).unwrap_or(true)
}

#[async_trait]
impl FollowRepository for InMemoryRepository<Follow> {
    async fn insert(&self, item: Follow) -> Result<bool> {
        let mut guard = self.0.lock().await;

        let absent = is_absent(find_ref(&guard, |v| {
            v.id == item.id || (v.uid == item.uid && v.focus_uid == item.focus_uid)
        }))?;
        if !absent {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, uid: UserId, focus_uid: UserId) -> Result<Follow> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.uid == uid && v.focus_uid == focus_uid)?.clone())
    }

    async fn finds(&self, query: FollowQuery, window: Window<FollowId>) -> Result<Vec<Follow>> {
        let matched = self
            .0
            .lock()
            .await
            .iter()
            .filter(|f| matches_follow(&query, f))
            .cloned()
            .collect::<Vec<_>>();

        Ok(apply_window(matched, |f| f.id, window))
    }

    async fn count(&self, query: FollowQuery) -> Result<u64> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|f| matches_follow(&query, f))
            .count() as u64)
    }

    async fn set_friend(&self, id: FollowId, is_friend: bool, now: Date) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id)?;

        item.is_friend = is_friend;
        item.updated = now;

        Ok(())
    }

    async fn delete(&self, uid: UserId, focus_uid: UserId) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let before = guard.len();

        guard.retain(|v| !(v.uid == uid && v.focus_uid == focus_uid));

        Ok(guard.len() != before)
    }
}

fn matches_status(
    StatusQuery {
        ids,
        uids,
        parent_id,
        from_types,
    }: &StatusQuery,
    s: &Status,
) -> bool {
    s.deleted.is_none()
        && ids.as_ref().map(|i| i.contains(&s.id)).unwrap_or(true)
        && uids.as_ref().map(|u| u.contains(&s.uid)).unwrap_or(true)
        && parent_id.map(|p| Some(p) == s.parent_id).unwrap_or(true)
        && from_types
            .as_ref()
            .map(|t| t.contains(&s.from_type))
            .unwrap_or(true)
}

#[async_trait]
impl StatusRepository for InMemoryRepository<Status> {
    async fn insert(&self, item: Status) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if !is_absent(find_ref(&guard, |v| v.id == item.id))? {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: StatusId) -> Result<Status> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == id && v.deleted.is_none())?.clone())
    }

    async fn finds(&self, query: StatusQuery, window: Window<StatusId>) -> Result<Vec<Status>> {
        let matched = self
            .0
            .lock()
            .await
            .iter()
            .filter(|s| matches_status(&query, s))
            .cloned()
            .collect::<Vec<_>>();

        Ok(apply_window(matched, |s| s.id, window))
    }

    async fn inc_counter(&self, id: StatusId, counter: StatusCounter, value: i64) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id)?;

        let field = item.counter_mut(counter);
        *field = apply_inc(*field, value);

        Ok(())
    }

    async fn delete(&self, id: StatusId, now: Date) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id && v.deleted.is_none())?;

        item.deleted = Some(now);
        item.updated = now;

        Ok(())
    }
}

#[async_trait]
impl LikeRepository for InMemoryRepository<Like> {
    async fn insert(&self, item: Like) -> Result<bool> {
        let mut guard = self.0.lock().await;

        let absent = is_absent(find_ref(&guard, |v| {
            v.id == item.id
                || (v.is_active()
                    && v.uid == item.uid
                    && v.target_id == item.target_id
                    && v.target_type == item.target_type)
        }))?;
        if !absent {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(
        &self,
        uid: UserId,
        target_id: StatusId,
        target_type: LikeTargetType,
    ) -> Result<Like> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| {
            v.is_active()
                && v.uid == uid
                && v.target_id == target_id
                && v.target_type == target_type
        })?
        .clone())
    }

    async fn finds(
        &self,
        LikeQuery {
            uid,
            target_ids,
            target_type,
        }: LikeQuery,
    ) -> Result<Vec<Like>> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|l| l.is_active() && l.uid == uid && l.target_type == target_type)
            .filter(|l| target_ids.contains(&l.target_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: LikeId, now: Date) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id && v.is_active())?;

        item.deleted = Some(now);
        item.updated = now;

        Ok(())
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryRepository<Attachment> {
    async fn insert(&self, item: Attachment) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if !is_absent(find_ref(&guard, |v| v.id == item.id))? {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: AttachmentId) -> Result<Attachment> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(&self, ids: HashSet<AttachmentId>) -> Result<Vec<Attachment>> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entities::{FromType, StatusMeta};

    fn status(uid: UserId) -> Status {
        let now = Utc::now();
        Status {
            id: StatusId::new(),
            parent_id: None,
            origin_id: None,
            uid,
            from_type: FromType::Post,
            meta: StatusMeta::Text,
            content: String::new(),
            comments_count: 0,
            likes_count: 0,
            forwards_count: 0,
            deleted: None,
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn sequence_starts_at_one() {
        let repo = InMemoryRepository::<Sequence>::new();

        assert_eq!(repo.next("users").await.unwrap(), 1);
        assert_eq!(repo.next("users").await.unwrap(), 2);
        assert_eq!(repo.next("attachments").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn window_is_newest_first_and_inclusive() {
        let repo = InMemoryRepository::<Status>::new();
        let mut ids = vec![];
        for _ in 0..5 {
            let s = status(1);
            ids.push(s.id);
            assert!(StatusRepository::insert(&repo, s).await.unwrap());
        }

        let window = Window {
            until: Some(ids[3]),
            skip: 1,
            limit: Some(2),
        };
        let got = StatusRepository::finds(&repo, StatusQuery::default(), window)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect::<Vec<_>>();

        assert_eq!(got, vec![ids[2], ids[1]]);
    }

    #[tokio::test]
    async fn deleted_statuses_are_hidden() {
        let repo = InMemoryRepository::<Status>::new();
        let s = status(1);
        let id = s.id;
        StatusRepository::insert(&repo, s).await.unwrap();

        StatusRepository::delete(&repo, id, Utc::now()).await.unwrap();

        assert!(matches!(
            StatusRepository::find(&repo, id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(
            StatusRepository::finds(&repo, StatusQuery::default(), Window::all())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn follow_pair_is_unique() {
        let repo = InMemoryRepository::<Follow>::new();
        let now = Utc::now();
        let edge = || Follow {
            id: FollowId::new(),
            uid: 1,
            focus_uid: 2,
            is_friend: false,
            created: now,
            updated: now,
        };

        assert!(FollowRepository::insert(&repo, edge()).await.unwrap());
        assert!(!FollowRepository::insert(&repo, edge()).await.unwrap());
        assert!(FollowRepository::delete(&repo, 1, 2).await.unwrap());
        assert!(!FollowRepository::delete(&repo, 1, 2).await.unwrap());
    }
}

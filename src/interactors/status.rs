use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::follow::following_ids;
use super::preload::Preloader;
use super::status_err_fmt;
use crate::entities::{
    AttachmentId, FromType, LinkMeta, Status, StatusId, StatusMeta, StatusType, UserId,
};
use crate::errors::{Error, Result};
use crate::pagination::{cursor, QuickPagination, QuickParams};
use crate::repositories::{FollowRepository, StatusQuery, StatusRepository};
use crate::usecases::status::{comments, create, delete, get, list, recommend, timeline};
use crate::utils::{AlsoChain, LetChain};
use crate::views::StatusView;

pub const MAX_CONTENT_CHARS: usize = 4000;

#[derive(Debug, ::serde::Deserialize)]
struct LinkMetaPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    host: String,
    link: String,
    #[serde(default)]
    attachment_id: Option<AttachmentId>,
}

fn resolve_meta(status_type: &str, raw: Option<::serde_json::Value>) -> Result<StatusMeta> {
    match status_type.parse::<StatusType>()? {
        StatusType::Text => Ok(StatusMeta::Text),
        StatusType::Link => {
            let raw = raw.ok_or_else(|| Error::InvalidArgument("link meta is required".to_string()))?;
            let LinkMetaPayload {
                title,
                host,
                link,
                attachment_id,
            } = ::serde_json::from_value(raw)
                .map_err(|e| Error::InvalidArgument(format!("invalid link meta: {}", e)))?;

            Ok(StatusMeta::Link(LinkMeta {
                title,
                host,
                link,
                attachment_id,
            }))
        },
    }
}

/// Runs a status query through the cursor paginator, then preloads the page.
async fn list_page(
    repo: &(dyn StatusRepository + Sync + Send),
    preloader: &Preloader,
    viewer: Option<UserId>,
    query: StatusQuery,
    page: &QuickParams,
) -> Result<(Vec<StatusView>, QuickPagination)> {
    let query = &query;
    let (statuses, pagination) = cursor::paginate::<Status, _, _>(page, |window| async move {
        repo.finds(query.clone(), window)
            .await
            .map_err(status_err_fmt)
    })
    .await?;

    let statuses = preloader.statuses(viewer, statuses).await?;

    Ok((statuses, pagination))
}

pub struct StatusCreateInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl create::Usecase for StatusCreateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: create::Input) -> Result<create::Output> {
        tracing::trace!("input - {:?}", data);

        let create::Input {
            user_id,
            parent_id,
            from_type,
            status_type,
            meta,
            content,
        } = data;

        let meta = resolve_meta(&status_type, meta)?;

        match (from_type, parent_id) {
            (FromType::Post, Some(_)) => {
                return Err(Error::InvalidArgument("a post cannot have a parent".to_string()))
            },
            (FromType::Forward | FromType::Comment, None) => {
                return Err(Error::InvalidArgument(format!("a {} needs a parent", from_type)))
            },
            _ => (),
        }

        let parent = match parent_id {
            Some(id) => Some(
                self.status_repository
                    .find(id)
                    .await
                    .map_err(status_err_fmt)?,
            ),
            None => None,
        };

        let origin_id = parent.as_ref().map(|p| p.origin_id.unwrap_or(p.id));
        if let Some(id) = origin_id.filter(|id| Some(*id) != parent_id) {
            self.status_repository
                .find(id)
                .await
                .map_err(status_err_fmt)?;
        }

        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(Error::Unprocessable(format!(
                "content is longer than {} characters",
                MAX_CONTENT_CHARS
            )));
        }

        let now = Utc::now();
        let status = Status {
            id: StatusId::new(),
            parent_id,
            origin_id,
            uid: user_id,
            from_type,
            meta,
            content,
            comments_count: 0,
            likes_count: 0,
            forwards_count: 0,
            deleted: None,
            created: now,
            updated: now,
        };

        let inserted = self
            .status_repository
            .insert(status.clone())
            .await
            .map_err(status_err_fmt)?;
        if !inserted {
            return Err(Error::Internal(anyhow::anyhow!(
                "status id {} collided",
                status.id
            )));
        }

        let targets = match (from_type, parent_id, origin_id) {
            (FromType::Forward, Some(parent), Some(origin)) if parent != origin => {
                vec![origin, parent]
            },
            (FromType::Forward, _, Some(origin)) => vec![origin],
            (FromType::Comment, Some(parent), _) => vec![parent],
            _ => vec![],
        };
        if let Some(counter) = from_type.counter() {
            for id in targets {
                self.status_repository
                    .inc_counter(id, counter, 1)
                    .await
                    .map_err(status_err_fmt)?;
            }
        }

        self.preloader
            .status(Some(user_id), status)
            .await?
            .let_(|status| create::Output { status })
            .also_(|o| tracing::trace!("output - {:?}", o.status.status.id))
            .let_(Ok)
    }
}

pub struct StatusGetInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl get::Usecase for StatusGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { viewer, status_id } = data;

        let status = self
            .status_repository
            .find(status_id)
            .await
            .map_err(status_err_fmt)?;

        self.preloader
            .status(viewer, status)
            .await?
            .let_(|status| get::Output { status })
            .let_(Ok)
    }
}

pub struct StatusListInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl list::Usecase for StatusListInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: list::Input) -> Result<list::Output> {
        tracing::trace!("input - {:?}", data);

        let list::Input {
            viewer,
            user_ids,
            parent_id,
            from_types,
            page,
        } = data;

        let query = StatusQuery {
            uids: user_ids,
            parent_id,
            from_types,
            ..Default::default()
        };

        let (statuses, pagination) = list_page(
            &*self.status_repository,
            &self.preloader,
            viewer,
            query,
            &page,
        )
        .await?;

        Ok(list::Output {
            statuses,
            pagination,
        })
    }
}

pub struct TimelineInteractor {
    pub follow_repository: Arc<dyn FollowRepository + Sync + Send>,
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl timeline::Usecase for TimelineInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: timeline::Input) -> Result<timeline::Output> {
        tracing::trace!("input - {:?}", data);

        let timeline::Input { user_id, page } = data;

        let following = following_ids(&*self.follow_repository, user_id).await?;
        if following.is_empty() {
            return Ok(timeline::Output {
                statuses: vec![],
                pagination: QuickPagination::empty(&page),
            });
        }

        let query = StatusQuery {
            uids: Some(following),
            ..Default::default()
        };

        let (statuses, pagination) = list_page(
            &*self.status_repository,
            &self.preloader,
            Some(user_id),
            query,
            &page,
        )
        .await?;

        Ok(timeline::Output {
            statuses,
            pagination,
        })
    }
}

pub struct RecommendInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl recommend::Usecase for RecommendInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: recommend::Input) -> Result<recommend::Output> {
        tracing::trace!("input - {:?}", data);

        let recommend::Input { viewer, page } = data;

        let (statuses, pagination) = list_page(
            &*self.status_repository,
            &self.preloader,
            viewer,
            StatusQuery::default(),
            &page,
        )
        .await?;

        Ok(recommend::Output {
            statuses,
            pagination,
        })
    }
}

pub struct CommentListInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
    pub preloader: Arc<Preloader>,
}
#[async_trait]
impl comments::Usecase for CommentListInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: comments::Input) -> Result<comments::Output> {
        tracing::trace!("input - {:?}", data);

        let comments::Input {
            viewer,
            status_id,
            page,
        } = data;

        self.status_repository
            .find(status_id)
            .await
            .map_err(status_err_fmt)?;

        let query = StatusQuery {
            parent_id: Some(status_id),
            from_types: Some(HashSet::from([FromType::Comment])),
            ..Default::default()
        };

        let (statuses, pagination) = list_page(
            &*self.status_repository,
            &self.preloader,
            viewer,
            query,
            &page,
        )
        .await?;

        Ok(comments::Output {
            statuses,
            pagination,
        })
    }
}

pub struct StatusDeleteInteractor {
    pub status_repository: Arc<dyn StatusRepository + Sync + Send>,
}
#[async_trait]
impl delete::Usecase for StatusDeleteInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: delete::Input) -> Result<delete::Output> {
        tracing::trace!("input - {:?}", data);

        let delete::Input { user_id, status_id } = data;

        let status = self
            .status_repository
            .find(status_id)
            .await
            .map_err(status_err_fmt)?;

        if status.uid != user_id {
            return Err(Error::Forbidden);
        }

        self.status_repository
            .delete(status_id, Utc::now())
            .await
            .map_err(status_err_fmt)?;

        Ok(delete::Output {})
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::entities::User;
    use crate::interactors::testing::Fixture;
    use crate::repositories::{AttachmentRepository as _, FollowRepository as _};

    struct Engine {
        f: Fixture,
        create: StatusCreateInteractor,
    }

    fn engine(f: Fixture) -> Engine {
        Engine {
            create: StatusCreateInteractor {
                status_repository: f.statuses.clone(),
                preloader: f.preloader(),
            },
            f,
        }
    }

    impl Engine {
        async fn post(&self, uid: UserId, from_type: FromType, parent: Option<StatusId>) -> Result<StatusView> {
            create::Usecase::handle(&self.create, create::Input {
                user_id: uid,
                parent_id: parent,
                from_type,
                status_type: "text".to_string(),
                meta: None,
                content: "hello".to_string(),
            })
            .await
            .map(|o| o.status)
        }

        fn list(&self) -> StatusListInteractor {
            StatusListInteractor {
                status_repository: self.f.statuses.clone(),
                preloader: self.f.preloader(),
            }
        }

        fn timeline(&self) -> TimelineInteractor {
            TimelineInteractor {
                follow_repository: self.f.follows.clone(),
                status_repository: self.f.statuses.clone(),
                preloader: self.f.preloader(),
            }
        }
    }

    async fn follow(f: &Fixture, uid: UserId, focus_uid: UserId) {
        let now = Utc::now();
        f.follows
            .insert(crate::entities::Follow {
                id: crate::entities::FollowId::new(),
                uid,
                focus_uid,
                is_friend: false,
                created: now,
                updated: now,
            })
            .await
            .unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn forward_of_forward_flattens_origin() {
        let f = Fixture::new();
        f.user(1).await;
        let e = engine(f);

        let p = e.post(1, FromType::Post, None).await.unwrap().status;
        let f1 = e.post(1, FromType::Forward, Some(p.id)).await.unwrap();
        assert_eq!(f1.status.origin_id, Some(p.id));
        assert_eq!(e.f.find_status(p.id).await.forwards_count, 1);

        let f2 = e
            .post(1, FromType::Forward, Some(f1.status.id))
            .await
            .unwrap();

        assert_eq!(f2.status.parent_id, Some(f1.status.id));
        assert_eq!(f2.status.origin_id, Some(p.id));
        assert_eq!(e.f.find_status(p.id).await.forwards_count, 2);
        assert_eq!(e.f.find_status(f1.status.id).await.forwards_count, 1);

        let parent = f2.parent.unwrap();
        let origin = f2.origin.unwrap();
        assert_eq!(parent.status.id, f1.status.id);
        assert_eq!(origin.status.id, p.id);
        assert_eq!(origin.user.unwrap().user.id, 1);
    }

    #[tokio::test]
    async fn comment_bumps_parent_only() {
        let f = Fixture::new();
        f.user(1).await;
        let e = engine(f);

        let p = e.post(1, FromType::Post, None).await.unwrap().status;
        let fw = e.post(1, FromType::Forward, Some(p.id)).await.unwrap().status;
        e.post(1, FromType::Comment, Some(fw.id)).await.unwrap();

        let fw = e.f.find_status(fw.id).await;
        let p = e.f.find_status(p.id).await;
        assert_eq!(fw.comments_count, 1);
        assert_eq!(p.comments_count, 0);
        assert_eq!(p.forwards_count, 1);
    }

    #[tokio::test]
    async fn rejects_bad_creation_input() {
        let f = Fixture::new();
        f.user(1).await;
        let e = engine(f);
        let p = e.post(1, FromType::Post, None).await.unwrap().status;

        let run = |status_type: &str, meta, from_type, parent_id, content: String| {
            create::Usecase::handle(&e.create, create::Input {
                user_id: 1,
                parent_id,
                from_type,
                status_type: status_type.to_string(),
                meta,
                content,
            })
        };

        let unknown = run("poll", None, FromType::Post, None, String::new()).await;
        assert!(matches!(unknown, Err(Error::InvalidArgument(_))));

        let broken = run("link", Some(json!({ "title": 3 })), FromType::Post, None, String::new()).await;
        assert!(matches!(broken, Err(Error::InvalidArgument(_))));

        let orphan = run("text", None, FromType::Comment, None, String::new()).await;
        assert!(matches!(orphan, Err(Error::InvalidArgument(_))));

        let missing = run("text", None, FromType::Forward, Some(StatusId::new()), String::new()).await;
        assert!(matches!(missing, Err(Error::NotFound("status"))));

        let long = run("text", None, FromType::Comment, Some(p.id), "x".repeat(4001)).await;
        assert!(matches!(long, Err(Error::Unprocessable(_))));
        assert_eq!(e.f.find_status(p.id).await.comments_count, 0);
    }

    #[tokio::test]
    async fn link_status_resolves_attachment_url() {
        let f = Fixture::new();
        f.user(1).await;
        f.attachments.insert(Fixture::attachment(5)).await.unwrap();
        let e = engine(f);

        let view = create::Usecase::handle(&e.create, create::Input {
            user_id: 1,
            parent_id: None,
            from_type: FromType::Post,
            status_type: "link".to_string(),
            meta: Some(json!({
                "title": "rust",
                "host": "rust-lang.org",
                "link": "https://rust-lang.org",
                "attachment_id": 5,
            })),
            content: String::new(),
        })
        .await
        .unwrap()
        .status;

        assert_eq!(view.status.status_type(), StatusType::Link);
        assert_eq!(view.status.meta.link().unwrap().host, "rust-lang.org");
        assert!(view.attachment_url.unwrap().ends_with("/5/5.png"));
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let f = Fixture::new();
        f.user(1).await;
        let e = engine(f);
        let mut ids = vec![];
        for _ in 0..5 {
            ids.push(e.post(1, FromType::Post, None).await.unwrap().status.id);
        }
        let list = e.list();
        let input = |page| list::Input {
            viewer: None,
            user_ids: Some(HashSet::from([1])),
            parent_id: None,
            from_types: None,
            page,
        };

        let first = list::Usecase::handle(&list, input(QuickParams::new(2, "")))
            .await
            .unwrap();
        let got = first
            .statuses
            .iter()
            .map(|v| v.status.id)
            .collect::<Vec<_>>();
        assert_eq!(got, vec![ids[4], ids[3]]);
        assert!(!first.pagination.next_id.is_empty());

        let second = list::Usecase::handle(&list, input(QuickParams::new(2, first.pagination.next_id)))
            .await
            .unwrap();
        let got = second
            .statuses
            .iter()
            .map(|v| v.status.id)
            .collect::<Vec<_>>();
        assert_eq!(got, vec![ids[2], ids[1]]);

        let third = list::Usecase::handle(&list, input(QuickParams::new(2, second.pagination.next_id)))
            .await
            .unwrap();
        assert_eq!(third.statuses.len(), 1);
        assert_eq!(third.pagination.next_id, "");
    }

    #[tokio::test]
    async fn empty_timeline_echoes_limit() {
        let f = Fixture::new();
        f.user(1).await;
        let e = engine(f);

        let out = timeline::Usecase::handle(&e.timeline(), timeline::Input {
            user_id: 1,
            page: QuickParams::new(20, ""),
        })
        .await
        .unwrap();

        assert!(out.statuses.is_empty());
        assert_eq!(out.pagination, QuickPagination {
            limit: 20,
            next_id: String::new(),
        });
    }

    #[tokio::test]
    async fn timeline_shows_followed_authors() {
        let f = Fixture::new();
        for id in 1..=3 {
            f.user(id).await;
        }
        follow(&f, 1, 2).await;
        let e = engine(f);
        let by_2 = e.post(2, FromType::Post, None).await.unwrap().status;
        e.post(3, FromType::Post, None).await.unwrap();

        let out = timeline::Usecase::handle(&e.timeline(), timeline::Input {
            user_id: 1,
            page: QuickParams::default(),
        })
        .await
        .unwrap();

        assert_eq!(out.statuses.len(), 1);
        assert_eq!(out.statuses[0].status.id, by_2.id);
        let author: &User = &out.statuses[0].user.as_ref().unwrap().user;
        assert_eq!(author.id, 2);
        assert!(out.statuses[0].user.as_ref().unwrap().is_followed);
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let f = Fixture::new();
        f.user(1).await;
        f.user(2).await;
        let e = engine(f);
        let s = e.post(1, FromType::Post, None).await.unwrap().status;
        let delete = StatusDeleteInteractor {
            status_repository: e.f.statuses.clone(),
        };
        let get = StatusGetInteractor {
            status_repository: e.f.statuses.clone(),
            preloader: e.f.preloader(),
        };

        let denied = delete::Usecase::handle(&delete, delete::Input {
            user_id: 2,
            status_id: s.id,
        })
        .await;
        assert!(matches!(denied, Err(Error::Forbidden)));

        delete::Usecase::handle(&delete, delete::Input {
            user_id: 1,
            status_id: s.id,
        })
        .await
        .unwrap();

        let gone = get::Usecase::handle(&get, get::Input {
            viewer: None,
            status_id: s.id,
        })
        .await;
        assert!(matches!(gone, Err(Error::NotFound("status"))));
    }

    #[tokio::test]
    async fn deleting_unknown_status_is_not_found() {
        let f = Fixture::new();
        f.user(1).await;
        let delete = StatusDeleteInteractor {
            status_repository: f.statuses.clone(),
        };

        let missing = delete::Usecase::handle(&delete, delete::Input {
            user_id: 1,
            status_id: StatusId::new(),
        })
        .await;

        assert!(matches!(missing, Err(Error::NotFound("status"))));
    }

    #[tokio::test]
    async fn comments_list_only_comments() {
        let f = Fixture::new();
        f.user(1).await;
        let e = engine(f);
        let p = e.post(1, FromType::Post, None).await.unwrap().status;
        e.post(1, FromType::Forward, Some(p.id)).await.unwrap();
        let c = e.post(1, FromType::Comment, Some(p.id)).await.unwrap().status;
        let i = CommentListInteractor {
            status_repository: e.f.statuses.clone(),
            preloader: e.f.preloader(),
        };

        let out = comments::Usecase::handle(&i, comments::Input {
            viewer: Some(1),
            status_id: p.id,
            page: QuickParams::default(),
        })
        .await
        .unwrap();

        assert_eq!(out.statuses.len(), 1);
        assert_eq!(out.statuses[0].status.id, c.id);
    }
}

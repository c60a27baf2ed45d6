use core::fmt::Display;
use core::future::Future;
use core::str::FromStr;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use crate::errors::{Error, Result};
use crate::repositories::Window;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: i64 = 200;

/// Items that can be walked by a descending-id cursor.
pub trait Keyed {
    type Key: Copy + Ord + Display + FromStr<Err = Error>;

    fn key(&self) -> Self::Key;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, ::serde::Deserialize)]
pub struct QuickParams {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub next_id: String,
}

impl QuickParams {
    pub fn new(limit: i64, next_id: impl Into<String>) -> Self {
        Self {
            limit,
            next_id: next_id.into(),
        }
    }

    /// Requested page size, falling back to the default outside `1..=200`.
    pub fn limit(&self) -> u64 {
        match self.limit {
            l @ 1..=MAX_LIMIT => l as u64,
            _ => DEFAULT_LIMIT,
        }
    }

    pub fn cursor<K>(&self) -> Result<Option<K>>
    where K: FromStr<Err = Error> {
        if self.next_id.is_empty() {
            return Ok(None);
        }

        let raw = URL_SAFE
            .decode(&self.next_id)
            .ok()
            .and_then(|b| String::from_utf8(b).ok())
            .ok_or_else(|| Error::InvalidArgument(format!("invalid cursor {}", self.next_id)))?;

        raw.parse::<K>().map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize)]
pub struct QuickPagination {
    pub limit: u64,
    pub next_id: String,
}

impl QuickPagination {
    pub fn empty(params: &QuickParams) -> Self {
        Self {
            limit: params.limit(),
            next_id: String::new(),
        }
    }

    pub fn has_next(&self) -> bool { !self.next_id.is_empty() }
}

pub fn encode_cursor(key: impl Display) -> String { URL_SAFE.encode(key.to_string()) }

/// Fetches one page newest first, then probes one item past it for the next cursor.
///
/// The cursor is the probe's id, so the next page starts exactly at it.
pub async fn paginate<T, F, Fut>(params: &QuickParams, fetch: F) -> Result<(Vec<T>, QuickPagination)>
where
    T: Keyed,
    F: Fn(Window<T::Key>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let limit = params.limit();
    let until = params.cursor::<T::Key>()?;

    let items = fetch(Window {
        until,
        skip: 0,
        limit: Some(limit),
    })
    .await?;

    let probe = fetch(Window {
        until,
        skip: limit,
        limit: Some(1),
    })
    .await?;

    let next_id = probe
        .first()
        .map(|p| encode_cursor(p.key()))
        .unwrap_or_default();

    tracing::trace!("page - {} items, next: {:?}", items.len(), next_id);

    Ok((items, QuickPagination { limit, next_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::StatusId;

    #[derive(Debug, Clone)]
    struct Item(StatusId);

    impl Keyed for Item {
        type Key = StatusId;

        fn key(&self) -> StatusId { self.0 }
    }

    fn store(n: usize) -> Vec<Item> { (0..n).map(|_| Item(StatusId::new())).collect() }

    async fn fetch(store: &[Item], w: Window<StatusId>) -> Result<Vec<Item>> {
        let mut v = store
            .iter()
            .filter(|i| w.until.map(|u| i.0 <= u).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        v.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(v
            .into_iter()
            .skip(w.skip as usize)
            .take(w.limit.unwrap_or(u64::MAX) as usize)
            .collect())
    }

    #[test]
    fn limit_falls_back_outside_range() {
        assert_eq!(QuickParams::new(0, "").limit(), 50);
        assert_eq!(QuickParams::new(201, "").limit(), 50);
        assert_eq!(QuickParams::new(-4, "").limit(), 50);
        assert_eq!(QuickParams::new(1, "").limit(), 1);
        assert_eq!(QuickParams::new(200, "").limit(), 200);
    }

    #[test]
    fn rejects_garbage_cursor() {
        let p = QuickParams::new(10, "%%%");
        assert!(matches!(p.cursor::<StatusId>(), Err(Error::InvalidArgument(_))));

        let p = QuickParams::new(10, URL_SAFE.encode("not-an-id"));
        assert!(matches!(p.cursor::<StatusId>(), Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn walks_every_item_once() {
        let items = store(7);
        let mut params = QuickParams::new(3, "");
        let mut seen = vec![];
        let mut pages = 0;

        loop {
            let (page, pagination) = paginate(&params, |w| fetch(&items, w)).await.unwrap();
            assert!(page.len() <= 3);
            seen.extend(page.iter().map(|i| i.0));
            pages += 1;

            if !pagination.has_next() {
                break;
            }
            params.next_id = pagination.next_id;
        }

        let mut expected = items.iter().map(|i| i.0).collect::<Vec<_>>();
        expected.reverse();
        assert_eq!(pages, 3);
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn exact_fit_has_no_next_page() {
        let items = store(3);
        let (page, pagination) = paginate(&QuickParams::new(3, ""), |w| fetch(&items, w))
            .await
            .unwrap();

        assert_eq!(page.len(), 3);
        assert_eq!(pagination.next_id, "");
        assert_eq!(pagination.limit, 3);
    }
}

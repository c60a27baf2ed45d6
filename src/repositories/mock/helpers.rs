use super::super::{RepositoryError, Result as RepoResult, Window};

pub fn find_mut<T, P>(v: &mut [T], preficate: P) -> RepoResult<&mut T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&mut T) -> bool,
{
    let mut res = v.iter_mut().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn find_ref<T, P>(v: &[T], preficate: P) -> RepoResult<&T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&T) -> bool,
{
    let mut res = v.iter().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

/// Sorts newest first, then applies the window bounds.
pub fn apply_window<T, K, F>(mut items: Vec<T>, key: F, window: Window<K>) -> Vec<T>
where
    K: Ord + Copy,
    F: Fn(&T) -> K,
{
    let Window { until, skip, limit } = window;

    items.sort_by(|a, b| key(b).cmp(&key(a)));

    items
        .into_iter()
        .filter(|i| until.map(|u| key(i) <= u).unwrap_or(true))
        .skip(skip as usize)
        .take(limit.map(|l| l as usize).unwrap_or(usize::MAX))
        .collect()
}

pub fn apply_inc(value: u64, inc: i64) -> u64 {
    if inc.is_negative() {
        value.saturating_sub(inc.unsigned_abs())
    } else {
        value.saturating_add(inc as u64)
    }
}

use anyhow::anyhow;
use mongodb::error::{Error as MongoError, ErrorKind, Result as MongoResult, WriteFailure};

use super::{RepositoryError, Result as RepoResult};

pub fn convert_repo_err<T, E>(result: Result<T, E>) -> RepoResult<T>
where E: Sync + Send + ::std::error::Error + 'static {
    result.map_err(|e| RepositoryError::Internal(anyhow!(e)))
}

pub fn is_duplicate_key(e: &MongoError) -> bool {
    let code = match &*e.kind {
        ErrorKind::Write(WriteFailure::WriteError(w)) => w.code,
        ErrorKind::Command(c) => c.code,
        _ => return false,
    };

    code == 11000
}

pub fn try_unique_check<T>(result: MongoResult<T>) -> RepoResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if is_duplicate_key(&e) => Ok(false),
        Err(e) => Err(RepositoryError::Internal(anyhow!(e))),
    }
}

pub fn convert_404_or<T>(option: Option<T>) -> RepoResult<T> {
    match option {
        Some(t) => Ok(t),
        None => Err(RepositoryError::NotFound),
    }
}

pub fn expect_matched(matched_count: u64) -> RepoResult<()> {
    match matched_count {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(()),
        n => Err(RepositoryError::NoUnique { matched: n as u32 }),
    }
}

pub fn to_bool<N>(number: N) -> bool
where N: ::core::convert::TryInto<i8> + ::core::fmt::Debug + Clone {
    match match ::core::convert::TryInto::<i8>::try_into(number.clone()) {
        Ok(n) => n,
        Err(_) => unreachable!("expected 0 or 1, found: {:?}", number),
    } {
        0 => false,
        1 => true,
        n => unreachable!("expected 0 or 1, found: {}", n),
    }
}

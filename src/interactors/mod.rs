pub mod attachment;
pub mod follow;
pub mod like;
pub mod preload;
pub mod status;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::anyhow;

use crate::errors::Error;
use crate::repositories::RepositoryError;

macro_rules! err_fmt {
    ($f:ident, $what:literal) => {
        pub(crate) fn $f(e: RepositoryError) -> Error {
            match e {
                RepositoryError::NotFound => Error::NotFound($what),
                e => Error::Internal(anyhow!("repository error: {}", e)),
            }
        }
    };
}

err_fmt!(user_err_fmt, "user");
err_fmt!(follow_err_fmt, "follow");
err_fmt!(status_err_fmt, "status");
err_fmt!(like_err_fmt, "like");
err_fmt!(attachment_err_fmt, "attachment");

fn sequence_err_fmt(e: RepositoryError) -> Error {
    Error::Internal(anyhow!("cannot allocate id: {}", e))
}

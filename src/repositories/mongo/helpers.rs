use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use tracing::Instrument;

use super::converters::convert_repo_err;
use super::Result as RepoResult;
use crate::utils::LetChain;

/// Creates `indexes` on `coll_name`. Index creation is idempotent.
pub async fn initialize_coll(
    coll_name: impl Into<::mongodb::bson::Bson>,
    indexes: Vec<Document>,
    db: &Database,
) -> MongoResult<()> {
    if indexes.is_empty() {
        return Ok(());
    }

    db.run_command(
        doc! {
            "createIndexes": coll_name.into(),
            "indexes": indexes,
        },
        None,
    )
    .instrument(tracing::trace_span!("run_command"))
    .await?;

    Ok(())
}

pub fn unique_index(name: &str, key: Document) -> Document {
    doc! {
        "name": name,
        "key": key,
        "unique": true,
    }
}

pub fn index(name: &str, key: Document) -> Document {
    doc! {
        "name": name,
        "key": key,
    }
}

pub async fn find_all<T, R>(
    coll: &Collection<T>,
    filter: Document,
    options: impl Into<Option<FindOptions>>,
) -> RepoResult<Vec<R>>
where
    T: Sync + Send + Unpin + ::serde::de::DeserializeOwned,
    R: TryFrom<T, Error = super::RepositoryError>,
{
    coll.find(filter, options)
        .instrument(tracing::trace_span!("find"))
        .await
        .let_(convert_repo_err)?
        .try_collect::<Vec<_>>()
        .instrument(tracing::trace_span!("try_collect"))
        .await
        .let_(convert_repo_err)?
        .into_iter()
        .map(R::try_from)
        .collect()
}

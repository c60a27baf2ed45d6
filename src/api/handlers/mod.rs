pub mod attachment;
pub mod friendship;
pub mod status;
pub mod user;

use super::response::Envelope;
use crate::entities::UserId;
use crate::errors::{Error, Result};

fn parse_uid(raw: &str) -> Result<UserId> {
    raw.parse()
        .map_err(|_| Error::InvalidArgument(format!("invalid uid {}", raw)))
}

/// Liveness probe.
pub async fn probe() -> Envelope<()> { Envelope::ok(()) }

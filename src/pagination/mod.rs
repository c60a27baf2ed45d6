//! Descending-id cursor pagination and classic page/per-page pagination.

pub mod cursor;
pub mod offset;

pub use cursor::{Keyed, QuickPagination, QuickParams};
pub use offset::{OffsetPagination, OffsetParams};

use crate::entities::{Follow, FollowId, Status, StatusId};

impl Keyed for Status {
    type Key = StatusId;

    fn key(&self) -> StatusId { self.id }
}

impl Keyed for Follow {
    type Key = FollowId;

    fn key(&self) -> FollowId { self.id }
}

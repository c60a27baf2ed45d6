use crate::entities::{Date, RelationType, Status, User};

/// A user as seen by a (possibly anonymous) viewer.
#[derive(Debug, Clone)]
pub struct UserView {
    pub user: User,
    pub avatar_url: Option<String>,
    pub is_followed: bool,
}

/// A status with its author, related statuses and per-viewer state resolved.
///
/// `parent` and `origin` are one level deep; their own relatives are left empty.
#[derive(Debug, Clone)]
pub struct StatusView {
    pub status: Status,
    pub user: Option<UserView>,
    pub parent: Option<Box<StatusView>>,
    pub origin: Option<Box<StatusView>>,
    pub is_liked: bool,
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FriendshipView {
    pub user: UserView,
    pub relation: RelationType,
    pub created: Date,
}

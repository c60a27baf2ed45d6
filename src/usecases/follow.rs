usecase! {
    follow : {
        pub user_id: entities::UserId,
        pub target_id: entities::UserId,
    } => {
        pub follow: entities::Follow,
    }
}

usecase! {
    unfollow : {
        pub user_id: entities::UserId,
        pub target_id: entities::UserId,
    } => {}
}

usecase! {
    list_friendship : {
        pub viewer: Option<entities::UserId>,
        pub user_id: entities::UserId,
        pub relation: entities::RelationType,
        pub page: pagination::OffsetParams,
    } => {
        pub friendships: Vec<views::FriendshipView>,
        pub pagination: pagination::OffsetPagination,
    }
}

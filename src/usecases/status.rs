usecase! {
    create : {
        pub user_id: entities::UserId,
        pub parent_id: Option<entities::StatusId>,
        pub from_type: entities::FromType,
        pub status_type: String,
        pub meta: Option<::serde_json::Value>,
        pub content: String,
    } => {
        pub status: views::StatusView,
    }
}

usecase! {
    get : {
        pub viewer: Option<entities::UserId>,
        pub status_id: entities::StatusId,
    } => {
        pub status: views::StatusView,
    }
}

usecase! {
    list : {
        pub viewer: Option<entities::UserId>,
        pub user_ids: Option<::std::collections::HashSet<entities::UserId>>,
        pub parent_id: Option<entities::StatusId>,
        pub from_types: Option<::std::collections::HashSet<entities::FromType>>,
        pub page: pagination::QuickParams,
    } => {
        pub statuses: Vec<views::StatusView>,
        pub pagination: pagination::QuickPagination,
    }
}

usecase! {
    timeline : {
        pub user_id: entities::UserId,
        pub page: pagination::QuickParams,
    } => {
        pub statuses: Vec<views::StatusView>,
        pub pagination: pagination::QuickPagination,
    }
}

usecase! {
    recommend : {
        pub viewer: Option<entities::UserId>,
        pub page: pagination::QuickParams,
    } => {
        pub statuses: Vec<views::StatusView>,
        pub pagination: pagination::QuickPagination,
    }
}

usecase! {
    comments : {
        pub viewer: Option<entities::UserId>,
        pub status_id: entities::StatusId,
        pub page: pagination::QuickParams,
    } => {
        pub statuses: Vec<views::StatusView>,
        pub pagination: pagination::QuickPagination,
    }
}

usecase! {
    delete : {
        pub user_id: entities::UserId,
        pub status_id: entities::StatusId,
    } => {}
}

usecase! {
    like : {
        pub user_id: entities::UserId,
        pub status_id: entities::StatusId,
    } => {
        pub like: entities::Like,
    }
}

usecase! {
    unlike : {
        pub user_id: entities::UserId,
        pub status_id: entities::StatusId,
    } => {}
}

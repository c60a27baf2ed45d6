usecase! {
    sign_in : {
        pub external_id: String,
        pub auth_code: String,
    } => {
        pub token: String,
        pub user: entities::User,
    }
}

usecase! {
    authenticate : {
        pub token: String,
    } => {
        pub identity: crate::session::Identity,
    }
}

usecase! {
    get : {
        pub viewer: Option<entities::UserId>,
        pub user_id: entities::UserId,
    } => {
        pub user: views::UserView,
    }
}

usecase! {
    edit_profile : {
        pub user_id: entities::UserId,
        pub gender: Option<entities::Gender>,
        pub mobile: Option<String>,
        pub email: Option<String>,
        pub address: Option<String>,
    } => {
        pub user: views::UserView,
    }
}

usecase! {
    rename : {
        pub user_id: entities::UserId,
        pub username: String,
    } => {
        pub user: views::UserView,
    }
}

usecase! {
    set_avatar : {
        pub user_id: entities::UserId,
        pub attachment_id: entities::AttachmentId,
    } => {
        pub user: views::UserView,
    }
}

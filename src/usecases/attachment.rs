usecase! {
    upload : {
        pub file_type: String,
        pub filename: String,
        pub body: ::bytes::Bytes,
    } => {
        pub attachment: entities::Attachment,
        pub url: String,
    }
}

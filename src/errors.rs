use thiserror::Error as ThisError;

pub type Result<T> = ::core::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("invalid auth params")]
    InvalidAuth,
    #[error("invalid auth method")]
    InvalidAuthMethod,
    #[error("invalid auth token")]
    InvalidAuthToken,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("authorization expired")]
    TokenExpired,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unprocessable(String),
    #[error("username already exists")]
    UsernameExisted,
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Stable numeric code exposed to clients.
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidArgument(_) => 400000,
            Error::InvalidAuth => 400001,
            Error::InvalidAuthMethod => 400002,
            Error::InvalidAuthToken => 400003,
            Error::Unauthorized => 401000,
            Error::Forbidden => 403000,
            Error::TokenExpired => 403002,
            Error::NotFound(_) => 404000,
            Error::Unprocessable(_) => 422000,
            Error::UsernameExisted => 422001,
            Error::Internal(_) => 500000,
            Error::Unimplemented(_) => 500001,
        }
    }

    pub fn http_status(&self) -> u16 { (self.code() / 1000) as u16 }

    /// Message safe to hand to a caller; internal causes are never leaked.
    pub fn public_message(&self) -> String {
        match self {
            Error::Internal(_) | Error::Unimplemented(_) => "internal error".to_string(),
            e => e.to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_) | Error::Unimplemented(_))
    }
}

pub mod api;
pub mod config;
pub mod constructors;
pub mod entities;
pub mod errors;
pub(crate) mod interactors;
pub mod pagination;
pub mod repositories;
pub mod session;
pub mod storage;
pub mod usecases;
pub(crate) mod utils;
pub mod views;

pub use constructors::*;

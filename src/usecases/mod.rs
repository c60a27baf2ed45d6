macro_rules! usecase {
    ($n:ident : { $( $i:tt )* } => { $( $o:tt )* }) => {
        pub mod $n {
            #[allow(unused_imports)]
            use crate::{entities, pagination, views};

            #[::async_trait::async_trait]
            pub trait Usecase {
                async fn handle(&self, data: Input) -> crate::errors::Result<Output>;
            }

            #[derive(Debug)]
            pub struct Input { $( $i )* }

            #[derive(Debug)]
            pub struct Output { $( $o )* }
        }
    };
}

pub mod attachment;
pub mod follow;
pub mod like;
pub mod status;
pub mod user;

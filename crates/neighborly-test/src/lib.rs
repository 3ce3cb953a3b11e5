//! Neighborly - integration test support.
//!
//! This crate re-exports the workspace crates so integration tests can use
//! `neighborly_test::` paths.

#![allow(ambiguous_glob_reexports)]

pub mod component {
    pub use neighborly_core::*;
    pub use neighborly_service::*;

    pub mod db {
        pub use neighborly_db::db::*;
    }

    pub mod model {
        pub use neighborly_db::model::*;
    }

    pub mod store {
        pub use neighborly_db::store::*;
    }

    pub mod middleware {
        pub use neighborly_app::middleware::*;
    }

    pub mod config {
        pub use neighborly_app::config::ConfigHandler;
        pub use neighborly_core::config::*;
    }
}

pub mod app {
    pub use neighborly_app::*;

    pub mod api {
        pub use neighborly_app::app::api::*;
    }
}

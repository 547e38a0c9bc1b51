mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod postgres;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
}
mod serialization {
    pub mod reconciler;
    pub mod recipe;
    pub mod related;
}
mod api {
    pub mod handlers;
    pub mod reply;
    pub mod routes;
}
mod config;
mod constants;

pub use api::*;
pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use serialization::*;

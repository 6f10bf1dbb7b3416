// Library for tests to access modules

pub mod channel;
pub mod config;
pub mod devices;
pub mod error;
pub mod models;
pub mod render;
pub mod routes;
pub mod series;
pub mod session;
pub mod version;
pub mod view;
pub mod worker;

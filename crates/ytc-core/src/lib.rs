pub mod config;
pub mod logging;

pub mod batch;
pub mod cache;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod resolver;
pub mod status;
pub mod throttle;

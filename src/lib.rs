pub mod config;
pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod response;
pub mod server;
pub mod sessions;
pub mod task;
pub mod tools;
pub mod validation;

pub mod client;
pub mod config;
pub mod project;
pub mod timestamp;
pub mod user;

pub use client::*;
pub use config::*;
pub use project::*;
pub use user::*;

pub mod client;
pub mod error;
pub mod redirect;

pub use client::ApiClient;
pub use error::{ApiError, FieldError};
pub use redirect::{AuthRedirect, RecordingRedirect};

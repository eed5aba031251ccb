pub mod confirm;
pub mod debounce;
pub mod dispatcher;
pub mod form;
pub mod toast;

pub use dispatcher::{Dispatcher, Fetch, Fetched, Outcome};

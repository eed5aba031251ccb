pub mod api;
pub mod app;
pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod render;
pub mod util;

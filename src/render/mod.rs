pub mod board;
pub mod html;

pub use board::{Board, Card, Column, build_board};

//! Implementation of search spaces, problems and games.

pub mod maze;
pub mod nim;

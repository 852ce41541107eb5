//! Implementation of search algorithms.
//!
//! A* does path-finding on generic search problems, and alpha-beta plays
//! generic two-player games.

pub mod alphabeta;
pub mod astar;

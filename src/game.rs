//! Two-player, zero-sum, perfect information games.
//!
//! Scores are always given from the maximiser's point of view, and lie
//! within `[LOSS, WIN]`.

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::space;

pub type Score = i32;

/// The maximiser won.
pub const WIN: Score = 1;
/// The maximiser lost.
pub const LOSS: Score = -1;

/// Scores worse than any reachable one, for each role.
pub const NEG_INF: Score = Score::MIN + 1;
pub const POS_INF: Score = Score::MAX;

/// How many children fit in a node expansion before spilling to the heap.
pub const INLINE_CHILDREN: usize = 8;

pub type Children<N> = SmallVec<[N; INLINE_CHILDREN]>;

/// A position in a game tree.
///
/// Equality and hashing must only consider what determines the value of the
/// position, so they can key a transposition table. In particular the action
/// that led to the node is not part of its identity.
pub trait GameNode: Copy + Debug + Eq + Hash {
    type Action: space::Action;

    /// The action that reached this node from its parent.
    fn action(&self) -> Self::Action;

    /// Whether the maximiser is the player to move.
    fn is_max(&self) -> bool;

    /// The score if the game is over.
    fn terminal_score(&self) -> Option<Score>;
}

pub trait Game: Debug {
    type Node: GameNode;

    /// The nodes reachable in one move, in a fixed order.
    ///
    /// Only called on non-terminal nodes, which always have children.
    fn children(&self, node: &Self::Node) -> Children<Self::Node>;
}

//! Single-pile Nim: players alternate taking between 1 and `max_removal`
//! stones, and whoever takes the last stone wins.

use std::cmp::min;
use std::hash::Hash;
use std::hash::Hasher;

use thiserror::Error;

use crate::algorithms::alphabeta::AlphaBetaSearch;
use crate::algorithms::alphabeta::Decision;
use crate::algorithms::alphabeta::GameSearchError;
use crate::algorithms::alphabeta::GameSearchLimits;
use crate::game::Children;
use crate::game::Game;
use crate::game::GameNode;
use crate::game::LOSS;
use crate::game::Score;
use crate::game::WIN;
use crate::space::Action;

pub type NimAction = u32;
impl Action for NimAction {}

/// A Nim position.
///
/// Two nodes are the same position when they have the same stones left and
/// the same player to move, no matter how they were reached.
#[derive(Copy, Clone, Debug)]
pub struct NimNode {
    pub remaining: u32,
    /// Stones taken to reach this node. 0 for roots.
    pub action: NimAction,
    /// Whether the maximiser moves next.
    pub is_max: bool,
}

impl NimNode {
    pub fn root(remaining: u32, is_max: bool) -> Self {
        Self {
            remaining,
            action: 0,
            is_max,
        }
    }
}

impl PartialEq for NimNode {
    fn eq(&self, other: &Self) -> bool {
        self.remaining == other.remaining && self.is_max == other.is_max
    }
}
impl Eq for NimNode {}

impl Hash for NimNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.remaining.hash(state);
        self.is_max.hash(state);
    }
}

impl GameNode for NimNode {
    type Action = NimAction;

    fn action(&self) -> NimAction {
        self.action
    }
    fn is_max(&self) -> bool {
        self.is_max
    }

    /// Whoever moved into an empty pile took the last stone.
    fn terminal_score(&self) -> Option<Score> {
        match (self.remaining, self.is_max) {
            (0, true) => Some(LOSS),
            (0, false) => Some(WIN),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nim {
    max_removal: u32,
}

impl Nim {
    pub fn new(max_removal: u32) -> Result<Self, NimError> {
        if max_removal < 1 {
            return Err(NimError::InvalidMaxRemoval(max_removal));
        }
        Ok(Self { max_removal })
    }
    pub fn max_removal(&self) -> u32 {
        self.max_removal
    }
}

impl Game for Nim {
    type Node = NimNode;

    fn children(&self, node: &NimNode) -> Children<NimNode> {
        (1..=min(self.max_removal, node.remaining))
            .map(|k| NimNode {
                remaining: node.remaining - k,
                action: k,
                is_max: !node.is_max,
            })
            .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NimError {
    #[error("Players must be allowed to remove at least 1 stone, not {0}")]
    InvalidMaxRemoval(u32),
    #[error("There are no stones left to remove")]
    NoStones,
    #[error("Search budget exhausted after expanding {expanded} nodes")]
    BudgetExhausted { expanded: usize },
}

impl From<GameSearchError> for NimError {
    fn from(e: GameSearchError) -> Self {
        match e {
            GameSearchError::BudgetExhausted { expanded } => NimError::BudgetExhausted { expanded },
            GameSearchError::TerminalRoot => NimError::NoStones,
        }
    }
}

/// Plays Nim optimally with alpha-beta search.
///
/// The search tree is as deep as the pile, and it's kept on the heap, so
/// large piles only cost memory and time. Use limits to bound the time.
///
/// ```
/// use search::problems::nim::NimPlayer;
///
/// let player = NimPlayer::new(3).unwrap();
/// assert_eq!(player.choose(7), Ok(3));
/// ```
#[derive(Clone, Debug)]
pub struct NimPlayer {
    game: Nim,
    limits: GameSearchLimits,
}

impl NimPlayer {
    pub fn new(max_removal: u32) -> Result<Self, NimError> {
        Ok(Self {
            game: Nim::new(max_removal)?,
            limits: GameSearchLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: GameSearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_removal(&self) -> u32 {
        self.game.max_removal()
    }

    /// The number of stones to take from a pile of `remaining`.
    pub fn choose(&self, remaining: u32) -> Result<NimAction, NimError> {
        Ok(self.decide(remaining)?.action)
    }

    /// The best move along with its score for the mover, `WIN` or `LOSS`.
    pub fn decide(&self, remaining: u32) -> Result<Decision<NimAction>, NimError> {
        if remaining == 0 {
            return Err(NimError::NoStones);
        }
        let mut search = AlphaBetaSearch::new(&self.game, self.limits);
        let decision = search.decide(&NimNode::root(remaining, true))?;

        assert!(
            (1..=min(self.max_removal(), remaining)).contains(&decision.action),
            "Chose to take {} out of {remaining} stones (max {})",
            decision.action,
            self.max_removal()
        );
        log::debug!(
            "Taking {} of {remaining} (score {}, {} expansions, {} memo hits)",
            decision.action,
            decision.score,
            search.expanded(),
            search.table().hits()
        );
        Ok(decision)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NimMove {
    /// 0 for the first player, 1 for the second.
    pub player: usize,
    pub taken: NimAction,
    /// Stones left after the move.
    pub remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NimOutcome {
    pub moves: Vec<NimMove>,
    /// The player that took the last stone.
    pub winner: usize,
}

/// Plays a whole game between two players, starting with `players[0]`.
pub fn play_match(players: [&NimPlayer; 2], remaining: u32) -> Result<NimOutcome, NimError> {
    if remaining == 0 {
        return Err(NimError::NoStones);
    }
    let max_removal = players[0].max_removal();
    let mut moves = vec![];
    let mut left = remaining;
    let mut player = 0;

    loop {
        let taken = players[player].choose(left)?;
        debug_assert!(taken <= max_removal);
        left -= taken;
        moves.push(NimMove {
            player,
            taken,
            remaining: left,
        });
        if left == 0 {
            return Ok(NimOutcome {
                moves,
                winner: player,
            });
        }
        player = 1 - player;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn seven_stones_take_three() {
        let player = NimPlayer::new(3).unwrap();
        assert_eq!(player.choose(7), Ok(3));
        let decision = player.decide(7).unwrap();
        assert_eq!(decision.score, WIN);
    }

    #[test]
    fn losing_positions_take_one() {
        let player = NimPlayer::new(3).unwrap();
        assert_eq!(player.decide(8).unwrap(), Decision {
            action: 1,
            score: LOSS
        });
    }

    #[test]
    fn invalid_inputs() {
        assert_eq!(Nim::new(0), Err(NimError::InvalidMaxRemoval(0)));
        assert_eq!(NimPlayer::new(0).unwrap_err(), NimError::InvalidMaxRemoval(0));
        let player = NimPlayer::new(2).unwrap();
        assert_eq!(player.choose(0), Err(NimError::NoStones));
    }

    #[test]
    fn small_piles_take_everything() {
        let player = NimPlayer::new(5).unwrap();
        for remaining in 1..=5 {
            assert_eq!(player.choose(remaining), Ok(remaining));
        }
    }

    #[test]
    fn oracle_agreement() {
        for max_removal in 1..=5 {
            let player = NimPlayer::new(max_removal).unwrap();
            for remaining in 1..=50 {
                let chosen = player.choose(remaining).unwrap();
                assert!((1..=min(max_removal, remaining)).contains(&chosen));
                match remaining % (max_removal + 1) {
                    0 => assert_eq!(chosen, 1),
                    winning => {
                        assert_eq!(chosen, winning, "remaining={remaining} m={max_removal}");
                        assert_eq!((remaining - chosen) % (max_removal + 1), 0);
                    }
                }
            }
        }
    }

    #[test]
    fn node_identity_ignores_action() {
        let a = NimNode {
            remaining: 4,
            action: 1,
            is_max: false,
        };
        let b = NimNode {
            remaining: 4,
            action: 3,
            is_max: false,
        };
        assert_eq!(a, b);
        assert_ne!(a, NimNode::root(4, true));

        let mut set = rustc_hash::FxHashSet::default();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn terminal_scores() {
        assert_eq!(NimNode::root(0, true).terminal_score(), Some(LOSS));
        assert_eq!(NimNode::root(0, false).terminal_score(), Some(WIN));
        assert_eq!(NimNode::root(1, false).terminal_score(), None);
    }

    #[test]
    fn children_in_action_order() {
        let game = Nim::new(3).unwrap();
        let children = game.children(&NimNode::root(2, true));
        let actions: Vec<_> = children.iter().map(|c| c.action).collect();
        assert_eq!(actions, vec![1, 2]);
        assert!(children.iter().all(|c| !c.is_max));
        assert_eq!(children[1].remaining, 0);
    }

    #[test]
    fn large_piles() {
        for max_removal in [3, 7] {
            let player = NimPlayer::new(max_removal).unwrap();
            for remaining in [10_000, 100_000, 100_001] {
                let expected = match remaining % (max_removal + 1) {
                    0 => 1,
                    winning => winning,
                };
                assert_eq!(
                    player.choose(remaining),
                    Ok(expected),
                    "remaining={remaining} m={max_removal}"
                );
            }
        }
    }

    #[test]
    fn budget() {
        let player = NimPlayer::new(3).unwrap().with_limits(GameSearchLimits {
            max_expansions: Some(10),
        });
        assert_eq!(
            player.choose(100),
            Err(NimError::BudgetExhausted { expanded: 10 })
        );
        assert_eq!(player.choose(3), Ok(3));
    }

    #[test]
    fn match_between_agents() {
        let player = NimPlayer::new(3).unwrap();
        let outcome = play_match([&player, &player], 10).unwrap();
        assert_eq!(outcome.winner, 0);
        assert_eq!(outcome.moves[0].taken, 2);
        assert_eq!(outcome.moves.last().map(|m| m.remaining), Some(0));
        let total: u32 = outcome.moves.iter().map(|m| m.taken).sum();
        assert_eq!(total, 10);

        assert_eq!(play_match([&player, &player], 0), Err(NimError::NoStones));
    }

    proptest! {
        #[test]
        fn choose_follows_the_closed_form(remaining in 1u32..120, max_removal in 1u32..9) {
            let player = NimPlayer::new(max_removal).unwrap();
            let chosen = player.choose(remaining).unwrap();
            prop_assert!(chosen >= 1 && chosen <= min(max_removal, remaining));
            let modulo = remaining % (max_removal + 1);
            if modulo != 0 {
                prop_assert_eq!(chosen, modulo);
            }
        }

        #[test]
        fn first_player_wins_iff_not_a_multiple(remaining in 1u32..60, max_removal in 1u32..6) {
            let player = NimPlayer::new(max_removal).unwrap();
            let outcome = play_match([&player, &player], remaining).unwrap();
            let first_wins = remaining % (max_removal + 1) != 0;
            prop_assert_eq!(outcome.winner == 0, first_wins);
            for (i, m) in outcome.moves.iter().enumerate() {
                prop_assert_eq!(m.player, i % 2);
                prop_assert!(m.taken >= 1 && m.taken <= max_removal);
            }
        }
    }
}

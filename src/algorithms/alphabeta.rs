//! Minimax with alpha-beta pruning and a transposition table.

use std::cmp::max;
use std::cmp::min;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::game::Children;
use crate::game::Game;
use crate::game::GameNode;
use crate::game::LOSS;
use crate::game::NEG_INF;
use crate::game::POS_INF;
use crate::game::Score;
use crate::game::WIN;

/// What a stored score says about the true minimax value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    /// The score is the value.
    Exact,
    /// The value is at least the score (the search failed high).
    Lower,
    /// The value is at most the score (the search failed low).
    Upper,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TTEntry {
    pub score: Score,
    pub bound: Bound,
    /// The role of the player to move at the stored node.
    pub is_max: bool,
}

/// Memo bank from game positions to their (possibly bounded) scores.
#[derive(Debug)]
pub struct TranspositionTable<N: GameNode> {
    entries: FxHashMap<N, TTEntry>,
    hits: usize,
}

impl<N: GameNode> TranspositionTable<N> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            hits: 0,
        }
    }

    pub fn probe(&mut self, node: &N) -> Option<TTEntry> {
        let entry = *self.entries.get(node)?;
        assert_eq!(
            entry.is_max,
            node.is_max(),
            "Transposition table entry for {node:?} has the wrong role"
        );
        self.hits += 1;
        Some(entry)
    }

    pub fn store(&mut self, node: N, score: Score, bound: Bound) {
        let entry = TTEntry {
            score,
            bound,
            is_max: node.is_max(),
        };
        match self.entries.get(&node) {
            // Keep what's known exactly
            Some(old) if old.bound == Bound::Exact && bound != Bound::Exact => {}
            _ => {
                self.entries.insert(node, entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl<N: GameNode> Default for TranspositionTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds on how much work a search may do.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GameSearchLimits {
    /// Stop after expanding this many nodes.
    pub max_expansions: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameSearchError {
    #[error("Search budget exhausted after expanding {expanded} nodes")]
    BudgetExhausted { expanded: usize },
    #[error("The root is terminal, there's nothing to choose")]
    TerminalRoot,
}

/// The best move found for the root, and its score.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decision<A> {
    pub action: A,
    pub score: Score,
}

#[derive(Debug)]
pub struct AlphaBetaSearch<'g, G: Game> {
    game: &'g G,
    table: TranspositionTable<G::Node>,
    limits: GameSearchLimits,
    expanded: usize,
}

impl<'g, G: Game> AlphaBetaSearch<'g, G> {
    pub fn new(game: &'g G, limits: GameSearchLimits) -> Self {
        Self {
            game,
            table: TranspositionTable::new(),
            limits,
            expanded: 0,
        }
    }

    pub fn expanded(&self) -> usize {
        self.expanded
    }
    pub fn table(&self) -> &TranspositionTable<G::Node> {
        &self.table
    }

    /// The minimax value of a node.
    ///
    /// Searching with the `(LOSS, WIN)` window is exact, as no value lies
    /// outside of it.
    pub fn value(&mut self, node: &G::Node) -> Result<Score, GameSearchError> {
        self.alpha_beta(node, LOSS, WIN)
    }

    /// Picks the root's best child, preferring the earliest on ties.
    pub fn decide(
        &mut self,
        root: &G::Node,
    ) -> Result<Decision<<G::Node as GameNode>::Action>, GameSearchError> {
        if root.terminal_score().is_some() {
            return Err(GameSearchError::TerminalRoot);
        }
        let is_max = root.is_max();
        let (mut alpha, mut beta) = (LOSS, WIN);
        let mut best: Option<Decision<_>> = None;

        for child in self.game.children(root) {
            let score = self.alpha_beta(&child, alpha, beta)?;
            log::trace!("{root:?} -> {child:?}: {score}");

            let improves = match best {
                None => true,
                Some(b) if is_max => score > b.score,
                Some(b) => score < b.score,
            };
            if improves {
                best = Some(Decision {
                    action: child.action(),
                    score,
                });
                if is_max {
                    alpha = max(alpha, score);
                } else {
                    beta = min(beta, score);
                }
            }
            // A won game can't get better.
            if (is_max && score >= WIN) || (!is_max && score <= LOSS) {
                break;
            }
        }

        best.ok_or(GameSearchError::TerminalRoot)
    }

    /// Fail-soft alpha-beta.
    ///
    /// The result is exact when it lies strictly within `(alpha, beta)`, an
    /// upper bound when `<= alpha` and a lower bound when `>= beta`.
    ///
    /// Runs on an explicit stack of frames, so the depth of the game is only
    /// limited by memory.
    fn alpha_beta(
        &mut self,
        root: &G::Node,
        alpha: Score,
        beta: Score,
    ) -> Result<Score, GameSearchError> {
        let mut stack = match self.open(root, alpha, beta)? {
            Opened::Scored(score) => return Ok(score),
            Opened::Expanded(frame) => vec![frame],
        };

        while let Some(frame) = stack.last_mut() {
            match frame.next_child() {
                Some((child, alpha, beta)) => match self.open(&child, alpha, beta)? {
                    Opened::Scored(score) => frame.absorb(score),
                    Opened::Expanded(child_frame) => stack.push(child_frame),
                },
                None => {
                    let Some(done) = stack.pop() else { break };
                    let score = self.close(done);
                    match stack.last_mut() {
                        Some(parent) => parent.absorb(score),
                        None => return Ok(score),
                    }
                }
            }
        }
        unreachable!("The root frame returns its own score")
    }

    /// Scores a node straight away when possible, or expands it into a frame.
    fn open(
        &mut self,
        node: &G::Node,
        mut alpha: Score,
        mut beta: Score,
    ) -> Result<Opened<G::Node>, GameSearchError> {
        if let Some(score) = node.terminal_score() {
            return Ok(Opened::Scored(score));
        }

        let (alpha_in, beta_in) = (alpha, beta);
        if let Some(entry) = self.table.probe(node) {
            match entry.bound {
                Bound::Exact => return Ok(Opened::Scored(entry.score)),
                Bound::Lower => alpha = max(alpha, entry.score),
                Bound::Upper => beta = min(beta, entry.score),
            }
            if beta <= alpha {
                return Ok(Opened::Scored(entry.score));
            }
        }

        if let Some(max_expansions) = self.limits.max_expansions {
            if self.expanded >= max_expansions {
                log::warn!("Alpha-beta gave up after expanding {} nodes", self.expanded);
                return Err(GameSearchError::BudgetExhausted {
                    expanded: self.expanded,
                });
            }
        }
        self.expanded += 1;

        let children = self.game.children(node);
        debug_assert!(!children.is_empty(), "{node:?} isn't terminal");

        Ok(Opened::Expanded(Frame {
            node: *node,
            alpha,
            beta,
            alpha_in,
            beta_in,
            best: if node.is_max() { NEG_INF } else { POS_INF },
            children,
            next: 0,
        }))
    }

    /// Stores a finished frame's score and hands it back.
    fn close(&mut self, frame: Frame<G::Node>) -> Score {
        let best = frame.best;
        // Bounds at the edge of the score range are exact.
        let bound = if best <= frame.alpha_in && best > LOSS {
            Bound::Upper
        } else if best >= frame.beta_in && best < WIN {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.table.store(frame.node, best, bound);
        best
    }
}

enum Opened<N: GameNode> {
    Scored(Score),
    Expanded(Frame<N>),
}

/// A node whose children are being searched.
#[derive(Debug)]
struct Frame<N: GameNode> {
    node: N,
    alpha: Score,
    beta: Score,
    /// The window the node was entered with, before any table narrowing.
    alpha_in: Score,
    beta_in: Score,
    best: Score,
    children: Children<N>,
    next: usize,
}

impl<N: GameNode> Frame<N> {
    /// The next child to search and its window, unless the frame is done.
    fn next_child(&mut self) -> Option<(N, Score, Score)> {
        if self.beta <= self.alpha {
            return None;
        }
        let child = *self.children.get(self.next)?;
        self.next += 1;
        Some((child, self.alpha, self.beta))
    }

    fn absorb(&mut self, score: Score) {
        if self.node.is_max() {
            self.best = max(self.best, score);
            self.alpha = max(self.alpha, self.best);
        } else {
            self.best = min(self.best, score);
            self.beta = min(self.beta, self.best);
        }
    }
}

use std::cmp::min;
use std::fmt::Debug;
use std::marker::PhantomData;

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::data_structures::frontier::AStarRank;
use crate::data_structures::frontier::Frontier;
use crate::problem::Problem;
use crate::problem::ProblemError;
use crate::search::SearchTree;
use crate::search::SearchTreeIndex;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// A heuristic estimating the cost between two states.
///
/// Must not overestimate for A* to return optimal paths.
pub trait ObjectiveHeuristic<Sp, St, A, C>: Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn h(_s: &St, _goal: &St) -> C {
        C::zero()
    }
}

/// The uninformed heuristic. Turns A* into a uniform-cost search.
#[derive(Debug)]
pub struct ZeroHeuristic;

impl<Sp, St, A, C> ObjectiveHeuristic<Sp, St, A, C> for ZeroHeuristic
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
}

/// The states the heuristic aims for.
///
/// Decided once per problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Objective<St: State> {
    Goals(Vec<St>),
    KeyThenGoals { key: St, goals: Vec<St> },
}

impl<St: State> Objective<St> {
    pub fn new(goals: &[St], key: Option<St>) -> Self {
        match key {
            Some(key) => Objective::KeyThenGoals {
                key,
                goals: goals.to_vec(),
            },
            None => Objective::Goals(goals.to_vec()),
        }
    }

    /// The targets for a node, given whether its path collected the key.
    #[inline(always)]
    pub fn targets(&self, has_key: bool) -> &[St] {
        match self {
            Objective::Goals(goals) => goals.as_slice(),
            Objective::KeyThenGoals { key, .. } if !has_key => std::slice::from_ref(key),
            Objective::KeyThenGoals { goals, .. } => goals.as_slice(),
        }
    }

    /// Whether a path arriving at `s` holds the key.
    #[inline(always)]
    pub fn collects_key(&self, had_key: bool, s: &St) -> bool {
        match self {
            Objective::Goals(_) => true,
            Objective::KeyThenGoals { key, .. } => had_key || key == s,
        }
    }
}

/// Bounds on how much work a search may do.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Stop after expanding this many nodes.
    pub max_expansions: Option<usize>,
}

impl SearchLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }
    pub fn with_max_expansions(max_expansions: usize) -> Self {
        Self {
            max_expansions: Some(max_expansions),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError<St> {
    #[error("No path exists")]
    NoPath,
    #[error("Search budget exhausted after expanding {expanded} nodes")]
    BudgetExhausted { expanded: usize },
    #[error("Invalid problem: {0}")]
    InvalidProblem(#[from] ProblemError<St>),
}

#[derive(Debug)]
pub struct AStarSearch<OH, P, Sp, St, A, C>
where
    OH: ObjectiveHeuristic<Sp, St, A, C>,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    /// All the Search Nodes. Each node may have a parent Node.
    search_tree: SearchTree<St, A, C>,

    /// Nodes waiting to be expanded.
    open: Frontier<C>,

    /// The expanded `(State, has_key)` pairs.
    ///
    /// Re-expanding a pair can't find a cheaper path with a consistent
    /// heuristic, and would never stop on unsolvable problems.
    closed: FxHashSet<(St, bool)>,

    objective: Objective<St>,
    limits: SearchLimits,

    expanded: usize,
    /// Goal candidates that failed `Problem::test_solution`.
    rejected: usize,

    problem: P,

    _phantom_heuristic: PhantomData<OH>,
    _phantom_space: PhantomData<Sp>,
}

impl<OH, P, Sp, St, A, C> AStarSearch<OH, P, Sp, St, A, C>
where
    OH: ObjectiveHeuristic<Sp, St, A, C>,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    /// Prepares a search, failing if the problem is malformed.
    pub fn new(problem: P, limits: SearchLimits) -> Result<Self, SolveError<St>> {
        problem.check()?;

        let objective = Objective::new(problem.goals(), problem.key());
        let mut search = Self {
            search_tree: SearchTree::new(),
            open: Frontier::new(),
            closed: FxHashSet::default(),
            objective,
            limits,
            expanded: 0,
            rejected: 0,
            problem,
            _phantom_heuristic: PhantomData,
            _phantom_space: PhantomData,
        };

        let start = search.problem.start();
        let has_key = search.objective.collects_key(false, &start);
        let h = search.h(&start, has_key);
        let root = search
            .search_tree
            .push(SearchTreeNode::new_root(start, has_key, h));
        search.open.push(AStarRank::new(C::zero(), h), root);

        Ok(search)
    }

    /// Runs the search to the first valid goal.
    pub fn solve(&mut self) -> Result<Path<St, A, C>, SolveError<St>> {
        log::debug!(
            "A* from {} towards {:?}",
            self.problem.start(),
            self.objective
        );

        while let Some(entry) = self.open.pop() {
            let node_index = entry.node_index;
            let node = &self.search_tree[node_index];
            let (state, has_key, g) = (node.state, node.has_key, node.g);

            if self.closed.contains(&(state, has_key)) {
                continue;
            }

            if self.problem.is_goal(&state) {
                if let Some(path) = self.accept(node_index) {
                    log::debug!(
                        "Found {path} after expanding {} nodes",
                        self.expanded
                    );
                    return Ok(path);
                }
            }

            if let Some(max) = self.limits.max_expansions {
                if self.expanded >= max {
                    log::warn!("A* gave up after expanding {} nodes", self.expanded);
                    return Err(SolveError::BudgetExhausted {
                        expanded: self.expanded,
                    });
                }
            }

            self.closed.insert((state, has_key));
            self.expanded += 1;
            log::trace!("Expanding {state} (key: {has_key}, f: {})", entry.rank.f());

            for (s, a) in self.problem.space().neighbours(&state) {
                let child_has_key = self.objective.collects_key(has_key, &s);
                if self.closed.contains(&(s, child_has_key)) {
                    continue;
                }
                let c: C = self.problem.space().cost(&s);
                let child_g = g.saturating_add(&c);
                let child_h = self.h(&s, child_has_key);

                let child = self.search_tree.push(SearchTreeNode::new(
                    s,
                    (node_index, a),
                    child_has_key,
                    child_g,
                    child_h,
                ));
                self.open.push(AStarRank::new(child_g, child_h), child);
            }
        }

        log::debug!("No path after expanding {} nodes", self.expanded);
        Err(SolveError::NoPath)
    }

    /// Retraces a goal candidate and validates it against the problem.
    fn accept(&mut self, node_index: SearchTreeIndex) -> Option<Path<St, A, C>> {
        let path = self.search_tree.path(self.problem.space(), node_index);
        debug_assert!(path.seems_valid());
        debug_assert!(self.problem.space().valid_path(&path));

        match self.problem.test_solution(&path.actions) {
            Ok(cost) => {
                debug_assert_eq!(cost, path.cost);
                Some(path)
            }
            Err(e) => {
                log::debug!("Rejected goal candidate {path}: {e}");
                self.rejected += 1;
                None
            }
        }
    }

    #[inline(always)]
    #[must_use]
    pub(crate) fn h(&self, s: &St, has_key: bool) -> C {
        let mut h = C::max_value();
        for g in self.objective.targets(has_key) {
            h = min(h, OH::h(s, g))
        }
        h
    }

    pub fn expanded(&self) -> usize {
        self.expanded
    }
    pub fn rejected(&self) -> usize {
        self.rejected
    }
    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use std::mem::size_of;
        use thousands::Separable;

        writeln!(out, "AStarSearch Stats:")?;
        let s = size_of::<SearchTreeNode<St, A, C>>();
        let l = self.search_tree.len();
        writeln!(
            out,
            "  - |Nodes|:  {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;

        let l = self.open.len();
        let c = self.open.capacity();
        writeln!(out, "  - |Open|:   {}", l.separate_with_commas())?;
        writeln!(out, "  - |Open|*:  {}", c.separate_with_commas())?;

        let s = size_of::<(St, bool)>();
        let l = self.closed.len();
        writeln!(
            out,
            "  - |Closed|: {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - Expanded nodes: {}",
            self.expanded.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Rejected candidates: {}",
            self.rejected.separate_with_commas()
        )?;

        Ok(())
    }
}

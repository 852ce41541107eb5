use std::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;

use num_traits::SaturatingAdd;
use num_traits::sign::Unsigned;
use smallvec::SmallVec;

/// The most transitions a single state can offer without spilling to the heap.
pub const INLINE_NEIGHBOURS: usize = 4;

pub type Neighbours<St, A> = SmallVec<[(St, A); INLINE_NEIGHBOURS]>;

pub trait Action: Copy + Clone + Debug + Display + PartialEq + Eq {}
pub trait State: Copy + Clone + Debug + Display + PartialEq + Eq + Hash {}
pub trait Cost:
    Copy
    + Clone
    + Debug
    + Display
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + SaturatingAdd
    + Unsigned
    + num_traits::bounds::UpperBounded
    + std::ops::Add
    + std::ops::AddAssign
{
    fn valid(&self) -> bool {
        *self != Self::max_value()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    pub start: S,
    pub end: S,
    pub cost: C,
    pub actions: Vec<A>,
}

impl<S, A, C> Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn new_from_start(start: S) -> Self {
        Self {
            start,
            end: start,
            cost: C::zero(),
            actions: vec![],
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Runs sanity checks
    #[inline(always)]
    pub fn seems_valid(&self) -> bool {
        self.cost.valid() && (!self.is_empty() || self.start == self.end)
    }

    /// Prepends the step that reached the current start of the path.
    ///
    /// Paths are naturally rebuilt backwards from the goal, so the steps are
    /// stacked and flipped once with [`Path::reverse_actions`].
    #[inline(always)]
    pub fn push_back_step(&mut self, previous: S, a: A, c: C) {
        self.actions.push(a);
        self.start = previous;
        self.cost = self.cost.saturating_add(&c);
    }

    pub fn reverse_actions(&mut self) {
        self.actions.reverse();
    }

    /// The action labels, as they'd be printed.
    pub fn labels(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.to_string()).collect()
    }
}

impl<S, A, C> Display for Path<S, A, C>
where
    S: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Path({}, {}:", self.cost, self.start)?;
        for a in self.actions.iter().take(40) {
            write!(f, "{a}")?;
        }
        if self.actions.len() > 40 {
            write!(f, "…")?;
        }
        write!(f, ":{})", self.end)
    }
}

pub trait Space<St, A, C>: Clone + Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Applies an action, if it leads to a valid State.
    fn apply(&self, s: &St, a: &A) -> Option<St>;

    /// Cost of moving into `s`.
    fn cost(&self, _s: &St) -> C {
        C::one()
    }

    /// Expands a State, yielding the valid `(next_state, action)` transitions
    /// in a fixed order.
    fn neighbours(&self, s: &St) -> Neighbours<St, A>;

    /// Verify is a State is valid.
    fn valid(&self, s: &St) -> bool;

    /// Replays the actions of a path, checking every step and its cost.
    fn valid_path(&self, p: &Path<St, A, C>) -> bool {
        if !self.valid(&p.start) {
            return false;
        }
        let mut state = p.start;
        let mut cost = C::zero();
        for a in &p.actions {
            match self.apply(&state, a) {
                Some(next) => {
                    cost = cost.saturating_add(&self.cost(&next));
                    state = next;
                }
                None => return false,
            }
        }
        state == p.end && cost == p.cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::maze::MazeAction;
    use crate::problems::maze::MazeCost;
    use crate::problems::maze::MazeState;

    #[test]
    fn path_rebuilt_backwards() {
        let goal = MazeState::new(0, 2);
        let mut path = Path::<MazeState, MazeAction, MazeCost>::new_from_start(goal);
        assert!(path.is_empty());
        assert!(path.seems_valid());

        path.push_back_step(MazeState::new(0, 1), MazeAction::Right, 1);
        path.push_back_step(MazeState::new(0, 0), MazeAction::Right, 3);
        path.reverse_actions();

        assert_eq!(path.start, MazeState::new(0, 0));
        assert_eq!(path.end, goal);
        assert_eq!(path.cost, 4);
        assert_eq!(path.labels(), vec!["R", "R"]);
        assert_eq!(path.to_string(), "Path(4, (0,0):RR:(0,2))");
    }
}

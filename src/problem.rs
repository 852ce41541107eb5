use thiserror::Error;

use crate::space::Action;
use crate::space::Cost;
use crate::space::Space;
use crate::space::State;

/// Reasons a problem can't be searched at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProblemError<St> {
    #[error("The initial state {0:?} is not a valid cell")]
    InvalidStart(St),
    #[error("The goal {0:?} is not a valid cell")]
    InvalidGoal(St),
    #[error("The key {0:?} is not a valid cell")]
    InvalidKey(St),
    #[error("The problem has no goals")]
    NoGoals,
}

/// Reasons a candidate solution does not solve a problem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolutionError<St> {
    #[error("Step {step} can't be taken from {from:?}")]
    IllegalMove { step: usize, from: St },
    #[error("The solution ends at {0:?}, which is not a goal")]
    NotAGoal(St),
    #[error("The solution reaches a goal without collecting the key")]
    MissingKey,
}

/// A search problem over a Space.
///
/// Problems may ask for a key to be collected before any goal counts.
pub trait Problem<Sp, St, A, C>: std::fmt::Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn space(&self) -> &Sp;
    fn start(&self) -> St;
    fn goals(&self) -> &[St];
    fn key(&self) -> Option<St> {
        None
    }

    fn is_goal(&self, s: &St) -> bool {
        self.goals().contains(s)
    }

    /// Verifies the problem is well-formed.
    fn check(&self) -> Result<(), ProblemError<St>> {
        let space = self.space();
        let start = self.start();
        if !space.valid(&start) {
            return Err(ProblemError::InvalidStart(start));
        }
        if self.goals().is_empty() {
            return Err(ProblemError::NoGoals);
        }
        if let Some(goal) = self.goals().iter().find(|g| !space.valid(g)) {
            return Err(ProblemError::InvalidGoal(*goal));
        }
        match self.key() {
            Some(key) if !space.valid(&key) => Err(ProblemError::InvalidKey(key)),
            _ => Ok(()),
        }
    }

    /// Replays a sequence of actions from the start.
    ///
    /// Returns the total cost when the actions solve the problem.
    fn test_solution(&self, actions: &[A]) -> Result<C, SolutionError<St>> {
        let space = self.space();
        let key = self.key();
        let mut state = self.start();
        let mut has_key = key.is_none_or(|k| k == state);
        let mut cost = C::zero();

        for (step, a) in actions.iter().enumerate() {
            state = space
                .apply(&state, a)
                .ok_or(SolutionError::IllegalMove { step, from: state })?;
            cost = cost.saturating_add(&space.cost(&state));
            has_key |= key == Some(state);
        }

        if !self.is_goal(&state) {
            return Err(SolutionError::NotAGoal(state));
        }
        if !has_key {
            return Err(SolutionError::MissingKey);
        }
        Ok(cost)
    }
}

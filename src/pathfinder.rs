//! Maze solving entry points.

use crate::algorithms::astar::AStarSearch;
use crate::algorithms::astar::SearchLimits;
use crate::algorithms::astar::SolveError;
use crate::problems::maze::MazeAction;
use crate::problems::maze::MazeCost;
use crate::problems::maze::MazeHeuristicManhattanDistance;
use crate::problems::maze::MazeProblem;
use crate::problems::maze::MazeSpace;
use crate::problems::maze::MazeState;

pub type MazeSearch = AStarSearch<
    MazeHeuristicManhattanDistance,
    MazeProblem,
    MazeSpace,
    MazeState,
    MazeAction,
    MazeCost,
>;

/// The cheapest sequence of actions solving a maze.
///
/// ```
/// use search::pathfinder::solve;
/// use search::problems::maze::MazeProblem;
///
/// let maze = MazeProblem::try_from("I.\nXG").unwrap();
/// let actions = solve(&maze).unwrap();
/// assert_eq!(actions.iter().map(|a| a.to_string()).collect::<String>(), "RD");
/// ```
pub fn solve(problem: &MazeProblem) -> Result<Vec<MazeAction>, SolveError<MazeState>> {
    solve_with_limits(problem, SearchLimits::unlimited())
}

pub fn solve_with_limits(
    problem: &MazeProblem,
    limits: SearchLimits,
) -> Result<Vec<MazeAction>, SolveError<MazeState>> {
    let mut search = MazeSearch::new(problem.clone(), limits)?;
    Ok(search.solve()?.actions)
}

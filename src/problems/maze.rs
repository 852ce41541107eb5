use derive_more::Display;
use smallvec::SmallVec;
use thiserror::Error;

use crate::algorithms::astar::ObjectiveHeuristic;
use crate::problem::Problem;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Neighbours;
use crate::space::Space;
use crate::space::State;

const MAX_ELEMENTS_DISPLAYED: usize = 40;
const RANDOM_STATE_MAX_TRIES: usize = 10_000;

pub type Coord = u32;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("({row},{col})")]
pub struct MazeState {
    pub row: Coord,
    pub col: Coord,
}

impl MazeState {
    pub const fn new(row: Coord, col: Coord) -> Self {
        Self { row, col }
    }
}
impl State for MazeState {}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MazeAction {
    #[display("U")]
    Up, // row--
    #[display("D")]
    Down, // row++
    #[display("L")]
    Left, // col--
    #[display("R")]
    Right, // col++
}
impl Action for MazeAction {}

impl MazeAction {
    pub const ALL: [MazeAction; 4] = [
        MazeAction::Up,
        MazeAction::Down,
        MazeAction::Left,
        MazeAction::Right,
    ];
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid action '{0}'")]
pub struct MazeActionParseError(char);

impl std::convert::TryFrom<char> for MazeAction {
    type Error = MazeActionParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            'U' => Ok(MazeAction::Up),
            'D' => Ok(MazeAction::Down),
            'L' => Ok(MazeAction::Left),
            'R' => Ok(MazeAction::Right),
            ch => Err(MazeActionParseError(ch)),
        }
    }
}

pub type MazeCost = u32;
impl Cost for MazeCost {}

const OPEN_COST: MazeCost = 1;
const MUD_COST: MazeCost = 3;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum MazeCell {
    #[display(".")]
    Open,
    #[display("X")]
    Wall,
    #[display("M")]
    Mud,
}

impl MazeCell {
    /// Cost of stepping into this cell, if it can be entered at all.
    pub fn cost(&self) -> Option<MazeCost> {
        match self {
            MazeCell::Open => Some(OPEN_COST),
            MazeCell::Mud => Some(MUD_COST),
            MazeCell::Wall => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeCellParseError {
    #[error("Invalid character '{0}' found.")]
    InvalidCharacter(char),
}

impl std::convert::TryFrom<char> for MazeCell {
    type Error = MazeCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            '.' | ' ' => Ok(MazeCell::Open),
            'X' | '#' => Ok(MazeCell::Wall),
            'M' => Ok(MazeCell::Mud),
            ch => Err(MazeCellParseError::InvalidCharacter(ch)),
        }
    }
}

/// A rectangular grid of cells.
#[derive(Clone, PartialEq, Eq)]
pub struct MazeSpace {
    rows: usize,
    cols: usize,
    cells: Vec<MazeCell>,
}

impl MazeSpace {
    pub fn new_empty_with_dimensions(rows: usize, cols: usize) -> Self {
        debug_assert!(rows <= Coord::MAX as usize);
        debug_assert!(cols <= Coord::MAX as usize);
        Self {
            rows,
            cols,
            cells: vec![MazeCell::Open; rows * cols],
        }
    }

    /// A random maze where every cell is a wall with probability
    /// `wall_density`, and otherwise mud with probability `mud_density`.
    pub fn new_random<R: rand::Rng>(
        r: &mut R,
        rows: usize,
        cols: usize,
        wall_density: f64,
        mud_density: f64,
    ) -> Self {
        let mut space = Self::new_empty_with_dimensions(rows, cols);
        for cell in space.cells.iter_mut() {
            *cell = if r.random_bool(wall_density) {
                MazeCell::Wall
            } else if r.random_bool(mud_density) {
                MazeCell::Mud
            } else {
                MazeCell::Open
            };
        }
        space
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline(always)]
    fn offset(&self, state: &MazeState) -> Option<usize> {
        let (row, col) = (state.row as usize, state.col as usize);
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    #[inline(always)]
    pub fn at(&self, state: &MazeState) -> Option<MazeCell> {
        self.offset(state).map(|i| self.cells[i])
    }

    pub fn set(&mut self, state: &MazeState, cell: MazeCell) {
        let i = self
            .offset(state)
            .unwrap_or_else(|| panic!("{state} is out of the {:?} maze", self.dimensions()));
        self.cells[i] = cell;
    }

    pub fn random_state<R: rand::Rng>(&self, r: &mut R) -> Option<MazeState> {
        if self.rows == 0 || self.cols == 0 {
            return None;
        }
        for _tries in 0..RANDOM_STATE_MAX_TRIES {
            let s = MazeState::new(
                r.random_range(0..self.rows) as Coord,
                r.random_range(0..self.cols) as Coord,
            );
            if self.valid(&s) {
                return Some(s);
            }
        }
        None
    }
}

impl Space<MazeState, MazeAction, MazeCost> for MazeSpace {
    #[inline(always)]
    fn apply(&self, state: &MazeState, action: &MazeAction) -> Option<MazeState> {
        let (row, col) = (state.row, state.col);

        #[rustfmt::skip]
        let (row, col) = match action {
            MazeAction::Up    => (row.checked_sub(1)?, col                ),
            MazeAction::Down  => (row.checked_add(1)?, col                ),
            MazeAction::Left  => (row,                 col.checked_sub(1)?),
            MazeAction::Right => (row,                 col.checked_add(1)?),
        };

        let next = MazeState::new(row, col);
        self.valid(&next).then_some(next)
    }

    /// In-bounds and not a wall.
    #[inline(always)]
    fn valid(&self, state: &MazeState) -> bool {
        matches!(self.at(state), Some(cell) if cell != MazeCell::Wall)
    }

    #[inline(always)]
    fn cost(&self, s: &MazeState) -> MazeCost {
        debug_assert!(self.valid(s));
        self.at(s).and_then(|c| c.cost()).unwrap_or(MazeCost::MAX)
    }

    /// Gets the neighbours of a given position, in `U, D, L, R` order.
    ///
    /// NOTE: These states can only be used with the current Maze
    fn neighbours(&self, state: &MazeState) -> Neighbours<MazeState, MazeAction> {
        let mut v = SmallVec::new();
        for a in MazeAction::ALL {
            if let Some(s) = self.apply(state, &a) {
                v.push((s, a));
            }
        }
        v
    }
}

impl std::fmt::Display for MazeSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Maze({}x{}):", self.rows, self.cols)?;
        for line in self.cells.chunks(self.cols.max(1)).take(MAX_ELEMENTS_DISPLAYED) {
            for cell in line.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for MazeSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Maze{:?}", self.dimensions())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MazeProblemCell {
    Cell(MazeCell),
    Start,
    Goal,
    Key,
}

impl std::convert::TryFrom<char> for MazeProblemCell {
    type Error = MazeCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            'I' | 'S' => Ok(MazeProblemCell::Start),
            'G' => Ok(MazeProblemCell::Goal),
            'K' => Ok(MazeProblemCell::Key),
            ch => Ok(MazeProblemCell::Cell(MazeCell::try_from(ch)?)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Invalid cell {e} found at ({row},{col})")]
    InvalidCell {
        e: MazeCellParseError,
        row: usize,
        col: usize,
    },
    #[error("The maze has no initial state")]
    MissingStart,
    #[error("The maze has a second initial state at {0}")]
    DuplicateStart(MazeState),
    #[error("The maze has a second key at {0}")]
    DuplicateKey(MazeState),
}

/// Parses a rectangular grid of cells, reporting the start, goal and key
/// markers (which are open cells) to `on_marker`.
fn parse_grid<F>(s: &str, mut on_marker: F) -> Result<MazeSpace, MazeParseError>
where
    F: FnMut(MazeState, MazeProblemCell) -> Result<(), MazeParseError>,
{
    let mut rows: Vec<Vec<char>> = s.lines().map(|l| l.chars().collect()).collect();
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }

    let expected = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(MazeParseError::EmptyInput),
    };
    let mut space = MazeSpace::new_empty_with_dimensions(rows.len(), expected);

    for (row, line) in rows.iter().enumerate() {
        if line.len() != expected {
            return Err(MazeParseError::RaggedRow {
                row,
                found: line.len(),
                expected,
            });
        }
        for (col, ch) in line.iter().enumerate() {
            let cell = MazeProblemCell::try_from(*ch)
                .map_err(|e| MazeParseError::InvalidCell { e, row, col })?;
            let s = MazeState::new(row as Coord, col as Coord);
            let terrain = match cell {
                MazeProblemCell::Cell(c) => c,
                marker => {
                    on_marker(s, marker)?;
                    MazeCell::Open
                }
            };
            space.set(&s, terrain);
        }
    }
    Ok(space)
}

impl std::convert::TryFrom<&str> for MazeSpace {
    type Error = MazeParseError;

    /// Parses only the terrain. Start, goal and key markers are open cells.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        parse_grid(s, |_, _| Ok(()))
    }
}

#[derive(Clone, Debug)]
pub struct MazeProblem {
    space: MazeSpace,
    start: MazeState,
    goals: Vec<MazeState>,
    key: Option<MazeState>,
}

impl MazeProblem {
    /// Builds a problem without validating it. See [`Problem::check`].
    pub fn new(
        space: MazeSpace,
        start: MazeState,
        goals: Vec<MazeState>,
        key: Option<MazeState>,
    ) -> Self {
        Self {
            space,
            start,
            goals,
            key,
        }
    }

    /// Picks a random start, `num_goals` goals and maybe a key on open cells.
    pub fn new_random<R: rand::Rng>(
        r: &mut R,
        space: MazeSpace,
        num_goals: u16,
        with_key: bool,
    ) -> Option<MazeProblem> {
        let start = space.random_state(r)?;
        let goals = (0..num_goals)
            .map(|_| space.random_state(r))
            .collect::<Option<Vec<_>>>()?;
        let key = match with_key {
            true => Some(space.random_state(r)?),
            false => None,
        };
        Some(Self::new(space, start, goals, key))
    }
}

impl Problem<MazeSpace, MazeState, MazeAction, MazeCost> for MazeProblem {
    fn space(&self) -> &MazeSpace {
        &self.space
    }
    fn start(&self) -> MazeState {
        self.start
    }
    fn goals(&self) -> &[MazeState] {
        &self.goals
    }
    fn key(&self) -> Option<MazeState> {
        self.key
    }
}

impl std::convert::TryFrom<&str> for MazeProblem {
    type Error = MazeParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut start = None;
        let mut goals = vec![];
        let mut key = None;

        let space = parse_grid(s, |s, marker| {
            match marker {
                MazeProblemCell::Start => {
                    if start.replace(s).is_some() {
                        return Err(MazeParseError::DuplicateStart(s));
                    }
                }
                MazeProblemCell::Key => {
                    if key.replace(s).is_some() {
                        return Err(MazeParseError::DuplicateKey(s));
                    }
                }
                MazeProblemCell::Goal => goals.push(s),
                MazeProblemCell::Cell(_) => unreachable!("Terrain is not a marker"),
            }
            Ok(())
        })?;

        let start = start.ok_or(MazeParseError::MissingStart)?;
        Ok(MazeProblem::new(space, start, goals, key))
    }
}

impl std::fmt::Display for MazeProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (rows, cols) = self.space.dimensions();
        writeln!(
            f,
            "MazeProblem({}x{}) (s:{}, g:{:?}, k:{:?}):",
            rows, cols, self.start, self.goals, self.key
        )?;
        for row in 0..rows.min(MAX_ELEMENTS_DISPLAYED) {
            for col in 0..cols.min(MAX_ELEMENTS_DISPLAYED) {
                let s = MazeState::new(row as Coord, col as Coord);
                if s == self.start {
                    write!(f, "I")?;
                } else if self.goals.contains(&s) {
                    write!(f, "G")?;
                } else if self.key == Some(s) {
                    write!(f, "K")?;
                } else if let Some(cell) = self.space.at(&s) {
                    write!(f, "{cell}")?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct MazeHeuristicManhattanDistance;

impl ObjectiveHeuristic<MazeSpace, MazeState, MazeAction, MazeCost>
    for MazeHeuristicManhattanDistance
{
    /// The distance of following straight lines
    #[inline(always)]
    fn h(a: &MazeState, b: &MazeState) -> MazeCost {
        (a.row.abs_diff(b.row) + a.col.abs_diff(b.col)) * OPEN_COST
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::problem::ProblemError;
    use crate::problem::SolutionError;

    const MAZE: &str = indoc! {"
        XXXXXXX
        XI....X
        X.MMM.X
        X.XXXKX
        X..G..X
        XXXXXXX
    "};

    fn actions(s: &str) -> Vec<MazeAction> {
        s.chars().map(|c| MazeAction::try_from(c).unwrap()).collect()
    }

    #[test]
    fn parse() {
        let p = MazeProblem::try_from(MAZE).unwrap();
        assert_eq!(p.space().dimensions(), (6, 7));
        assert_eq!(p.start(), MazeState::new(1, 1));
        assert_eq!(p.goals(), &[MazeState::new(4, 3)]);
        assert_eq!(p.key(), Some(MazeState::new(3, 5)));
        assert_eq!(p.space().at(&MazeState::new(2, 3)), Some(MazeCell::Mud));
        assert_eq!(p.space().at(&MazeState::new(0, 0)), Some(MazeCell::Wall));
        assert_eq!(p.space().at(&MazeState::new(6, 0)), None);
        assert!(p.check().is_ok());
    }

    #[test]
    fn parse_alternative_characters() {
        let p = MazeProblem::try_from("#S #\n# G#").unwrap();
        assert_eq!(p.start(), MazeState::new(0, 1));
        assert_eq!(p.goals(), &[MazeState::new(1, 2)]);
        assert_eq!(p.key(), None);
    }

    #[test]
    fn parse_ignores_trailing_blank_lines() {
        let p = MazeProblem::try_from("I.\n.G\n\n\n").unwrap();
        assert_eq!(p.space().dimensions(), (2, 2));
        assert_eq!(p.goals(), &[MazeState::new(1, 1)]);

        let space = MazeSpace::try_from("...\r\n\r\n").unwrap();
        assert_eq!(space.dimensions(), (1, 3));

        assert_eq!(MazeProblem::try_from("\n\n").unwrap_err(), MazeParseError::EmptyInput);
        assert_eq!(
            MazeProblem::try_from("I.\n\n.G").unwrap_err(),
            MazeParseError::RaggedRow {
                row: 1,
                found: 0,
                expected: 2
            }
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(MazeProblem::try_from("").unwrap_err(), MazeParseError::EmptyInput);
        assert_eq!(
            MazeProblem::try_from("I..\n..").unwrap_err(),
            MazeParseError::RaggedRow {
                row: 1,
                found: 2,
                expected: 3
            }
        );
        assert_eq!(
            MazeProblem::try_from("I.?G").unwrap_err(),
            MazeParseError::InvalidCell {
                e: MazeCellParseError::InvalidCharacter('?'),
                row: 0,
                col: 2
            }
        );
        assert_eq!(
            MazeProblem::try_from("..G").unwrap_err(),
            MazeParseError::MissingStart
        );
        assert_eq!(
            MazeProblem::try_from("I.I").unwrap_err(),
            MazeParseError::DuplicateStart(MazeState::new(0, 2))
        );
        assert_eq!(
            MazeProblem::try_from("IKKG").unwrap_err(),
            MazeParseError::DuplicateKey(MazeState::new(0, 2))
        );
    }

    #[test]
    fn neighbours_skip_walls_and_edges() {
        let p = MazeProblem::try_from(MAZE).unwrap();
        let space = p.space();

        let n = space.neighbours(&MazeState::new(1, 1));
        assert_eq!(
            n.as_slice(),
            &[
                (MazeState::new(2, 1), MazeAction::Down),
                (MazeState::new(1, 2), MazeAction::Right),
            ]
        );

        let corner = MazeSpace::try_from("..\n..").unwrap();
        let n = corner.neighbours(&MazeState::new(0, 0));
        assert_eq!(n.len(), 2);
        assert_eq!(corner.apply(&MazeState::new(0, 0), &MazeAction::Up), None);
        assert_eq!(corner.apply(&MazeState::new(1, 1), &MazeAction::Down), None);
    }

    #[test]
    fn costs() {
        let p = MazeProblem::try_from(MAZE).unwrap();
        assert_eq!(p.space().cost(&MazeState::new(1, 2)), 1);
        assert_eq!(p.space().cost(&MazeState::new(2, 2)), 3);
    }

    #[test]
    fn manhattan() {
        let a = MazeState::new(1, 5);
        let b = MazeState::new(4, 2);
        assert_eq!(MazeHeuristicManhattanDistance::h(&a, &b), 6);
        assert_eq!(MazeHeuristicManhattanDistance::h(&b, &a), 6);
        assert_eq!(MazeHeuristicManhattanDistance::h(&a, &a), 0);
    }

    #[test]
    fn test_solution() {
        let p = MazeProblem::try_from(MAZE).unwrap();
        // Through the key, around the wall.
        assert_eq!(p.test_solution(&actions("RRRRDDDLL")), Ok(9));
        // Straight down is shorter but misses the key.
        assert_eq!(
            p.test_solution(&actions("DDDRR")),
            Err(SolutionError::MissingKey)
        );
        assert_eq!(
            p.test_solution(&actions("RRRR")),
            Err(SolutionError::NotAGoal(MazeState::new(1, 5)))
        );
        assert_eq!(
            p.test_solution(&actions("RU")),
            Err(SolutionError::IllegalMove {
                step: 1,
                from: MazeState::new(1, 2)
            })
        );
    }

    #[test]
    fn check_rejects_malformed_problems() {
        let space = MazeSpace::try_from("..X\n...").unwrap();
        let ok = MazeState::new(0, 0);
        let wall = MazeState::new(0, 2);
        let outside = MazeState::new(5, 5);

        let p = MazeProblem::new(space.clone(), wall, vec![ok], None);
        assert_eq!(p.check(), Err(ProblemError::InvalidStart(wall)));
        let p = MazeProblem::new(space.clone(), ok, vec![], None);
        assert_eq!(p.check(), Err(ProblemError::NoGoals));
        let p = MazeProblem::new(space.clone(), ok, vec![outside], None);
        assert_eq!(p.check(), Err(ProblemError::InvalidGoal(outside)));
        let p = MazeProblem::new(space, ok, vec![ok], Some(wall));
        assert_eq!(p.check(), Err(ProblemError::InvalidKey(wall)));
    }

    #[test]
    fn display_round_trips_markers() {
        let p = MazeProblem::try_from(MAZE).unwrap();
        let shown = p.to_string();
        let grid: String = shown.lines().skip(1).collect::<Vec<_>>().join("\n");
        assert_eq!(grid, MAZE.trim_end());
    }

    #[test]
    fn random_problems_are_well_formed() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let space = MazeSpace::new_random(&mut rng, 8, 12, 0.25, 0.1);
            assert_eq!(space.dimensions(), (8, 12));
            if let Some(p) = MazeProblem::new_random(&mut rng, space, 2, true) {
                assert!(p.check().is_ok());
                assert_eq!(p.goals().len(), 2);
            }
        }
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use anstream::eprintln;
use anstream::println;
use clap::Parser;
use clap::Subcommand;
use indoc::indoc;
use owo_colors::OwoColorize;
use thiserror::Error;

use search::algorithms::alphabeta::GameSearchLimits;
use search::algorithms::astar::SearchLimits;
use search::algorithms::astar::SolveError;
use search::pathfinder::MazeSearch;
use search::problem::Problem;
use search::problems::maze::MazeParseError;
use search::problems::maze::MazeProblem;
use search::problems::maze::MazeState;
use search::problems::nim::NimError;
use search::problems::nim::NimPlayer;
use search::problems::nim::play_match;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(long_version = search::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Finds the cheapest path through a maze file, or a built-in one.
    Maze {
        #[arg()]
        maze: Option<PathBuf>,

        #[arg(long, env = "SEARCH_MAX_EXPANSIONS")]
        max_expansions: Option<usize>,
    },
    /// Picks the best Nim move, or plays a whole game against itself.
    Nim {
        #[arg(short, long)]
        remaining: u32,

        #[arg(short, long, default_value_t = 3u32)]
        max_removal: u32,

        #[arg(long, env = "SEARCH_MAX_EXPANSIONS")]
        max_expansions: Option<usize>,

        #[arg(long)]
        self_play: bool,
    },
}

const DEMO_MAZE: &str = indoc! {"
    XXXXXXXXXX
    XI.....MGX
    X.XXXX.XXX
    X.X..M...X
    X.X.XX.X.X
    X...X..XKX
    XXXXXXXXXX
"};

/// Why a command failed.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid maze {path:?}: {source}")]
    InvalidMaze {
        path: Option<PathBuf>,
        source: MazeParseError,
    },
    #[error("No solution: {0}")]
    Search(#[from] SolveError<MazeState>),
    #[error("Nim: {0}")]
    Nim(#[from] NimError),
}

fn maze(path: Option<PathBuf>, max_expansions: Option<usize>) -> Result<(), CliError> {
    let text = match &path {
        Some(p) => std::fs::read_to_string(p)?,
        None => DEMO_MAZE.to_string(),
    };
    let problem = MazeProblem::try_from(text.as_str())
        .map_err(|source| CliError::InvalidMaze { path, source })?;
    println!("{problem}");

    let limits = SearchLimits { max_expansions };
    let mut search = MazeSearch::new(problem, limits)?;
    let result = search.solve();
    if let Ok(path) = &result {
        println!("{} {}", "Solution:".green(), path.labels().concat().bold());
        println!("Cost: {}", path.cost.yellow());
        debug_assert_eq!(search.problem().test_solution(&path.actions), Ok(path.cost));
    }
    search.write_memory_stats(std::io::stdout().lock())?;
    result?;
    Ok(())
}

fn nim(
    remaining: u32,
    max_removal: u32,
    max_expansions: Option<usize>,
    self_play: bool,
) -> Result<(), CliError> {
    let player = NimPlayer::new(max_removal)?.with_limits(GameSearchLimits { max_expansions });

    if !self_play {
        let taken = player.choose(remaining)?;
        println!("Take {} of {remaining}", taken.green());
        return Ok(());
    }

    let outcome = play_match([&player, &player], remaining)?;
    for m in &outcome.moves {
        println!(
            "Player {} takes {} ({} left)",
            m.player + 1,
            m.taken.yellow(),
            m.remaining
        );
    }
    println!("{} {}", "Winner: player".green(), outcome.winner + 1);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.color.write_global();

    let result = match args.command {
        Command::Maze {
            maze: path,
            max_expansions,
        } => maze(path, max_expansions),
        Command::Nim {
            remaining,
            max_removal,
            max_expansions,
            self_play,
        } => nim(remaining, max_removal, max_expansions, self_play),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red());
            ExitCode::FAILURE
        }
    }
}

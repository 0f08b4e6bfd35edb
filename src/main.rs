use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use rand::rngs::StdRng;
use rand::SeedableRng;

use minesweeper::config::{self, Difficulty, DEFAULT_SAVE_FILE, DEFAULT_SIZE};
use minesweeper::logging;
use minesweeper::{game_loop, Ending, Game, Leaderboards};

#[derive(Parser)]
#[command(author, version, about = "Minesweeper in the terminal", long_about = None)]
struct Cli {
    /// Directory holding the `{size}_leader.board` files.
    #[arg(long, global = true, default_value = ".")]
    leaderboard_dir: PathBuf,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game (the default).
    New {
        #[arg(long, value_enum, default_value_t = Difficulty::Beginner)]
        difficulty: Difficulty,
        /// Board edge length; overrides the difficulty preset.
        #[arg(long)]
        size: Option<usize>,
        /// Number of mines; overrides the difficulty preset.
        #[arg(long)]
        mines: Option<usize>,
        /// Name recorded on the leaderboard.
        #[arg(long)]
        name: Option<String>,
        #[arg(long, help = "Fix RNG seed for reproducible boards (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Resume a saved game.
    Load {
        #[arg(default_value = DEFAULT_SAVE_FILE)]
        file: PathBuf,
    },
    /// Show the best times for a board size.
    Leaders {
        #[arg(long, default_value_t = DEFAULT_SIZE)]
        size: usize,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::New {
            difficulty: Difficulty::default(),
            size: None,
            mines: None,
            name: None,
            seed: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(logging::level_from_env(cli.verbose.log_level_filter()));
    let mut leaderboards = Leaderboards::new(cli.leaderboard_dir);

    let mut game = match cli.command.unwrap_or_default() {
        Commands::New {
            difficulty,
            size,
            mines,
            name,
            seed,
        } => {
            let (size, mines) = config::resolve_dimensions(difficulty, size, mines);
            let mut rng = match seed {
                Some(s) => {
                    println!("Using fixed seed: {} (board will be reproducible)", s);
                    StdRng::seed_from_u64(s)
                }
                None => StdRng::from_rng(&mut rand::rng()),
            };
            Game::random(size, mines, name, &mut rng)
                .with_context(|| format!("cannot start a {}x{} game with {} mines", size, size, mines))?
        }
        Commands::Load { file } => {
            Game::load(&file).with_context(|| format!("failed to load {}", file.display()))?
        }
        Commands::Leaders { size } => {
            let board = leaderboards
                .board(size)
                .with_context(|| format!("failed to read the {}x{} leaderboard", size, size))?;
            print!("{}", board);
            return Ok(());
        }
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    match game_loop(&mut game, &mut leaderboards, &mut input, &mut output)? {
        Ending::Saved(path) => println!("Resume with: minesweeper load {}", path.display()),
        Ending::Abandoned => println!("bye"),
        Ending::Won { .. } | Ending::Lost => {}
    }
    Ok(())
}

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod interaction;
pub mod leaderboard;
pub mod logging;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::warn;

pub use board::{Board, Point, RevealOutcome, Symbol};
pub use error::{GameError, Result};
pub use game::{Game, Outcome};
pub use interaction::Command;
pub use leaderboard::{Leaderboard, Leaderboards};

use config::DEFAULT_SAVE_FILE;
use interaction::USAGE;
use leaderboard::format_time;

/// How an interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ending {
    Won { rank: Option<usize> },
    Lost,
    Saved(PathBuf),
    Abandoned,
}

pub fn game_loop<R: BufRead, W: Write>(
    game: &mut Game,
    leaderboards: &mut Leaderboards,
    input: &mut R,
    output: &mut W,
) -> Result<Ending> {
    writeln!(output, "{}", USAGE)?;
    while !game.outcome().is_finished() {
        writeln!(output, "\n{}", game.board())?;
        writeln!(output, "Mines left: {}", game.board().mines_remaining())?;
        let command = match interaction::read_command(input, output)? {
            Some(command) => command,
            None => return Ok(Ending::Abandoned),
        };
        let result = match command {
            Command::Reveal(point) => game.reveal(point).map(|_| ()),
            Command::Flag(point) => game.flag(point).map(|_| ()),
            Command::Save(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_FILE));
                match game.save(&path) {
                    Ok(()) => {
                        writeln!(output, "Saved to {}", path.display())?;
                        return Ok(Ending::Saved(path));
                    }
                    Err(err) => {
                        warn!("save to {} failed: {}", path.display(), err);
                        writeln!(output, "Could not save to {}: {}", path.display(), err)?;
                        Ok(())
                    }
                }
            }
            Command::Help => {
                writeln!(output, "{}", USAGE)?;
                Ok(())
            }
            Command::Quit => return Ok(Ending::Abandoned),
        };
        if let Err(err) = result {
            if !err.is_recoverable() {
                return Err(err);
            }
            writeln!(output, "{}", err)?;
        }
    }

    writeln!(output, "\n{}", game.board())?;
    if game.outcome() == Outcome::Lost {
        writeln!(output, "you lose")?;
        return Ok(Ending::Lost);
    }

    let size = game.board().size();
    let time = game.elapsed();
    writeln!(output, "you win! time: {}", format_time(time))?;
    if game.player().is_none() && leaderboards.qualifies(size, time)? {
        writeln!(output, "That's a best time for {}x{}.", size, size)?;
        if let Some(name) = interaction::read_name(input, output)? {
            game.set_player(name);
        }
    }
    let rank = game.record_win(leaderboards)?;
    if let Some(rank) = rank {
        writeln!(output, "You placed #{}", rank)?;
    }
    writeln!(output, "{}", leaderboards.board(size)?)?;
    Ok(Ending::Won { rank })
}

//! One round of play: the board plus clock, player name and outcome.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Point, RevealOutcome};
use crate::config::SAVE_VERSION;
use crate::error::{GameError, Result};
use crate::leaderboard::Leaderboards;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_finished(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    fn of(board: &Board) -> Outcome {
        if board.mine_revealed() {
            Outcome::Lost
        } else if board.all_safe_revealed() {
            Outcome::Won
        } else {
            Outcome::InProgress
        }
    }
}

/// On-disk layout of a save file.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    board: Board,
    elapsed: Duration,
    player: Option<String>,
}

#[derive(Debug)]
pub struct Game {
    board: Board,
    player: Option<String>,
    /// Time banked by earlier sessions, or the final time once finished.
    elapsed: Duration,
    /// `None` while the clock is stopped.
    session_start: Option<Instant>,
    outcome: Outcome,
}

impl Game {
    pub fn new(board: Board, player: Option<String>) -> Game {
        Game::resume(board, player, Duration::ZERO)
    }

    pub fn random<R: Rng>(
        size: usize,
        mine_count: usize,
        player: Option<String>,
        rng: &mut R,
    ) -> Result<Game> {
        Ok(Game::new(Board::random(size, mine_count, rng)?, player))
    }

    /// Continue a game that already has `elapsed` on the clock.
    pub fn resume(board: Board, player: Option<String>, elapsed: Duration) -> Game {
        let outcome = Outcome::of(&board);
        let session_start = if outcome.is_finished() {
            None
        } else {
            Some(Instant::now())
        };
        Game {
            board,
            player,
            elapsed,
            session_start,
            outcome,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn set_player(&mut self, name: impl Into<String>) {
        self.player = Some(name.into());
    }

    /// Total play time so far; stops advancing once the game is decided.
    pub fn elapsed(&self) -> Duration {
        match self.session_start {
            Some(start) => self.elapsed + start.elapsed(),
            None => self.elapsed,
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.outcome.is_finished() {
            Err(GameError::GameOver)
        } else {
            Ok(())
        }
    }

    fn update_outcome(&mut self) {
        let outcome = Outcome::of(&self.board);
        if outcome.is_finished() && !self.outcome.is_finished() {
            self.elapsed = self.elapsed();
            self.session_start = None;
            info!("game finished: {:?} after {:?}", outcome, self.elapsed);
        }
        self.outcome = outcome;
    }

    /// Reveal `point`. Flagged tiles are refused until unflagged.
    pub fn reveal(&mut self, point: Point) -> Result<RevealOutcome> {
        self.ensure_in_progress()?;
        match self.board.get(&point) {
            None => return Err(GameError::OutOfBounds(point)),
            Some(tile) if tile.cover().is_flagged() => return Err(GameError::IllegalMove(point)),
            Some(_) => {}
        }
        let revealed = self.board.reveal(&point)?;
        self.update_outcome();
        Ok(revealed)
    }

    /// Toggle the flag at `point`; `false` if the tile was already revealed.
    pub fn flag(&mut self, point: Point) -> Result<bool> {
        self.ensure_in_progress()?;
        let changed = self.board.toggle_flag(&point)?;
        self.update_outcome();
        Ok(changed)
    }

    pub fn to_json(&self) -> Result<String> {
        let snapshot = Snapshot {
            version: SAVE_VERSION,
            board: self.board.clone(),
            elapsed: self.elapsed(),
            player: self.player.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    pub fn from_json(text: &str) -> Result<Game> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        if snapshot.version != SAVE_VERSION {
            return Err(GameError::CorruptSave(format!(
                "save version {} is not supported (expected {})",
                snapshot.version, SAVE_VERSION
            )));
        }
        snapshot.board.validate()?;
        Ok(Game::resume(snapshot.board, snapshot.player, snapshot.elapsed))
    }

    /// Write the whole game to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        info!("saved game to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Game> {
        let text = fs::read_to_string(path)?;
        let game = Game::from_json(&text).map_err(|err| {
            warn!("rejected save file {}: {}", path.display(), err);
            err
        })?;
        info!(
            "loaded {}x{} game from {}",
            game.board.size(),
            game.board.size(),
            path.display()
        );
        Ok(game)
    }

    /// Submit a won game to the leaderboard for its size. Returns the rank if it placed.
    pub fn record_win(&self, leaderboards: &mut Leaderboards) -> Result<Option<usize>> {
        if self.outcome != Outcome::Won {
            return Ok(None);
        }
        let name = self.player().unwrap_or("anonymous");
        leaderboards.submit(self.board.size(), self.elapsed(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn beginner_mines() -> Vec<Point> {
        vec![
            Point(0, 0),
            Point(0, 8),
            Point(1, 4),
            Point(2, 2),
            Point(3, 7),
            Point(4, 4),
            Point(5, 1),
            Point(6, 6),
            Point(8, 0),
            Point(8, 8),
        ]
    }

    fn beginner() -> Game {
        Game::new(Board::with_mines(9, &beginner_mines()).unwrap(), None)
    }

    #[test]
    fn wins_exactly_when_every_safe_tile_is_revealed() {
        let mut game = beginner();
        let mines = beginner_mines();
        let safe: Vec<Point> = game
            .board()
            .points()
            .filter(|p| !mines.contains(p))
            .collect();
        assert_eq!(safe.len(), 71);
        for point in safe {
            if game.board().get(&point).unwrap().cover().is_revealed() {
                continue;
            }
            game.reveal(point).unwrap();
            let done = game.board().revealed_count() == 71;
            assert_eq!(game.outcome() == Outcome::Won, done);
        }
        assert_eq!(game.outcome(), Outcome::Won);
        assert!(!game.board().mine_revealed());
    }

    #[test]
    fn flags_do_not_matter_for_winning() {
        let mut game = Game::new(Board::with_mines(2, &[Point(0, 0)]).unwrap(), None);
        game.reveal(Point(0, 1)).unwrap();
        game.reveal(Point(1, 0)).unwrap();
        assert_eq!(game.outcome(), Outcome::InProgress);
        game.reveal(Point(1, 1)).unwrap();
        assert_eq!(game.outcome(), Outcome::Won);
        assert_eq!(game.board().flag_count(), 0);
    }

    #[test]
    fn revealing_a_mine_loses_immediately() {
        let mut game = beginner();
        assert_eq!(game.reveal(Point(4, 4)).unwrap(), RevealOutcome::Detonated);
        assert_eq!(game.outcome(), Outcome::Lost);
        assert!(matches!(game.reveal(Point(7, 7)), Err(GameError::GameOver)));
        assert!(matches!(game.flag(Point(7, 7)), Err(GameError::GameOver)));
    }

    #[test]
    fn flagged_tile_rejects_reveal_without_change() {
        let mut game = beginner();
        assert!(game.flag(Point(4, 4)).unwrap());
        let before = game.board().clone();
        let err = game.reveal(Point(4, 4)).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove(Point(4, 4))));
        assert!(err.is_recoverable());
        assert_eq!(game.board(), &before);
        assert_eq!(game.outcome(), Outcome::InProgress);

        assert!(game.flag(Point(4, 4)).unwrap());
        assert_eq!(game.reveal(Point(4, 4)).unwrap(), RevealOutcome::Detonated);
    }

    #[test]
    fn out_of_bounds_is_recoverable() {
        let mut game = beginner();
        let err = game.reveal(Point(9, 0)).unwrap_err();
        assert!(matches!(err, GameError::OutOfBounds(Point(9, 0))));
        assert!(err.is_recoverable());
        assert!(game.flag(Point(0, 9)).is_err());
        assert_eq!(game.outcome(), Outcome::InProgress);
    }

    #[test]
    fn clock_stops_when_the_game_ends() {
        let mut game = Game::resume(
            Board::with_mines(2, &[Point(0, 0)]).unwrap(),
            None,
            Duration::from_secs(30),
        );
        assert!(game.elapsed() >= Duration::from_secs(30));
        game.reveal(Point(0, 0)).unwrap();
        let frozen = game.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(game.elapsed(), frozen);
    }

    #[test]
    fn save_then_load_restores_the_game() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.game");

        let mut game = Game::resume(
            Board::with_mines(9, &beginner_mines()).unwrap(),
            Some("ada".to_string()),
            Duration::from_secs(42),
        );
        game.reveal(Point(0, 4)).unwrap();
        game.flag(Point(1, 4)).unwrap();
        game.flag(Point(7, 7)).unwrap();
        game.save(&path).unwrap();

        let loaded = Game::load(&path).unwrap();
        assert_eq!(loaded.board(), game.board());
        assert_eq!(loaded.player(), Some("ada"));
        assert_eq!(loaded.outcome(), Outcome::InProgress);
        assert!(loaded.elapsed() >= Duration::from_secs(42));
        assert!(loaded.elapsed() < Duration::from_secs(43));
    }

    #[test]
    fn missing_save_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Game::load(&dir.path().join("nope.game")).unwrap_err();
        assert!(matches!(err, GameError::Io(_)));
    }

    #[test]
    fn corrupt_saves_are_rejected() {
        assert!(matches!(
            Game::from_json("not json"),
            Err(GameError::Format(_))
        ));

        let good = beginner().to_json().unwrap();
        let old = good.replacen(
            &format!("\"version\": {}", SAVE_VERSION),
            "\"version\": 0",
            1,
        );
        assert!(matches!(
            Game::from_json(&old),
            Err(GameError::CorruptSave(_))
        ));

        let lying = good.replacen("\"mine_count\": 10", "\"mine_count\": 11", 1);
        assert!(matches!(
            Game::from_json(&lying),
            Err(GameError::CorruptSave(_))
        ));

        let huge = good.replacen("\"size\": 9", "\"size\": 8589934592", 1);
        assert_ne!(huge, good);
        assert!(matches!(
            Game::from_json(&huge),
            Err(GameError::CorruptSave(_))
        ));
    }

    fn saved_elapsed(json: &str) -> Duration {
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        serde_json::from_value(value["elapsed"].clone()).unwrap()
    }

    fn game_params() -> impl Strategy<Value = (usize, usize, u64)> {
        (1..10usize).prop_flat_map(|size| (Just(size), 0..size * size, any::<u64>()))
    }

    proptest! {
        #[test]
        fn json_round_trip_keeps_any_position((size, mines, seed) in game_params(),
                                              moves in prop::collection::vec((any::<bool>(), any::<usize>()), 0..30),
                                              player in prop::option::of("[a-z]{1,8}"),
                                              banked in 0..10_000_000u64) {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = Board::random(size, mines, &mut rng).unwrap();
            let mut game = Game::resume(board, player, Duration::from_millis(banked));
            for (flag, pick) in moves {
                if game.outcome().is_finished() {
                    break;
                }
                let point = game.board().points().nth(pick % game.board().area()).unwrap();
                if flag {
                    game.flag(point).unwrap();
                } else {
                    // flagged targets are refused, which is fine here
                    let _ = game.reveal(point);
                }
            }

            let json = game.to_json().unwrap();
            let saved = saved_elapsed(&json);
            let loaded = Game::from_json(&json).unwrap();
            prop_assert_eq!(loaded.board(), game.board());
            prop_assert_eq!(loaded.player(), game.player());
            prop_assert_eq!(loaded.outcome(), game.outcome());
            prop_assert!(saved >= Duration::from_millis(banked));
            if game.outcome().is_finished() {
                prop_assert_eq!(loaded.elapsed(), saved);
            } else {
                prop_assert!(loaded.elapsed() >= saved);
                prop_assert!(loaded.elapsed() < saved + Duration::from_secs(1));
            }
        }
    }
}

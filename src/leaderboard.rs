//! Best completion times, one leaderboard file per board size.

use std::collections::hash_map::Entry as Slot;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{leaderboard_file_name, LEADERBOARD_CAPACITY};
use crate::error::{GameError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub time: Duration,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    size: usize,
    entries: Vec<Entry>,
}

impl Leaderboard {
    pub fn new(size: usize) -> Leaderboard {
        Leaderboard {
            size,
            entries: Vec::with_capacity(LEADERBOARD_CAPACITY),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= LEADERBOARD_CAPACITY
    }

    pub fn qualifies(&self, time: Duration) -> bool {
        !self.is_full() || self.entries.iter().any(|entry| time < entry.time)
    }

    /// Insert `time` if it makes the cut. Equal times keep their arrival order,
    /// so a newcomer goes after existing entries with the same time.
    /// Returns the 1-based rank on admission.
    pub fn check_and_add(&mut self, time: Duration, name: &str) -> Option<usize> {
        if !self.qualifies(time) {
            return None;
        }
        let index = self.entries.partition_point(|entry| entry.time <= time);
        self.entries.insert(
            index,
            Entry {
                time,
                name: name.to_owned(),
            },
        );
        self.entries.truncate(LEADERBOARD_CAPACITY);
        Some(index + 1)
    }

    pub fn path(dir: &Path, size: usize) -> PathBuf {
        dir.join(leaderboard_file_name(size))
    }

    /// Read the leaderboard for `size`. A missing file is an empty leaderboard.
    pub fn load(dir: &Path, size: usize) -> Result<Leaderboard> {
        let path = Leaderboard::path(dir, size);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no leaderboard at {}, starting empty", path.display());
                return Ok(Leaderboard::new(size));
            }
            Err(err) => return Err(err.into()),
        };
        let mut board: Leaderboard = serde_json::from_str(&text)?;
        if board.size != size {
            return Err(GameError::CorruptSave(format!(
                "{} holds times for size {}",
                path.display(),
                board.size
            )));
        }
        let sorted = board.entries.windows(2).all(|w| w[0].time <= w[1].time);
        if !sorted || board.entries.len() > LEADERBOARD_CAPACITY {
            warn!("leaderboard {} was out of order, repairing", path.display());
            board.entries.sort_by_key(|entry| entry.time);
            board.entries.truncate(LEADERBOARD_CAPACITY);
        }
        Ok(board)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = Leaderboard::path(dir, self.size);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

/// `m:ss.t`
pub fn format_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}.{}", secs / 60, secs % 60, time.subsec_millis() / 100)
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best times for {}x{}:", self.size, self.size)?;
        if self.entries.is_empty() {
            return writeln!(f, "  no times yet");
        }
        let name_width = self
            .entries
            .iter()
            .map(|entry| entry.name.chars().count())
            .max()
            .unwrap_or(0);
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {:<width$}  {}",
                i + 1,
                entry.name,
                format_time(entry.time),
                width = name_width
            )?;
        }
        Ok(())
    }
}

/// Leaderboards keyed by board size, read from `dir` on first use.
#[derive(Debug)]
pub struct Leaderboards {
    dir: PathBuf,
    boards: HashMap<usize, Leaderboard>,
}

impl Leaderboards {
    pub fn new(dir: impl Into<PathBuf>) -> Leaderboards {
        Leaderboards {
            dir: dir.into(),
            boards: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn board_mut(&mut self, size: usize) -> Result<&mut Leaderboard> {
        match self.boards.entry(size) {
            Slot::Occupied(slot) => Ok(slot.into_mut()),
            Slot::Vacant(slot) => Ok(slot.insert(Leaderboard::load(&self.dir, size)?)),
        }
    }

    pub fn board(&mut self, size: usize) -> Result<&Leaderboard> {
        self.board_mut(size).map(|board| &*board)
    }

    pub fn qualifies(&mut self, size: usize, time: Duration) -> Result<bool> {
        Ok(self.board_mut(size)?.qualifies(time))
    }

    pub fn submit(&mut self, size: usize, time: Duration, name: &str) -> Result<Option<usize>> {
        let rank = self.board_mut(size)?.check_and_add(time, name);
        if let Some(rank) = rank {
            self.boards[&size].save(&self.dir)?;
            info!("{} placed #{} on the {}x{} leaderboard", name, rank, size, size);
        }
        Ok(rank)
    }
}

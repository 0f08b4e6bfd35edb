pub const DEFAULT_SIZE: usize = 9;
pub const DEFAULT_MINES: usize = 10;
pub const DEFAULT_SAVE_FILE: &str = "save.game";

/// Best times kept per board size.
pub const LEADERBOARD_CAPACITY: usize = 10;
pub const LEADERBOARD_SUFFIX: &str = "_leader.board";

/// Bumped whenever the save layout changes incompatibly.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    /// `(size, mines)` for the preset.
    pub const fn dimensions(self) -> (usize, usize) {
        match self {
            Difficulty::Beginner => (9, 10),
            Difficulty::Intermediate => (16, 40),
            Difficulty::Expert => (24, 99),
        }
    }
}

/// Leaderboard file name for a board size, e.g. `9_leader.board`.
pub fn leaderboard_file_name(size: usize) -> String {
    format!("{}{}", size, LEADERBOARD_SUFFIX)
}

/// Board size and mine count from a preset plus optional overrides. A custom
/// size without a mine count keeps the preset's mine density, with at least
/// one mine and at least one safe tile where the board allows it.
pub fn resolve_dimensions(
    difficulty: Difficulty,
    size: Option<usize>,
    mines: Option<usize>,
) -> (usize, usize) {
    let (preset_size, preset_mines) = difficulty.dimensions();
    let size = size.unwrap_or(preset_size);
    let mines = mines.unwrap_or_else(|| {
        if size == preset_size {
            preset_mines
        } else {
            let area = size.saturating_mul(size);
            let scaled = preset_mines.saturating_mul(area) / (preset_size * preset_size);
            scaled.max(1).min(area.saturating_sub(1))
        }
    });
    (size, mines)
}

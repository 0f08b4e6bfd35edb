use std::fmt;

use itertools::{iproduct, Itertools};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    Mine,
    /// Safe tile with the number of mines among its neighbors.
    Safe(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cover {
    Hidden,
    Flagged,
    Revealed,
}

impl Cover {
    pub fn is_hidden(&self) -> bool {
        matches!(*self, Cover::Hidden)
    }

    pub fn is_flagged(&self) -> bool {
        matches!(*self, Cover::Flagged)
    }

    pub fn is_revealed(&self) -> bool {
        matches!(*self, Cover::Revealed)
    }
}

/// What the player is allowed to see of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Hidden,
    Flag,
    Mine,
    Count(u8),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Symbol::Hidden => f.pad("□"),
            Symbol::Flag => f.pad("▶"),
            Symbol::Mine => f.pad("X"),
            Symbol::Count(0) => f.pad("_"),
            Symbol::Count(n) => f.pad(&n.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    content: Content,
    cover: Cover,
}

impl Tile {
    fn hidden() -> Tile {
        Tile {
            content: Content::Safe(0),
            cover: Cover::Hidden,
        }
    }

    pub fn content(&self) -> Content {
        self.content
    }

    pub fn cover(&self) -> Cover {
        self.cover
    }

    pub fn is_mine(&self) -> bool {
        matches!(self.content, Content::Mine)
    }

    /// `None` for mines, which carry no count.
    pub fn adjacent_mines(&self) -> Option<u8> {
        match self.content {
            Content::Mine => None,
            Content::Safe(n) => Some(n),
        }
    }

    /// Flip the flag on an unrevealed tile. Returns whether anything changed.
    fn toggle_flag(&mut self) -> bool {
        let next = match self.cover {
            Cover::Revealed => return false,
            Cover::Flagged => Cover::Hidden,
            Cover::Hidden => Cover::Flagged,
        };
        self.cover = next;
        true
    }

    pub fn symbol(&self) -> Symbol {
        match (&self.cover, &self.content) {
            (Cover::Flagged, _) => Symbol::Flag,
            (Cover::Hidden, _) => Symbol::Hidden,
            (Cover::Revealed, Content::Mine) => Symbol::Mine,
            (Cover::Revealed, Content::Safe(n)) => Symbol::Count(*n),
        }
    }
}

/// `Point(row, col)`.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct Point(pub usize, pub usize);

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed(usize),
    Detonated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    mine_count: usize,
    field: Vec<Vec<Tile>>,
}

impl Board {
    pub fn new(size: usize, mine_count: usize) -> Result<Board> {
        if size == 0 || mine_count >= size.saturating_mul(size) {
            return Err(GameError::InvalidConfiguration {
                size,
                mines: mine_count,
            });
        }
        let field = (0..size).map(|_| vec![Tile::hidden(); size]).collect();
        Ok(Board {
            size,
            mine_count,
            field,
        })
    }

    pub fn random<R: Rng>(size: usize, mine_count: usize, rng: &mut R) -> Result<Board> {
        let mut board = Board::new(size, mine_count)?;
        board.place_random_mines(rng);
        board.compute_adjacency_counts();
        Ok(board)
    }

    pub fn with_mines(size: usize, mines: &[Point]) -> Result<Board> {
        let mut board = Board::new(size, mines.len())?;
        for point in mines {
            board.check_bounds(point)?;
            let tile = board.tile_mut(point);
            if tile.is_mine() {
                return Err(GameError::InvalidConfiguration {
                    size,
                    mines: mines.iter().unique().count(),
                });
            }
            tile.content = Content::Mine;
        }
        board.compute_adjacency_counts();
        Ok(board)
    }

    /// Rejection sampling: draw uniform points until `mine_count` distinct tiles are mined.
    pub fn place_random_mines<R: Rng>(&mut self, rng: &mut R) {
        let mut placed = self.tiles().filter(|tile| tile.is_mine()).count();
        let mut draws = 0usize;
        while placed < self.mine_count {
            let point = Point(rng.random_range(0..self.size), rng.random_range(0..self.size));
            draws += 1;
            let tile = self.tile_mut(&point);
            if !tile.is_mine() {
                tile.content = Content::Mine;
                placed += 1;
            }
        }
        debug!("placed {} mines in {} draws", placed, draws);
    }

    pub fn compute_adjacency_counts(&mut self) {
        for point in self.points() {
            if self.tile(&point).is_mine() {
                continue;
            }
            let count = self.count_mined_neighbors(&point);
            self.tile_mut(&point).content = Content::Safe(count as u8);
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn area(&self) -> usize {
        self.size * self.size
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.0 < self.size && point.1 < self.size
    }

    fn check_bounds(&self, point: &Point) -> Result<()> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds(*point))
        }
    }

    pub fn get(&self, point: &Point) -> Option<&Tile> {
        self.field.get(point.0)?.get(point.1)
    }

    fn tile(&self, point: &Point) -> &Tile {
        &self.field[point.0][point.1]
    }

    fn tile_mut(&mut self, point: &Point) -> &mut Tile {
        &mut self.field[point.0][point.1]
    }

    pub fn points(&self) -> impl Iterator<Item = Point> {
        iproduct!(0..self.size, 0..self.size).map(|(row, col)| Point(row, col))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.field.iter().flatten()
    }

    pub fn neighbor_points(&self, point: &Point) -> impl Iterator<Item = Point> {
        let size = self.size as isize;
        let (row, col) = (point.0 as isize, point.1 as isize);
        iproduct!(-1isize..=1, -1isize..=1)
            .filter(|&offset| offset != (0, 0))
            .map(move |(dr, dc)| (row + dr, col + dc))
            .filter(move |&(r, c)| r >= 0 && r < size && c >= 0 && c < size)
            .map(|(r, c)| Point(r as usize, c as usize))
    }

    fn count_mined_neighbors(&self, point: &Point) -> usize {
        self.neighbor_points(point)
            .filter(|neighbor| self.tile(neighbor).is_mine())
            .count()
    }

    /// Reveal a tile; a zero tile floods outward through connected zeros and
    /// their numbered border. Flagged tiles are never uncovered.
    pub fn reveal(&mut self, point: &Point) -> Result<RevealOutcome> {
        self.check_bounds(point)?;
        let tile = self.tile_mut(point);
        if !tile.cover.is_hidden() {
            return Ok(RevealOutcome::NoChange);
        }
        if tile.is_mine() {
            tile.cover = Cover::Revealed;
            debug!("mine revealed at {}", point);
            return Ok(RevealOutcome::Detonated);
        }

        let mut revealed = 0;
        let mut pending = vec![*point];
        while let Some(next) = pending.pop() {
            let tile = self.tile_mut(&next);
            if !tile.cover.is_hidden() || tile.is_mine() {
                continue;
            }
            tile.cover = Cover::Revealed;
            revealed += 1;
            if tile.content == Content::Safe(0) {
                pending.extend(
                    self.neighbor_points(&next)
                        .filter(|neighbor| self.tile(neighbor).cover.is_hidden()),
                );
            }
        }
        if revealed > 1 {
            debug!("cascade from {} uncovered {} tiles", point, revealed);
        }
        Ok(RevealOutcome::Revealed(revealed))
    }

    pub fn toggle_flag(&mut self, point: &Point) -> Result<bool> {
        self.check_bounds(point)?;
        Ok(self.tile_mut(point).toggle_flag())
    }

    pub fn symbol_at(&self, point: &Point) -> Option<Symbol> {
        self.get(point).map(Tile::symbol)
    }

    pub fn symbols(&self) -> Vec<Vec<Symbol>> {
        self.field
            .iter()
            .map(|row| row.iter().map(Tile::symbol).collect())
            .collect()
    }

    pub fn revealed_count(&self) -> usize {
        self.tiles().filter(|tile| tile.cover.is_revealed()).count()
    }

    pub fn flag_count(&self) -> usize {
        self.tiles().filter(|tile| tile.cover.is_flagged()).count()
    }

    /// Mines minus flags; negative when the player over-flags.
    pub fn mines_remaining(&self) -> isize {
        self.mine_count as isize - self.flag_count() as isize
    }

    pub fn mine_revealed(&self) -> bool {
        self.tiles()
            .any(|tile| tile.is_mine() && tile.cover.is_revealed())
    }

    pub fn all_safe_revealed(&self) -> bool {
        self.revealed_count() == self.area() - self.mine_count
    }

    /// Consistency check for boards that did not come from `new`.
    pub fn validate(&self) -> Result<()> {
        let corrupt = |msg: String| Err(GameError::CorruptSave(msg));
        // shape first: `area` is only safe once the grid really is size x size
        if self.field.len() != self.size || self.field.iter().any(|row| row.len() != self.size) {
            return corrupt(format!("board is not {}x{}", self.size, self.size));
        }
        if self.size == 0 || self.mine_count >= self.area() {
            return corrupt(format!(
                "{} mines do not fit a {}x{} board",
                self.mine_count, self.size, self.size
            ));
        }
        let mines = self.tiles().filter(|tile| tile.is_mine()).count();
        if mines != self.mine_count {
            return corrupt(format!("expected {} mines, found {}", self.mine_count, mines));
        }
        for point in self.points() {
            if let Content::Safe(stored) = self.tile(&point).content {
                let actual = self.count_mined_neighbors(&point);
                if stored as usize != actual {
                    return corrupt(format!("{} counts {} mines, not {}", point, actual, stored));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = (self.size.saturating_sub(1)).to_string().len();
        let header = (0..self.size)
            .map(|col| format!("{:>width$}", col, width = width))
            .join(" ");
        writeln!(f, "{:width$} {}", "", header, width = width)?;
        for (i, row) in self.field.iter().enumerate() {
            let cells = row
                .iter()
                .map(|tile| format!("{:>width$}", tile.symbol(), width = width))
                .join(" ");
            writeln!(f, "{:>width$} {}", i, cells, width = width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
mod tile_tests {
    use super::*;

    fn covers() -> [Cover; 3] {
        [Cover::Hidden, Cover::Flagged, Cover::Revealed]
    }

    #[test]
    fn toggle_flag_correctness() {
        for start in covers().iter() {
            let mut tile = Tile::hidden();
            tile.cover = *start;
            let changed = tile.toggle_flag();
            match (start, tile.cover, changed) {
                (Cover::Revealed, Cover::Revealed, false) => {}
                (Cover::Flagged, Cover::Hidden, true) => {}
                (Cover::Hidden, Cover::Flagged, true) => {}
                _ => panic!("got an unexpected toggle state"),
            };
        }
    }

    #[test]
    fn symbols_hide_unrevealed_content() {
        let mine = Tile {
            content: Content::Mine,
            cover: Cover::Hidden,
        };
        assert_eq!(mine.symbol(), Symbol::Hidden);
        assert_eq!(
            Tile {
                cover: Cover::Flagged,
                ..mine
            }
            .symbol(),
            Symbol::Flag
        );
        assert_eq!(
            Tile {
                cover: Cover::Revealed,
                ..mine
            }
            .symbol(),
            Symbol::Mine
        );
        let three = Tile {
            content: Content::Safe(3),
            cover: Cover::Revealed,
        };
        assert_eq!(three.symbol(), Symbol::Count(3));
        assert_eq!(three.symbol().to_string(), "3");
        assert_eq!(Symbol::Count(0).to_string(), "_");
        assert_eq!(mine.adjacent_mines(), None);
        assert_eq!(three.adjacent_mines(), Some(3));
    }
}

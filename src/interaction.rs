use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;

use super::board::Point;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reveal(Point),
    Flag(Point),
    /// Save and stop; `None` means the default save file.
    Save(Option<PathBuf>),
    Help,
    Quit,
}

pub const USAGE: &str = "\
Commands:
  r ROW COL     reveal a tile
  f ROW COL     flag or unflag a tile
  s [FILE]      save the game and quit
  h             show this help
  q             quit without saving";

lazy_static! {
    static ref MOVE: Regex =
        Regex::new(r"(?i)^\s*(r|reveal|f|flag)\s+(\d+)(?:\s*,\s*|\s+)(\d+)\s*$").expect("move pattern");
    static ref SAVE: Regex = Regex::new(r"(?i)^\s*(?:s|save)(?:\s+(\S+))?\s*$").expect("save pattern");
    static ref WORD: Regex = Regex::new(r"(?i)^\s*(h|help|\?|q|quit|exit)\s*$").expect("word pattern");
}

impl Command {
    /// Parse one line of player input. Anything unrecognised is `None`.
    pub fn parse(input: &str) -> Option<Command> {
        if let Some(cap) = MOVE.captures(input) {
            let row: usize = cap[2].parse().ok()?;
            let col: usize = cap[3].parse().ok()?;
            let point = Point(row, col);
            return match cap[1].to_ascii_lowercase().as_str() {
                "r" | "reveal" => Some(Command::Reveal(point)),
                _ => Some(Command::Flag(point)),
            };
        }
        if let Some(cap) = SAVE.captures(input) {
            return Some(Command::Save(cap.get(1).map(|m| PathBuf::from(m.as_str()))));
        }
        let cap = WORD.captures(input)?;
        match cap[1].to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => Some(Command::Help),
        }
    }
}

/// Prompt until a well-formed command arrives. `None` once input is exhausted.
pub fn read_command<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<Command>> {
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Some(command) => return Ok(Some(command)),
            None => writeln!(output, "Must be of the form: r ROW COL, f ROW COL, s [FILE], h or q")?,
        }
    }
}

/// Ask for a name for the leaderboard. Blank input or end of input gives `None`.
pub fn read_name<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<String>> {
    write!(output, "Name: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let name = line.trim();
    Ok(if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    })
}

//! Modified EinStein würfelt nicht board.
//!
//! Six rows by seven columns. Each side owns numbered cubes. Red races toward
//! the lower-right corner, Blue toward the upper-left one. A cube steps one
//! square horizontally, vertically or diagonally toward its goal and captures
//! whatever enemy cube stands on the destination.
//!
//! The game is over once both goal corners are taken (Blue on the upper-left,
//! Red on the lower-right) or a side has lost every cube.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{BLUE_GOAL, N_COL, N_CUBES, N_ROW, RED_GOAL};
use crate::game::{Color, GameState};

/// A numbered cube.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cube {
    pub color: Color,
    pub num: u8,
}

impl Cube {
    pub fn new(color: Color, num: u8) -> Self {
        Self { color, num }
    }
}

/// Step direction, always toward the mover's goal corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Horizontal,
    Vertical,
    Diagonal,
}

impl Direction {
    const ALL: [Direction; 3] = [Direction::Horizontal, Direction::Vertical, Direction::Diagonal];
}

/// One move by one side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ply {
    /// Move the cube `num` standing on `(row, col)`.
    Step {
        row: u8,
        col: u8,
        num: u8,
        dir: Direction,
    },
    /// The side to move has no cube that can step.
    Pass,
}

impl Ply {
    pub fn step(row: usize, col: usize, num: u8, dir: Direction) -> Self {
        Ply::Step {
            row: row as u8,
            col: col as u8,
            num,
            dir,
        }
    }
}

/// Plies are written as `row col num dir` (`dir` is `h`, `v` or `d`) or `pass`.
impl fmt::Display for Ply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ply::Step { row, col, num, dir } => {
                let d = match dir {
                    Direction::Horizontal => 'h',
                    Direction::Vertical => 'v',
                    Direction::Diagonal => 'd',
                };
                write!(f, "{row} {col} {num} {d}")
            }
            Ply::Pass => write!(f, "pass"),
        }
    }
}

/// Errors produced while reading boards and plies from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoardError {
    #[error("expected {expected} tokens, got {got}")]
    TokenCount { expected: usize, got: usize },

    #[error("invalid cell token: {0}")]
    Cell(String),

    #[error("invalid color: {0}")]
    Color(String),

    #[error("invalid ply: {0}")]
    Ply(String),
}

impl FromStr for Color {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Color::Red),
            "b" | "blue" => Ok(Color::Blue),
            _ => Err(ParseBoardError::Color(s.to_string())),
        }
    }
}

impl FromStr for Ply {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() == 1 && parts[0].eq_ignore_ascii_case("pass") {
            return Ok(Ply::Pass);
        }
        if parts.len() != 4 {
            return Err(ParseBoardError::Ply(s.to_string()));
        }

        let bad = || ParseBoardError::Ply(s.to_string());
        let row: u8 = parts[0].parse().map_err(|_| bad())?;
        let col: u8 = parts[1].parse().map_err(|_| bad())?;
        let num: u8 = parts[2].parse().map_err(|_| bad())?;
        let dir = match parts[3].to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Direction::Horizontal,
            "v" | "vertical" => Direction::Vertical,
            "d" | "diagonal" => Direction::Diagonal,
            _ => return Err(bad()),
        };
        if row as usize >= N_ROW || col as usize >= N_COL {
            return Err(bad());
        }
        Ok(Ply::Step { row, col, num, dir })
    }
}

/// A board position, including the side to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Cube>; N_COL]; N_ROW],
    next_turn: Color,
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Board {
    /// An empty board with `next_turn` to move.
    pub fn empty(next_turn: Color) -> Self {
        Self {
            cells: [[None; N_COL]; N_ROW],
            next_turn,
        }
    }

    /// Standard opening: each side fills the triangle at its home corner,
    /// cubes numbered in row-major order. Red moves first.
    pub fn standard() -> Self {
        const HOME: [(usize, usize); N_CUBES as usize] =
            [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (2, 0)];

        let mut board = Self::empty(Color::Red);
        for (num, &(r, c)) in HOME.iter().enumerate() {
            board.set(r, c, Some(Cube::new(Color::Red, num as u8)));
            board.set(
                N_ROW - 1 - r,
                N_COL - 1 - c,
                Some(Cube::new(Color::Blue, num as u8)),
            );
        }
        board
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Option<Cube> {
        self.cells[r][c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, cube: Option<Cube>) {
        self.cells[r][c] = cube;
    }

    #[inline]
    pub fn next_turn(&self) -> Color {
        self.next_turn
    }

    pub fn set_next_turn(&mut self, color: Color) {
        self.next_turn = color;
    }

    /// Number of cubes `color` still has on the board.
    pub fn cube_count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, Some(cube) if cube.color == color))
            .count()
    }

    /// Both goal corners are taken, or one side has been wiped out.
    pub fn is_completed(&self) -> bool {
        if self.corners_taken().is_some() {
            return true;
        }
        self.cube_count(Color::Red) == 0 || self.cube_count(Color::Blue) == 0
    }

    /// Blue's cube on the upper-left goal and Red's cube on the lower-right
    /// goal, if both goals are taken.
    fn corners_taken(&self) -> Option<(Cube, Cube)> {
        let upper_left = self.get(BLUE_GOAL.0, BLUE_GOAL.1)?;
        let lower_right = self.get(RED_GOAL.0, RED_GOAL.1)?;
        (upper_left.color == Color::Blue && lower_right.color == Color::Red)
            .then_some((upper_left, lower_right))
    }

    /// Winner of a completed board, `None` for a draw.
    ///
    /// When both goals are taken the cube with the smaller number wins and
    /// equal numbers draw. Otherwise a side was wiped out, and the side that
    /// just moved is the winner.
    pub fn winner(&self) -> Option<Color> {
        if let Some((upper_left, lower_right)) = self.corners_taken() {
            return match upper_left.num.cmp(&lower_right.num) {
                std::cmp::Ordering::Less => Some(Color::Blue),
                std::cmp::Ordering::Greater => Some(Color::Red),
                std::cmp::Ordering::Equal => None,
            };
        }
        Some(self.next_turn.opponent())
    }

    /// Destination of a step by `color` from `(r, c)`, if it stays on the board.
    fn destination(color: Color, r: usize, c: usize, dir: Direction) -> Option<(usize, usize)> {
        let delta: isize = match color {
            Color::Red => 1,
            Color::Blue => -1,
        };
        let (dr, dc) = match dir {
            Direction::Horizontal => (0, delta),
            Direction::Vertical => (delta, 0),
            Direction::Diagonal => (delta, delta),
        };
        let nr = r.checked_add_signed(dr)?;
        let nc = c.checked_add_signed(dc)?;
        (nr < N_ROW && nc < N_COL).then_some((nr, nc))
    }

    /// Every legal ply for the side to move, row-major and per cube in
    /// horizontal, vertical, diagonal order.
    ///
    /// A completed board has no plies. A side with no cube able to step on an
    /// unfinished board gets the single ply [`Ply::Pass`].
    pub fn legal_plies(&self) -> Vec<Ply> {
        if self.is_completed() {
            return Vec::new();
        }

        let turn = self.next_turn;
        let mut plies = Vec::new();
        for r in 0..N_ROW {
            for c in 0..N_COL {
                let cube = match self.get(r, c) {
                    Some(cube) if cube.color == turn => cube,
                    _ => continue,
                };
                for dir in Direction::ALL {
                    let Some((nr, nc)) = Self::destination(turn, r, c, dir) else {
                        continue;
                    };
                    if self.get(nr, nc).is_none_or(|other| other.color != turn) {
                        plies.push(Ply::step(r, c, cube.num, dir));
                    }
                }
            }
        }

        if plies.is_empty() {
            plies.push(Ply::Pass);
        }
        plies
    }

    /// Play `ply` in place and hand the turn to the other side.
    ///
    /// `ply` must be legal for this board; a step that does not match the
    /// cube on its square, or leaves the board, only flips the turn.
    pub fn apply_ply(&mut self, ply: &Ply) {
        if let Ply::Step { row, col, num, dir } = *ply {
            let (r, c) = (row as usize, col as usize);
            let cube = self.get(r, c);
            debug_assert!(
                matches!(cube, Some(cube) if cube.color == self.next_turn && cube.num == num),
                "ply {ply} does not match the board"
            );
            if let (Some(cube), Some((nr, nc))) = (cube, Self::destination(self.next_turn, r, c, dir)) {
                self.set(nr, nc, Some(cube));
                self.set(r, c, None);
            }
        }
        self.next_turn = self.next_turn.opponent();
    }

    /// Sum of Manhattan distances from every cube to its goal corner.
    pub fn total_distance(&self) -> u32 {
        let mut total = 0;
        for r in 0..N_ROW {
            for c in 0..N_COL {
                total += match self.get(r, c) {
                    Some(Cube { color: Color::Red, .. }) => (RED_GOAL.0 - r) + (RED_GOAL.1 - c),
                    Some(Cube { color: Color::Blue, .. }) => (r - BLUE_GOAL.0) + (c - BLUE_GOAL.1),
                    None => 0,
                };
            }
        }
        total as u32
    }

    /// The board rotated by 180 degrees with cube colors exchanged. The side
    /// to move is left as it is.
    pub fn flipped(&self) -> Self {
        let mut board = Self::empty(self.next_turn);
        for r in 0..N_ROW {
            for c in 0..N_COL {
                let cube = self
                    .get(r, c)
                    .map(|cube| Cube::new(cube.color.opponent(), cube.num));
                board.set(N_ROW - 1 - r, N_COL - 1 - c, cube);
            }
        }
        board
    }
}

impl GameState for Board {
    type Move = Ply;

    fn to_move(&self) -> Color {
        self.next_turn
    }

    fn apply(&self, mv: &Ply) -> Self {
        let mut next = *self;
        next.apply_ply(mv);
        next
    }

    fn legal_moves(&self) -> Vec<Ply> {
        self.legal_plies()
    }

    fn is_terminal(&self) -> bool {
        self.is_completed()
    }

    fn winner(&self) -> Option<Color> {
        Board::winner(self)
    }

    fn distance_remaining(&self) -> u32 {
        self.total_distance()
    }
}

/// Six lines of seven right-aligned tokens: `R3`, `B0`, or `__` for empty.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let token = match cell {
                    Some(Cube { color: Color::Red, num }) => format!("R{num}"),
                    Some(Cube { color: Color::Blue, num }) => format!("B{num}"),
                    None => "__".to_string(),
                };
                write!(f, "{token:>4}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses the [`Display`](fmt::Display) format, optionally followed by the
/// side to move (`red` or `blue`; Red when omitted).
impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let cells = N_ROW * N_COL;
        let next_turn = match tokens.len() {
            n if n == cells => Color::Red,
            n if n == cells + 1 => tokens[cells].parse()?,
            got => {
                return Err(ParseBoardError::TokenCount {
                    expected: cells,
                    got,
                });
            }
        };

        let mut board = Self::empty(next_turn);
        for (i, token) in tokens.iter().take(cells).enumerate() {
            board.set(i / N_COL, i % N_COL, parse_cell(token)?);
        }
        Ok(board)
    }
}

fn parse_cell(token: &str) -> Result<Option<Cube>, ParseBoardError> {
    if token == "__" {
        return Ok(None);
    }
    let bad = || ParseBoardError::Cell(token.to_string());
    let mut chars = token.chars();
    let color = match chars.next() {
        Some('R') => Color::Red,
        Some('B') => Color::Blue,
        _ => return Err(bad()),
    };
    let num: u8 = chars.as_str().parse().map_err(|_| bad())?;
    if num >= N_CUBES {
        return Err(bad());
    }
    Ok(Some(Cube::new(color, num)))
}

use std::fmt;

use rand::{seq::SliceRandom, thread_rng};
use thiserror::Error;

/// Character drawn at the agent's position when a grid is rendered
///
/// Render-only: it is never a valid map character and never stored in a [`Grid`].
pub const AGENT_MARKER: char = 'A';

/// Errors produced while turning a map description into a usable [`Grid`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// A row's length differs from the first row's
    #[error("row {row} is {len} cells wide, expected {expected}")]
    RaggedRows {
        row: usize,
        len: usize,
        expected: usize,
    },
    /// A character outside the map alphabet (` `, `#`, `+`, `-`)
    #[error("unknown cell {ch:?} at ({x}, {y})")]
    UnknownCell { ch: char, x: i32, y: i32 },
    /// No empty cell to start an episode from
    #[error("map has no empty cell to start from")]
    NoStartCell,
}

/// A single cell of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Traversable and non-terminal
    Empty,
    /// Impassable
    Wall,
    /// Terminal, reward +10
    Goal,
    /// Terminal, reward -10
    Trap,
}

impl Cell {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(Cell::Empty),
            '#' => Some(Cell::Wall),
            '+' => Some(Cell::Goal),
            '-' => Some(Cell::Trap),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Wall => '#',
            Cell::Goal => '+',
            Cell::Trap => '-',
        }
    }

    /// The reward collected by standing on this cell
    pub fn reward(self) -> f32 {
        match self {
            Cell::Goal => 10.0,
            Cell::Trap => -10.0,
            Cell::Empty | Cell::Wall => 0.0,
        }
    }

    /// Whether an agent may step onto this cell
    pub fn traversable(self) -> bool {
        !matches!(self, Cell::Wall)
    }
}

/// A location on a [`Grid`]
///
/// A plain value: recomputed every step and compared by coordinates. `Ord` is
/// x-then-y, the order table reports are printed in. Coordinates are signed so
/// a candidate destination can be computed before its bounds are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position displaced by `(dx, dy)`, with no bounds check
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangular grid of cells parsed from a `|`-separated map description
///
/// Immutable once parsed; the agent marker shown in rendered output never
/// touches the grid itself (see [`render`]).
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    width: i32,
    height: i32,
}

impl Grid {
    /// Parse a map description into a grid
    ///
    /// Rows are separated by `|` and must all have the first row's length.
    pub fn parse(description: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = description.split('|').collect();
        let width = rows[0].chars().count();
        let mut cells = Vec::with_capacity(width * rows.len());

        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(MapError::RaggedRows {
                    row: y,
                    len,
                    expected: width,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or(MapError::UnknownCell {
                    ch,
                    x: x as i32,
                    y: y as i32,
                })?;
                cells.push(cell);
            }
        }

        Ok(Self {
            cells,
            width: width as i32,
            height: rows.len() as i32,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `pos` lies on the grid
    pub fn contains(&self, pos: Position) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    /// The cell at `pos`, or `None` out of bounds
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.contains(pos)
            .then(|| self.cells[(pos.y * self.width + pos.x) as usize])
    }

    /// Every empty cell in row-major order: the candidate episode starts
    pub fn start_cells(&self) -> Vec<Position> {
        let (width, height) = (self.width, self.height);
        (0..height)
            .flat_map(|y| (0..width).map(move |x| Position::new(x, y)))
            .filter(|&pos| self.get(pos) == Some(Cell::Empty))
            .collect()
    }

    /// Uniformly sample an episode start position
    pub fn pick_start(&self) -> Result<Position, MapError> {
        self.start_cells()
            .choose(&mut thread_rng())
            .copied()
            .ok_or(MapError::NoStartCell)
    }
}

/// Render `grid` with the agent drawn at `agent`, leaving the grid untouched
///
/// The frame is a `-` border above and below and `|` on either side of each
/// row, with [`AGENT_MARKER`] substituted at the agent's cell. An off-grid
/// `agent` simply goes unmarked.
pub fn render(grid: &Grid, agent: Position) -> String {
    let width = grid.width as usize;
    let mut out = String::with_capacity((width + 4) * (grid.height as usize + 2));

    out.push(' ');
    out.push_str(&"-".repeat(width));
    out.push('\n');
    for y in 0..grid.height {
        out.push('|');
        for x in 0..grid.width {
            let pos = Position::new(x, y);
            out.push(if pos == agent {
                AGENT_MARKER
            } else {
                grid.cells[(y * grid.width + x) as usize].as_char()
            });
        }
        out.push_str("|\n");
    }
    out.push(' ');
    out.push_str(&"-".repeat(width));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::gridworld::DEFAULT_MAP;

    #[test]
    fn parse_default_map() {
        let grid = Grid::parse(DEFAULT_MAP).unwrap();
        assert_eq!(grid.width(), 7, "Seven cells per row");
        assert_eq!(grid.height(), 5, "Five rows");
        assert_eq!(grid.get(Position::new(0, 0)), Some(Cell::Empty), "Open corner");
        assert_eq!(grid.get(Position::new(1, 1)), Some(Cell::Wall), "Wall run");
        assert_eq!(grid.get(Position::new(6, 1)), Some(Cell::Trap), "Trap cell");
        assert_eq!(grid.get(Position::new(6, 2)), Some(Cell::Goal), "Goal cell");
    }

    #[test]
    fn get_out_of_bounds_is_none() {
        let grid = Grid::parse(DEFAULT_MAP).unwrap();
        assert_eq!(grid.get(Position::new(-1, 0)), None);
        assert_eq!(grid.get(Position::new(0, -1)), None);
        assert_eq!(grid.get(Position::new(7, 0)), None);
        assert_eq!(grid.get(Position::new(0, 5)), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Grid::parse("  |   ").unwrap_err();
        assert_eq!(
            err,
            MapError::RaggedRows {
                row: 1,
                len: 3,
                expected: 2
            },
            "Second row is one cell too wide"
        );
    }

    #[test]
    fn unknown_cells_are_rejected() {
        let err = Grid::parse(" #|x ").unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownCell { ch: 'x', x: 0, y: 1 },
            "First bad character wins"
        );
    }

    #[test]
    fn agent_marker_is_not_a_map_character() {
        assert_eq!(
            Grid::parse("A").unwrap_err(),
            MapError::UnknownCell { ch: 'A', x: 0, y: 0 },
            "The marker only exists in rendered output"
        );
    }

    #[test]
    fn map_errors_print_as_plain_sentences() {
        let ragged = MapError::RaggedRows {
            row: 1,
            len: 3,
            expected: 2,
        };
        assert_eq!(ragged.to_string(), "row 1 is 3 cells wide, expected 2");
        let unknown = MapError::UnknownCell { ch: 'a', x: 0, y: 0 };
        assert_eq!(unknown.to_string(), "unknown cell 'a' at (0, 0)");
        assert_eq!(
            MapError::NoStartCell.to_string(),
            "map has no empty cell to start from"
        );
    }

    #[test]
    fn start_cells_are_the_empty_cells() {
        let grid = Grid::parse(DEFAULT_MAP).unwrap();
        let starts = grid.start_cells();
        assert_eq!(starts.len(), 23, "Default map has 23 empty cells");
        assert!(starts.contains(&Position::new(0, 0)));
        assert!(!starts.contains(&Position::new(1, 1)), "Walls are not starts");
        assert!(!starts.contains(&Position::new(6, 2)), "Terminals are not starts");
    }

    #[test]
    fn pick_start_returns_an_empty_cell() {
        let grid = Grid::parse(DEFAULT_MAP).unwrap();
        let start = grid.pick_start().unwrap();
        assert_eq!(grid.get(start), Some(Cell::Empty), "Starts are empty cells");
    }

    #[test]
    fn pick_start_fails_without_empty_cells() {
        let grid = Grid::parse("##|#+").unwrap();
        assert_eq!(grid.pick_start().unwrap_err(), MapError::NoStartCell);
    }

    #[test]
    fn render_overlays_the_agent_without_touching_the_grid() {
        let grid = Grid::parse(" +|# ").unwrap();
        let picture = render(&grid, Position::new(0, 0));
        assert_eq!(picture, " --\n|A+|\n|# |\n --");
        assert_eq!(
            grid.get(Position::new(0, 0)),
            Some(Cell::Empty),
            "Marker is render-only"
        );
    }

    #[test]
    fn render_skips_an_off_grid_agent() {
        let grid = Grid::parse("+").unwrap();
        assert_eq!(render(&grid, Position::new(5, 5)), " -\n|+|\n -");
    }

    #[test]
    fn position_order_is_x_then_y() {
        let mut positions = vec![
            Position::new(1, 0),
            Position::new(0, 1),
            Position::new(0, 0),
        ];
        positions.sort();
        assert_eq!(
            positions,
            [Position::new(0, 0), Position::new(0, 1), Position::new(1, 0)],
            "Report lines sort by x, then y"
        );
    }
}

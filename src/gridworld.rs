use std::fmt;

use strum::{Display, EnumCount, VariantArray};

use crate::env::{DiscreteActionSpace, Environment, Report};
use crate::grid::{render, Cell, Grid, MapError, Position};

/// The map trained on when none is supplied
pub const DEFAULT_MAP: &str = "       | ###  -| # #  +| # ####|       ";

/// The four moves available to the agent
///
/// Discriminants double as Q-table row indices, so the declaration order here
/// is also the column order of table reports.
#[derive(VariantArray, EnumCount, Display, Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    /// Coordinate displacement of this move
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Right => (1, 0),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
        }
    }
}

/// A grid world with walls, terminal reward cells, and random episode starts
///
/// Intended for use with a [`QTableAgent`](crate::algo::QTableAgent)
pub struct GridWorld {
    grid: Grid,
    pos: Position,
    pub report: Report,
}

impl GridWorld {
    /// Build a world from a map description
    ///
    /// Fails on a malformed map or one with no empty cell to start from, so a
    /// bad configuration surfaces before any training begins.
    pub fn new(map: &str) -> Result<Self, MapError> {
        let grid = Grid::parse(map)?;
        let pos = grid.pick_start()?;
        Ok(Self {
            grid,
            pos,
            report: Report::new(vec!["steps", "reward"]),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Where the agent currently stands
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Whether `action` may be taken from `pos`
    ///
    /// Legal iff the destination is on the grid and not a wall; terminal cells
    /// may be stepped onto.
    pub fn is_legal(&self, pos: Position, action: Action) -> bool {
        self.grid
            .get(pos.offset(action.delta()))
            .map_or(false, Cell::traversable)
    }

    /// The legal actions from `pos`, preserving the fixed action order
    pub fn legal_actions(&self, pos: Position) -> Vec<Action> {
        Action::VARIANTS
            .iter()
            .copied()
            .filter(|&action| self.is_legal(pos, action))
            .collect()
    }

    /// The reward for standing at `pos`, or `None` off the grid
    ///
    /// Walls yield `0.0`: they are never a legal standing point, but the query
    /// must not fail on them.
    pub fn reward(&self, pos: Position) -> Option<f32> {
        self.grid.get(pos).map(Cell::reward)
    }
}

impl Environment for GridWorld {
    type State = Position;
    type Action = Action;

    fn reset(&mut self) -> Self::State {
        self.pos = self
            .grid
            .pick_start()
            .expect("start cells were verified at construction");
        self.pos
    }

    fn step(&mut self, action: Self::Action) -> (Self::State, f32) {
        assert!(
            self.is_legal(self.pos, action),
            "Illegal action {} from {}",
            action,
            self.pos
        );

        self.pos = self.pos.offset(action.delta());
        let reward = self.reward(self.pos).expect("legal moves stay on the grid");

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report
            .entry("reward")
            .and_modify(|x| *x += f64::from(reward));

        (self.pos, reward)
    }

    fn is_terminal(&self) -> bool {
        self.reward(self.pos).map_or(false, |reward| reward != 0.0)
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self) -> Vec<Self::Action> {
        self.legal_actions(self.pos)
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.grid, self.pos))
    }
}

use crate::entities::Entity;
use crate::map::{Map, MapError};
use crate::options::GameOptions;
use pyo3::prelude::*;
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A `(row, col)` coordinate on the map.
pub type Location = (usize, usize);

/// The turn lifecycle of an Ants game, as seen by the environment.
///
/// Players are numbered from 0 in the order they appear in the map.
pub trait AntsEngine {
    fn height(&self) -> usize;

    fn width(&self) -> usize;

    fn players(&self) -> usize;

    fn turn(&self) -> usize;

    /// Starts the game. Must be called once before the first turn.
    fn start_game(&mut self);

    /// Restores the game to the state it was constructed in.
    fn restart(&mut self);

    fn start_turn(&mut self);

    /// Queues the orders of `player` for the current turn.
    fn do_moves(&mut self, player: usize, orders: &[Order]) -> MoveReport;

    /// Resolves every queued order and advances the game by one turn.
    fn finish_turn(&mut self);

    /// Locations of the live ants of `player`.
    fn player_ants(&self, player: usize) -> Vec<Location>;

    fn is_alive(&self, player: usize) -> bool;

    fn game_over(&self) -> bool;

    /// The board as seen by `player`, one row per map row.
    fn get_perspective(&self, player: usize) -> Vec<Vec<CellState>>;
}

/// Represents the direction an ant can move.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[pyclass(module = "gym_ants", eq, eq_int)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The cell one step away from `(row, col)`, or `None` if it is off the map.
    pub fn destination(
        self,
        (row, col): Location,
        height: usize,
        width: usize,
    ) -> Option<Location> {
        let destination = match self {
            Direction::North => (row.checked_sub(1)?, col),
            Direction::East => (row, col + 1),
            Direction::South => (row + 1, col),
            Direction::West => (row, col.checked_sub(1)?),
        };

        (destination.0 < height && destination.1 < width).then_some(destination)
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::East => 'e',
            Direction::South => 's',
            Direction::West => 'w',
        }
    }
}

impl Distribution<Direction> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        match rng.gen_range(0..4) {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }
}

impl FromStr for Direction {
    type Err = OrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Direction::North),
            "e" | "east" => Ok(Direction::East),
            "s" | "south" => Ok(Direction::South),
            "w" | "west" => Ok(Direction::West),
            _ => Err(OrderError::UnknownDirection(value.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An order to move the ant at `(row, col)` one step in `direction`.
///
/// Its text form is the one used by Ants bots: `o <row> <col> <direction>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Order {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

impl Order {
    pub fn new(row: usize, col: usize, direction: Direction) -> Order {
        Order {
            row,
            col,
            direction,
        }
    }

    pub fn location(&self) -> Location {
        (self.row, self.col)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o {} {} {}", self.row, self.col, self.direction)
    }
}

impl FromStr for Order {
    type Err = OrderError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [row, col, direction] = match parts.as_slice() {
            ["o", row, col, direction] | [row, col, direction] => [*row, *col, *direction],
            _ => return Err(OrderError::Malformed(line.to_string())),
        };

        let coordinate = |value: &str| {
            value
                .parse::<usize>()
                .map_err(|_| OrderError::Malformed(line.to_string()))
        };

        Ok(Order::new(coordinate(row)?, coordinate(col)?, direction.parse()?))
    }
}

/// Why an order was not carried out, or could not be read.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
pub enum OrderError {
    #[error("no live ant of the player at the order location")]
    NotPlayerAnt,
    #[error("the location already has an order this turn")]
    DuplicateOrder,
    #[error("the destination is off the map")]
    OffMap,
    #[error("the destination is blocked")]
    Blocked,
    #[error("malformed order '{0}', expected 'o <row> <col> <n|e|s|w>'")]
    Malformed(String),
    #[error("unknown direction '{0}'")]
    UnknownDirection(String),
}

/// The engine's answer to a batch of orders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveReport {
    /// Orders queued for the end of the turn.
    pub valid: Vec<Order>,
    /// Well-formed orders that will have no effect.
    pub ignored: Vec<(Order, OrderError)>,
    /// Orders that do not refer to an ant the player can command.
    pub invalid: Vec<(Order, OrderError)>,
}

/// What a player knows about a single cell of the board.
///
/// The discriminants are the values used in observations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum CellState {
    Water = 0,
    Land = 1,
    Hill = 2,
    EnemyHill = 3,
    AntsNotMoved = 4,
    AntsMoved = 5,
    Enemy = 6,
    Food = 7,
    Unseen = 8,
}

impl CellState {
    /// Number of distinct cell states.
    pub const COUNT: usize = 9;

    pub fn code(self) -> u8 {
        self as u8
    }

    fn of(entity: Option<&Entity>, player: usize) -> CellState {
        match entity {
            None => CellState::Land,
            Some(Entity::Water) => CellState::Water,
            Some(Entity::Food) => CellState::Food,
            Some(Entity::Hill { player: owner }) if *owner == player => CellState::Hill,
            Some(Entity::Hill { .. }) => CellState::EnemyHill,
            Some(Entity::Ant { player: owner, .. }) if *owner == player => {
                CellState::AntsNotMoved
            }
            Some(Entity::Ant { .. }) => CellState::Enemy,
        }
    }
}

enum Verdict {
    Valid,
    Ignored(OrderError),
    Invalid(OrderError),
}

/// Represents the reason the game finished.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FinishedReason {
    /// At most one player has ants left.
    LoneSurvivor,
    /// The maximum number of turns was reached.
    TurnLimitReached,
}

/// The Ants game.
///
/// Keeps the map, the orders of the current turn and the end-of-game state.
/// Combat, food and scoring are not simulated: ants move, ants that run into
/// each other die, and the game ends when a single player is left or the turn
/// limit is reached.
#[derive(Clone, Debug)]
pub struct Game {
    map: Map,
    initial_map: Map,
    view_radius2: usize,
    max_turns: usize,
    turn: usize,
    orders: Vec<Vec<Order>>,
    started: bool,
    finished_reason: Option<FinishedReason>,
}

impl Game {
    /// Creates a new game from the options. Fails if the map can't be parsed.
    pub fn new(options: &GameOptions) -> Result<Game, MapError> {
        let map = Map::parse(&options.map)?;
        let players = map.players();

        Ok(Game {
            initial_map: map.clone(),
            map,
            view_radius2: options.viewradius2 as usize,
            max_turns: options.turns as usize,
            turn: 0,
            orders: vec![vec![]; players],
            started: false,
            finished_reason: None,
        })
    }

    pub fn finished_reason(&self) -> Option<FinishedReason> {
        self.finished_reason
    }

    fn spawn_ants_all_hills(&mut self) {
        for (player, (row, col)) in self.map.ant_hills() {
            if self.map.get(row, col).is_some_and(Entity::is_live_ant) {
                continue;
            }
            self.map.set(row, col, Entity::ant(player, Some(player)));
        }
    }

    fn move_ants(&mut self) {
        let orders: Vec<Order> = self.orders.iter().flatten().copied().collect();

        for order in orders {
            let Some(to) = order
                .direction
                .destination(order.location(), self.map.height(), self.map.width())
            else {
                continue;
            };
            self.map.move_entity(order.location(), to);
        }
    }

    fn check_for_endgame(&mut self) {
        if self.remaining_players() <= 1 {
            self.finished_reason = Some(FinishedReason::LoneSurvivor);
        } else if self.turn >= self.max_turns {
            self.finished_reason = Some(FinishedReason::TurnLimitReached);
        }

        if let Some(reason) = self.finished_reason {
            tracing::info!(turn = self.turn, ?reason, "game finished");
        }
    }

    fn remaining_players(&self) -> usize {
        (0..self.map.players())
            .filter(|player| self.is_alive(*player))
            .count()
    }

    fn classify(&self, player: usize, order: &Order, seen: &HashSet<Location>) -> Verdict {
        let location = order.location();
        let is_own_ant = self.map.contains(location)
            && self
                .map
                .get(order.row, order.col)
                .is_some_and(|entity| entity.is_live_ant() && entity.player() == Some(player));

        if !is_own_ant {
            return Verdict::Invalid(OrderError::NotPlayerAnt);
        }
        if seen.contains(&location) {
            return Verdict::Invalid(OrderError::DuplicateOrder);
        }

        match order
            .direction
            .destination(location, self.map.height(), self.map.width())
        {
            None => Verdict::Ignored(OrderError::OffMap),
            Some((row, col)) if self.map.get(row, col).is_some_and(Entity::blocks_movement) => {
                Verdict::Ignored(OrderError::Blocked)
            }
            Some(_) => Verdict::Valid,
        }
    }
}

impl AntsEngine for Game {
    fn height(&self) -> usize {
        self.map.height()
    }

    fn width(&self) -> usize {
        self.map.width()
    }

    fn players(&self) -> usize {
        self.map.players()
    }

    fn turn(&self) -> usize {
        self.turn
    }

    fn start_game(&mut self) {
        self.turn = 0;
        self.started = true;
        self.finished_reason = None;
        self.spawn_ants_all_hills();
    }

    fn restart(&mut self) {
        self.map = self.initial_map.clone();
        self.turn = 0;
        self.started = false;
        self.finished_reason = None;
        self.orders = vec![vec![]; self.map.players()];
    }

    fn start_turn(&mut self) {
        self.orders.iter_mut().for_each(Vec::clear);
    }

    fn do_moves(&mut self, player: usize, orders: &[Order]) -> MoveReport {
        let mut report = MoveReport::default();
        if player >= self.map.players() {
            report.invalid = orders
                .iter()
                .map(|order| (*order, OrderError::NotPlayerAnt))
                .collect();
            return report;
        }

        let mut seen: HashSet<Location> =
            self.orders[player].iter().map(Order::location).collect();

        for order in orders {
            match self.classify(player, order, &seen) {
                Verdict::Valid => {
                    seen.insert(order.location());
                    self.orders[player].push(*order);
                    report.valid.push(*order);
                }
                Verdict::Ignored(reason) => report.ignored.push((*order, reason)),
                Verdict::Invalid(reason) => {
                    tracing::warn!(player, %order, %reason, "invalid order");
                    report.invalid.push((*order, reason));
                }
            }
        }

        report
    }

    fn finish_turn(&mut self) {
        if !self.started {
            panic!("Game has not started! Call `start_game` to start the game.");
        }

        if self.finished_reason.is_some() {
            panic!("Game is finished! Call `restart` to start a new game.");
        }

        self.move_ants();
        let removed = self.map.remove_dead_ants();
        self.orders.iter_mut().for_each(Vec::clear);
        self.turn += 1;

        tracing::debug!(turn = self.turn, removed, "turn finished");
        self.check_for_endgame();
    }

    fn player_ants(&self, player: usize) -> Vec<Location> {
        self.map.ants_of(player)
    }

    fn is_alive(&self, player: usize) -> bool {
        !self.map.ants_of(player).is_empty()
    }

    fn game_over(&self) -> bool {
        self.finished_reason.is_some()
    }

    fn get_perspective(&self, player: usize) -> Vec<Vec<CellState>> {
        let visible = self
            .map
            .visibility(&self.map.ants_of(player), self.view_radius2);
        let width = self.map.width();

        (0..self.map.height())
            .map(|row| {
                (0..width)
                    .map(|col| match visible[row * width + col] {
                        true => CellState::of(self.map.get(row, col), player),
                        false => CellState::Unseen,
                    })
                    .collect()
            })
            .collect()
    }
}

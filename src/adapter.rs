use crate::engine::{AntsEngine, CellState, Direction, Location, MoveReport, Order};
use crate::opponent::OpponentStrategy;
use std::collections::HashMap;
use uuid::Uuid;

/// The player controlled by the agent.
pub const AGENT: usize = 0;

/// Why a move was rejected. A rejected move changes nothing.
#[derive(Clone, Copy, Debug, thiserror::Error, Eq, PartialEq)]
pub enum InvalidMove {
    #[error("no unmoved ant of the agent at ({row}, {col})")]
    NoUnmovedUnit { row: usize, col: usize },
    #[error("the ant at ({row}, {col}) already moved this turn")]
    AlreadyMoved { row: usize, col: usize },
    #[error("the episode is over")]
    EpisodeOver,
}

/// Outcome of an accepted move.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    /// The move was buffered, `remaining` ants still have to move this turn.
    Pending { remaining: usize },
    /// The move was the last one of the turn and the turn was played.
    TurnCompleted(MoveReport),
}

/// The moves of the current turn, in the order they were submitted.
#[derive(Clone, Debug, Default)]
pub struct PendingMoves {
    orders: Vec<Order>,
    index: HashMap<Location, usize>,
}

impl PendingMoves {
    /// Records `order` unless its location already has a move.
    pub fn insert(&mut self, order: Order) -> bool {
        if self.index.contains_key(&order.location()) {
            return false;
        }

        self.index.insert(order.location(), self.orders.len());
        self.orders.push(order);
        true
    }

    pub fn get(&self, location: Location) -> Option<Direction> {
        self.index
            .get(&location)
            .map(|position| self.orders[*position].direction)
    }

    pub fn contains(&self, location: Location) -> bool {
        self.index.contains_key(&location)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn clear(&mut self) {
        self.orders.clear();
        self.index.clear();
    }
}

/// The board as seen by the agent, `rows` x `cols` cells in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl Observation {
    pub fn from_grid(grid: Vec<Vec<CellState>>) -> Observation {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);

        Observation {
            rows,
            cols,
            cells: grid.into_iter().flatten().collect(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(self.cols.max(1))
    }

    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.rows()
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    fn set(&mut self, row: usize, col: usize, value: CellState) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = value;
        }
    }
}

/// Drives an Ants game one ant at a time.
///
/// Moves of the agent's ants are buffered until every ant has moved. The
/// batch is then handed to the engine, the opponents move and the turn is
/// finished, all within the call that submitted the last move.
pub struct TurnAdapter<E: AntsEngine> {
    engine: E,
    pending: PendingMoves,
    opponents: Box<dyn OpponentStrategy>,
    session: Uuid,
}

impl<E: AntsEngine> TurnAdapter<E> {
    /// Opens a session on `engine` and starts the game.
    pub fn new(mut engine: E, opponents: Box<dyn OpponentStrategy>) -> TurnAdapter<E> {
        let session = Uuid::new_v4();
        engine.start_game();
        tracing::info!(
            %session,
            rows = engine.height(),
            cols = engine.width(),
            players = engine.players(),
            "session started"
        );

        TurnAdapter {
            engine,
            pending: PendingMoves::default(),
            opponents,
            session,
        }
    }

    /// Submits the move of the agent's ant at `location`.
    ///
    /// Plays the whole turn when this is the last ant of the agent to move.
    pub fn submit_move(
        &mut self,
        location: Location,
        direction: Direction,
    ) -> Result<Submission, InvalidMove> {
        let (row, col) = location;

        if self.is_episode_over() {
            return Err(InvalidMove::EpisodeOver);
        }
        if self.pending.contains(location) {
            tracing::debug!(session = %self.session, row, col, "ant already moved");
            return Err(InvalidMove::AlreadyMoved { row, col });
        }

        let ants = self.engine.player_ants(AGENT);
        if !ants.contains(&location) {
            tracing::debug!(session = %self.session, row, col, "no ant to move");
            return Err(InvalidMove::NoUnmovedUnit { row, col });
        }

        if self.pending.is_empty() {
            self.engine.start_turn();
        }
        self.pending.insert(Order::new(row, col, direction));
        tracing::debug!(session = %self.session, row, col, %direction, "move accepted");

        if self.pending.len() < ants.len() {
            return Ok(Submission::Pending {
                remaining: ants.len() - self.pending.len(),
            });
        }

        Ok(Submission::TurnCompleted(self.play_turn()))
    }

    /// Restarts the game with an empty turn.
    pub fn reset(&mut self) {
        self.engine.restart();
        self.pending.clear();
        self.engine.start_game();
        tracing::info!(session = %self.session, "session reset");
    }

    pub fn is_episode_over(&self) -> bool {
        !self.engine.is_alive(AGENT) || self.engine.game_over()
    }

    /// The board as seen by the agent. Ants that already moved this turn are
    /// reported as [`CellState::AntsMoved`].
    pub fn get_observation(&self) -> Observation {
        let mut observation = Observation::from_grid(self.engine.get_perspective(AGENT));
        for order in self.pending.orders() {
            observation.set(order.row, order.col, CellState::AntsMoved);
        }
        observation
    }

    pub fn pending(&self) -> &PendingMoves {
        &self.pending
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn set_opponents(&mut self, opponents: Box<dyn OpponentStrategy>) {
        self.opponents = opponents;
    }

    /// Closes the session and hands the engine back.
    pub fn into_engine(self) -> E {
        tracing::info!(session = %self.session, "session closed");
        self.engine
    }

    fn play_turn(&mut self) -> MoveReport {
        let report = self.engine.do_moves(AGENT, self.pending.orders());
        self.do_opponent_moves();
        self.engine.finish_turn();

        tracing::info!(
            session = %self.session,
            turn = self.engine.turn(),
            orders = self.pending.len(),
            ignored = report.ignored.len(),
            invalid = report.invalid.len(),
            "turn completed"
        );
        self.pending.clear();

        report
    }

    fn do_opponent_moves(&mut self) {
        for player in (0..self.engine.players()).filter(|player| *player != AGENT) {
            if !self.engine.is_alive(player) {
                continue;
            }

            let ants = self.engine.player_ants(player);
            let orders = self.opponents.orders(player, &ants);
            if orders.is_empty() {
                continue;
            }

            tracing::debug!(session = %self.session, player, orders = orders.len(), "opponent moves");
            self.engine.do_moves(player, &orders);
        }
    }
}

use crate::adapter::{Observation, Submission, TurnAdapter};
use crate::engine::{AntsEngine, CellState, Direction, Game, Order};
use crate::entities::player_to_color;
use crate::error::AntsError;
use crate::opponent::{OpponentStrategy, Passive, RandomOpponent};
use crate::options::{GameOptions, OpponentKind, Options};
use clap::Parser;
use crossterm::{
    cursor::Hide,
    execute,
    style::{Color, Print, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde::Serialize;
use std::ffi::OsString;
use std::io::{stdout, Write};
use std::str::FromStr;

/// Reward of a move that was accepted.
pub const MOVE_REWARD: f32 = 0.0;
/// Reward of a move that was rejected.
pub const INVALID_MOVE_REWARD: f32 = -1.0;

/// A reinforcement learning environment with gym-style dynamics.
///
/// When the episode is over, further calls to `step` are rejected until
/// `reset` is called.
pub trait Environment {
    type Observation;
    type Action;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Self::Observation;

    /// Runs one timestep of the environment.
    fn step(&mut self, action: Self::Action) -> StepResult<Self::Observation>;

    /// Draws the environment to the terminal (`Human`) or returns it as text (`Ansi`).
    fn render(&self, mode: RenderMode) -> Result<Option<String>, AntsError>;

    fn observation_space(&self) -> SpaceInfo;

    fn action_space(&self) -> SpaceInfo;
}

/// Result of an environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult<O> {
    pub observation: O,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// Auxiliary information about a step.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[pyclass(module = "gym_ants", get_all)]
pub struct StepInfo {
    /// The turn of the game after the step.
    pub turn: usize,
    /// Number of ants that moved in the current turn and wait for the others.
    pub pending_moves: usize,
    /// Whether the step played a full turn of the game.
    pub turn_completed: bool,
    /// Why the move was rejected. `None` if it was accepted.
    pub rejected: Option<String>,
}

#[pymethods]
impl StepInfo {
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(self).map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

/// Shape of a space and the number of discrete values each element can take.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpaceInfo {
    pub shape: Vec<usize>,
    pub values: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderMode {
    Human,
    Ansi,
}

impl FromStr for RenderMode {
    type Err = AntsError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "human" => Ok(RenderMode::Human),
            "ansi" => Ok(RenderMode::Ansi),
            _ => Err(AntsError::UnknownRenderMode(mode.to_string())),
        }
    }
}

/// The Ants game as a single-agent environment.
///
/// An action moves one of the agent's ants. The game advances by one turn once
/// every ant of the agent has moved.
#[pyclass(module = "gym_ants")]
pub struct AntsEnv {
    adapter: TurnAdapter<Game>,
    options: GameOptions,
}

impl AntsEnv {
    pub fn new(
        options: GameOptions,
        opponents: Box<dyn OpponentStrategy>,
    ) -> Result<AntsEnv, AntsError> {
        let game = Game::new(&options)?;

        Ok(AntsEnv {
            adapter: TurnAdapter::new(game, opponents),
            options,
        })
    }

    /// Creates the environment from command line arguments, the first one
    /// being the program name.
    pub fn from_args<I, T>(args: I) -> Result<AntsEnv, AntsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let options = Options::try_parse_from(args)?;
        let game_options = GameOptions::from_options(&options)?;
        tracing::debug!(map = ?options.map, opponents = ?options.opponents, "creating environment");

        let opponents: Box<dyn OpponentStrategy> = match options.opponents {
            OpponentKind::Passive => Box::new(Passive),
            OpponentKind::Random => Box::new(RandomOpponent::from_seed(game_options.player_seed)),
        };

        AntsEnv::new(game_options, opponents)
    }

    pub fn adapter(&self) -> &TurnAdapter<Game> {
        &self.adapter
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    /// Writes the agent's view of the board, with colors, to `out`.
    pub fn render_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let game = self.adapter.engine();
        execute!(
            out,
            Print("Turn: "),
            Print(game.turn().to_string()),
            Print(", Ants = "),
            Print(game.player_ants(0).len().to_string()),
            Print(", Pending = "),
            Print(self.adapter.pending().len().to_string()),
            Print("\n\n")
        )?;

        for row in self.adapter.get_observation().rows() {
            for cell in row {
                execute!(
                    out,
                    SetForegroundColor(cell_color(*cell)),
                    Print(cell_char(*cell)),
                    SetForegroundColor(Color::Reset)
                )?;
            }
            execute!(out, Print("\n"))?;
        }

        out.flush()
    }

    fn ansi(&self) -> String {
        self.adapter
            .get_observation()
            .rows()
            .map(|row| row.iter().map(|cell| cell_char(*cell)).collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn info(&self, turn_completed: bool, rejected: Option<String>) -> StepInfo {
        StepInfo {
            turn: self.adapter.engine().turn(),
            pending_moves: self.adapter.pending().len(),
            turn_completed,
            rejected,
        }
    }
}

impl Environment for AntsEnv {
    type Observation = Observation;
    type Action = Order;

    fn reset(&mut self) -> Observation {
        self.adapter.reset();
        self.adapter.get_observation()
    }

    fn step(&mut self, action: Order) -> StepResult<Observation> {
        let (reward, info) = match self.adapter.submit_move(action.location(), action.direction) {
            Ok(submission) => {
                let turn_completed = matches!(submission, Submission::TurnCompleted(_));
                (MOVE_REWARD, self.info(turn_completed, None))
            }
            Err(rejection) => (
                INVALID_MOVE_REWARD,
                self.info(false, Some(rejection.to_string())),
            ),
        };

        StepResult {
            observation: self.adapter.get_observation(),
            reward,
            done: self.adapter.is_episode_over(),
            info,
        }
    }

    fn render(&self, mode: RenderMode) -> Result<Option<String>, AntsError> {
        match mode {
            RenderMode::Human => {
                let mut stdout = stdout();
                execute!(stdout, Clear(ClearType::All), Hide)?;
                self.render_to(&mut stdout)?;
                Ok(None)
            }
            RenderMode::Ansi => Ok(Some(self.ansi())),
        }
    }

    fn observation_space(&self) -> SpaceInfo {
        let game = self.adapter.engine();
        SpaceInfo {
            shape: vec![game.height(), game.width()],
            values: CellState::COUNT,
        }
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo {
            shape: vec![],
            values: Direction::ALL.len(),
        }
    }
}

#[pymethods]
impl AntsEnv {
    /// Creates the environment from a command line, e.g. `["ants", "-m", "tutorial.map"]`.
    #[new]
    fn py_new(argv: Vec<String>) -> PyResult<AntsEnv> {
        Ok(AntsEnv::from_args(argv)?)
    }

    /// Moves the agent's ant at (`row`, `col`) and returns `(observation, reward, done, info)`.
    #[pyo3(name = "step")]
    fn py_step(
        &mut self,
        row: usize,
        col: usize,
        direction: Direction,
    ) -> (Vec<Vec<u8>>, f32, bool, StepInfo) {
        let result = self.step(Order::new(row, col, direction));
        (
            result.observation.to_codes(),
            result.reward,
            result.done,
            result.info,
        )
    }

    #[pyo3(name = "reset")]
    fn py_reset(&mut self) -> Vec<Vec<u8>> {
        self.reset().to_codes()
    }

    #[pyo3(name = "render", signature = (mode = "human"))]
    fn py_render(&self, mode: &str) -> PyResult<Option<String>> {
        Ok(self.render(mode.parse()?)?)
    }

    fn observation(&self) -> Vec<Vec<u8>> {
        self.adapter.get_observation().to_codes()
    }

    fn is_episode_over(&self) -> bool {
        self.adapter.is_episode_over()
    }

    #[getter(observation_space)]
    fn py_observation_space(&self) -> Vec<usize> {
        self.observation_space().shape
    }

    #[getter(action_space)]
    fn py_action_space(&self) -> Vec<char> {
        Direction::ALL.iter().map(|direction| direction.as_char()).collect()
    }

    fn options_json(&self) -> PyResult<String> {
        self.options
            .to_json()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

fn cell_char(cell: CellState) -> char {
    match cell {
        CellState::Water => '%',
        CellState::Land => '.',
        CellState::Hill => '0',
        CellState::EnemyHill => '1',
        CellState::AntsNotMoved => 'a',
        CellState::AntsMoved => 'm',
        CellState::Enemy => 'b',
        CellState::Food => '*',
        CellState::Unseen => '?',
    }
}

fn cell_color(cell: CellState) -> Color {
    match cell {
        CellState::Water => Color::DarkBlue,
        CellState::Land => Color::Reset,
        CellState::Hill | CellState::AntsNotMoved => player_to_color(0),
        CellState::AntsMoved => Color::DarkRed,
        CellState::EnemyHill | CellState::Enemy => player_to_color(1),
        CellState::Food => Color::Grey,
        CellState::Unseen => Color::DarkGrey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn env(map: &str) -> AntsEnv {
        AntsEnv::new(GameOptions::new(map), Box::new(Passive)).unwrap()
    }

    fn two_ants() -> AntsEnv {
        env("\
            rows 3
            cols 4
            players 2
            m 0...
            m 0..1
            m ....")
    }

    #[test]
    fn when_creating_an_environment_with_a_malformed_map_an_error_is_returned() {
        let result = AntsEnv::new(GameOptions::new("rows 2"), Box::new(Passive));

        assert!(matches!(result, Err(AntsError::Map(_))));
    }

    #[test]
    fn when_creating_an_environment_from_arguments_the_map_file_is_loaded() {
        let map = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_data/tutorial.map");
        let map = map.to_string_lossy().to_string();

        let env = AntsEnv::from_args(["ants", "-m", map.as_str(), "--opponents", "random"]).unwrap();

        assert_eq!(env.observation_space().shape, vec![8, 10]);
        assert_eq!(env.adapter().engine().player_ants(0), vec![(1, 1)]);
    }

    #[test]
    fn when_creating_an_environment_without_a_map_file_an_error_is_returned() {
        let result = AntsEnv::from_args(["ants"]);

        assert!(matches!(result, Err(AntsError::Options(_))));
    }

    #[test]
    fn when_stepping_with_a_valid_move_the_reward_is_zero() {
        let mut env = two_ants();

        let result = env.step(Order::new(0, 0, Direction::East));

        assert_eq!(result.reward, MOVE_REWARD);
        assert!(!result.done);
        assert_eq!(
            result.info,
            StepInfo {
                turn: 0,
                pending_moves: 1,
                turn_completed: false,
                rejected: None
            }
        );
        assert_eq!(result.observation.get(0, 0), Some(CellState::AntsMoved));
    }

    #[test]
    fn when_stepping_with_an_invalid_move_the_reward_is_negative_and_the_reason_given() {
        let mut env = two_ants();

        let result = env.step(Order::new(2, 2, Direction::East));

        assert_eq!(result.reward, INVALID_MOVE_REWARD);
        assert_eq!(result.info.pending_moves, 0);
        assert_eq!(
            result.info.rejected.as_deref(),
            Some("no unmoved ant of the agent at (2, 2)")
        );
    }

    #[test]
    fn when_every_ant_has_moved_the_turn_completes() {
        let mut env = two_ants();

        env.step(Order::new(0, 0, Direction::East));
        let result = env.step(Order::new(1, 0, Direction::South));

        assert!(result.info.turn_completed);
        assert_eq!(result.info.turn, 1);
        assert_eq!(result.info.pending_moves, 0);
        assert_eq!(result.observation.get(0, 1), Some(CellState::AntsNotMoved));
        assert_eq!(result.observation.get(2, 0), Some(CellState::AntsNotMoved));
    }

    #[test]
    fn when_the_agent_loses_its_ants_the_step_is_done() {
        let mut env = env("\
            rows 1
            cols 4
            players 2
            m a..b");

        assert!(!env.step(Order::new(0, 0, Direction::East)).done);
        assert!(!env.step(Order::new(0, 1, Direction::East)).done);
        let result = env.step(Order::new(0, 2, Direction::East));

        assert!(result.done);
        assert_eq!(result.info.turn, 3);
        assert_eq!(
            env.step(Order::new(0, 3, Direction::East)).info.rejected.as_deref(),
            Some("the episode is over")
        );
    }

    #[test]
    fn when_resetting_the_initial_observation_is_returned() {
        let mut env = two_ants();
        let initial = env.adapter().get_observation();
        env.step(Order::new(0, 0, Direction::East));
        env.step(Order::new(1, 0, Direction::South));

        let observation = env.reset();

        assert_eq!(observation, initial);
        assert_eq!(env.adapter().engine().turn(), 0);
    }

    #[test]
    fn when_getting_the_spaces_they_match_the_map_and_directions() {
        let env = two_ants();

        assert_eq!(
            env.observation_space(),
            SpaceInfo {
                shape: vec![3, 4],
                values: 9
            }
        );
        assert_eq!(
            env.action_space(),
            SpaceInfo {
                shape: vec![],
                values: 4
            }
        );
    }

    #[test]
    fn when_rendering_as_ansi_the_board_is_returned_as_text() {
        let mut env = two_ants();
        env.step(Order::new(0, 0, Direction::East));

        let text = env.render(RenderMode::Ansi).unwrap().unwrap();

        assert_eq!(text, "m...\na..b\n....");
    }

    #[test]
    fn when_rendering_to_a_writer_the_header_and_board_are_written() {
        let env = two_ants();
        let mut out = Vec::new();

        env.render_to(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Turn: 0, Ants = 2, Pending = 0"));
        assert!(text.contains('a'));
    }

    #[test]
    fn when_parsing_an_unknown_render_mode_an_error_is_returned() {
        assert_eq!("ansi".parse::<RenderMode>().unwrap(), RenderMode::Ansi);
        assert!(matches!(
            "rgb_array".parse::<RenderMode>(),
            Err(AntsError::UnknownRenderMode(mode)) if mode == "rgb_array"
        ));
    }
}

use crate::error::AntsError;
use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Command line surface of the environment.
///
/// The number of players is determined by the map file.
#[derive(Clone, Debug, Parser)]
#[command(name = "ants", about = "Ants environment for a single reinforcement learning agent")]
pub struct Options {
    /// Name of the map file
    #[arg(short = 'm', long = "map_file")]
    pub map: PathBuf,

    /// Number of turns in the game
    #[arg(short = 't', long, default_value_t = 1000)]
    pub turns: u32,

    /// Run bots in serial, instead of parallel
    #[arg(long)]
    pub serial: bool,

    /// Amount of time to give each bot, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub turntime: u32,

    /// Amount of time to give for load, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub loadtime: u32,

    /// Number of rounds to play
    #[arg(short = 'r', long, default_value_t = 1)]
    pub rounds: u32,

    /// Player seed for the random number generator
    #[arg(long = "player_seed")]
    pub player_seed: Option<u64>,

    /// Engine seed for the random number generator
    #[arg(long = "engine_seed")]
    pub engine_seed: Option<u64>,

    /// Strict mode enforces valid moves for bots
    #[arg(long)]
    pub strict: bool,

    /// Capture errors and stderr in game result
    #[arg(long = "capture_errors")]
    pub capture_errors: bool,

    /// Seconds to wait at end for bots to process end
    #[arg(long = "end_wait", default_value_t = 0.0)]
    pub end_wait: f64,

    /// Use the secure jail for each bot (*nix only)
    #[arg(long = "secure_jail")]
    pub secure_jail: bool,

    /// Fill up extra player starts with last bot specified
    #[arg(long)]
    pub fill: bool,

    /// Player position for first bot specified
    #[arg(short = 'p', long, default_value_t = 0)]
    pub position: usize,

    /// Strategy used by the players the agent plays against
    #[arg(long, value_enum, default_value_t = OpponentKind::Passive)]
    pub opponents: OpponentKind,

    #[command(flatten)]
    pub game: GameArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Options that affect the game mechanics for ants.
#[derive(Clone, Debug, Args)]
#[command(next_help_heading = "Game Options")]
pub struct GameArgs {
    /// Attack method to use for engine
    #[arg(long, value_enum, default_value_t = AttackMethod::Focus)]
    pub attack: AttackMethod,

    /// Points awarded for killing a hill
    #[arg(long = "kill_points", default_value_t = 2)]
    pub kill_points: u32,

    /// Food spawning method
    #[arg(long, value_enum, default_value_t = FoodMethod::Symmetric)]
    pub food: FoodMethod,

    /// Vision radius of ants squared
    #[arg(long, default_value_t = 77)]
    pub viewradius2: u32,

    /// Spawn radius of ants squared
    #[arg(long, default_value_t = 1)]
    pub spawnradius2: u32,

    /// Attack radius of ants squared
    #[arg(long, default_value_t = 5)]
    pub attackradius2: u32,

    /// Numerator of food per turn per player rate
    #[arg(long = "food_rate", num_args = 2, default_values_t = [5, 11])]
    pub food_rate: Vec<u32>,

    /// Denominator of food per turn per player rate
    #[arg(long = "food_turn", num_args = 2, default_values_t = [19, 37])]
    pub food_turn: Vec<u32>,

    /// One over percentage of land area filled with food at start
    #[arg(long = "food_start", num_args = 2, default_values_t = [75, 175])]
    pub food_start: Vec<u32>,

    /// Amount of food guaranteed to be visible to starting ants
    #[arg(long = "food_visible", num_args = 2, default_values_t = [3, 5])]
    pub food_visible: Vec<u32>,

    /// Number of turns cutoff percentage is maintained to end game early
    #[arg(long = "cutoff_turn", default_value_t = 150)]
    pub cutoff_turn: u32,

    /// Share of food on the map that ends the game early
    #[arg(long = "cutoff_percent", default_value_t = 0.85)]
    pub cutoff_percent: f64,

    #[arg(long)]
    pub scenario: bool,
}

/// Options that control the logging.
#[derive(Clone, Debug, Args)]
#[command(next_help_heading = "Logging Options")]
pub struct LoggingArgs {
    /// Game id to start at when numbering log files
    #[arg(short = 'g', long = "game", default_value_t = 0)]
    pub game_id: u32,

    /// Directory to dump replay files to
    #[arg(short = 'l', long = "log_dir")]
    pub log_dir: Option<PathBuf>,

    #[arg(short = 'R', long = "log_replay")]
    pub log_replay: bool,

    #[arg(short = 'S', long = "log_stream")]
    pub log_stream: bool,

    /// Log input streams sent to bots
    #[arg(short = 'I', long = "log_input")]
    pub log_input: bool,

    /// Log output streams from bots
    #[arg(short = 'O', long = "log_output")]
    pub log_output: bool,

    /// Log error streams from bots
    #[arg(short = 'E', long = "log_error")]
    pub log_error: bool,

    /// Additionally log bot errors to stderr
    #[arg(short = 'e', long = "log_stderr")]
    pub log_stderr: bool,

    /// Additionally log replay/stream to stdout
    #[arg(short = 'o', long = "log_stdout")]
    pub log_stdout: bool,

    /// Print out status as game goes
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[arg(long)]
    pub profile: bool,

    /// Prevent visualizer from launching
    #[arg(long)]
    pub nolaunch: bool,

    /// Output file name for an html replay
    #[arg(long = "html")]
    pub html_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OpponentKind {
    /// Opponents never move
    Passive,
    /// Opponents move every ant in a random direction
    Random,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AttackMethod {
    Closest,
    Focus,
    Support,
    Damage,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FoodMethod {
    None,
    Random,
    Sections,
    Symmetric,
}

/// The options a game is built from, with the map file replaced by its contents.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameOptions {
    pub map: String,
    pub attack: AttackMethod,
    pub kill_points: u32,
    pub food: FoodMethod,
    pub viewradius2: u32,
    pub attackradius2: u32,
    pub spawnradius2: u32,
    pub loadtime: u32,
    pub turntime: u32,
    pub turns: u32,
    pub food_rate: (u32, u32),
    pub food_turn: (u32, u32),
    pub food_start: (u32, u32),
    pub food_visible: (u32, u32),
    pub cutoff_turn: u32,
    pub cutoff_percent: f64,
    pub scenario: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_seed: Option<u64>,
}

impl GameOptions {
    /// Game options with the default values of the command line and the given map.
    pub fn new(map: &str) -> GameOptions {
        GameOptions {
            map: map.to_string(),
            attack: AttackMethod::Focus,
            kill_points: 2,
            food: FoodMethod::Symmetric,
            viewradius2: 77,
            attackradius2: 5,
            spawnradius2: 1,
            loadtime: 3000,
            turntime: 1000,
            turns: 1000,
            food_rate: (5, 11),
            food_turn: (19, 37),
            food_start: (75, 175),
            food_visible: (3, 5),
            cutoff_turn: 150,
            cutoff_percent: 0.85,
            scenario: false,
            player_seed: None,
            engine_seed: None,
        }
    }

    /// Builds the game options from the command line, reading the map file.
    pub fn from_options(options: &Options) -> Result<GameOptions, AntsError> {
        let map = fs::read_to_string(&options.map).map_err(|source| AntsError::ReadMap {
            path: options.map.clone(),
            source,
        })?;
        let game = &options.game;
        let defaults = GameOptions::new("");

        Ok(GameOptions {
            map,
            attack: game.attack,
            kill_points: game.kill_points,
            food: game.food,
            viewradius2: game.viewradius2,
            attackradius2: game.attackradius2,
            spawnradius2: game.spawnradius2,
            loadtime: options.loadtime,
            turntime: options.turntime,
            turns: options.turns,
            food_rate: pair(&game.food_rate).unwrap_or(defaults.food_rate),
            food_turn: pair(&game.food_turn).unwrap_or(defaults.food_turn),
            food_start: pair(&game.food_start).unwrap_or(defaults.food_start),
            food_visible: pair(&game.food_visible).unwrap_or(defaults.food_visible),
            cutoff_turn: game.cutoff_turn,
            cutoff_percent: game.cutoff_percent,
            scenario: game.scenario,
            player_seed: options.player_seed,
            engine_seed: options.engine_seed,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn pair(values: &[u32]) -> Option<(u32, u32)> {
    match values {
        [first, second] => Some((*first, *second)),
        _ => None,
    }
}

//! # gym_ants
//!
//! The Ants game as a reinforcement learning environment.
//! The agent moves one ant per step; a game turn is played once every ant of
//! the agent has moved.

pub mod adapter;
pub mod engine;
pub mod env;
pub mod error;
pub mod opponent;
pub mod options;
pub use adapter::{InvalidMove, Observation, Submission, TurnAdapter};
pub use engine::{AntsEngine, CellState, Direction, Game, Location, Order};
pub use env::{AntsEnv, Environment, RenderMode, StepInfo, StepResult};
pub use error::AntsError;
pub use map::MapError;

mod entities;
mod map;

use pyo3::prelude::*;

#[pymodule]
fn gym_ants(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<AntsEnv>()?;
    m.add_class::<Direction>()?;
    m.add_class::<StepInfo>()?;
    Ok(())
}

#![warn(clippy::all, missing_docs)]

//! Core engine for the Macro Data Refinement selection game.
//!
//! This crate hosts the tile pool, rectangle selection, bin scoring and
//! round lifecycle, plus the configuration layer shared by the terminal UI
//! and any future frontends. Everything here is single-threaded and driven
//! by explicit calls; no platform timers are involved.

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod pool;
pub mod scheduler;
pub mod scoring;
pub mod selection;
pub mod snapshot;

pub use config::{AppConfig, GameConfig, Language};
pub use engine::{DepositReceipt, SelectionGame};
pub use error::{ConfigError, GameError};
pub use geometry::{BoundingBox, Point};
pub use layout::{OrbitLayout, StaticLayout, TileLayout};
pub use pool::{Tile, TileId};
pub use scoring::{Outcome, TerminationMode};
pub use selection::SelectionStart;
pub use snapshot::{BinView, GameSnapshot, TileView};

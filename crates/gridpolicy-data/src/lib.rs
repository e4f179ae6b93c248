//! Data-driven game definitions for gridpolicy.
//!
//! A game is described in one `game.{ron,toml,json}` file: demand, the
//! starting plants, the policy catalogue and the shock pool. [`load_game_config`]
//! finds the file, deserializes it with the matching format, resolves its
//! tags and returns a validated core `GameConfig`.

pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::{DataLoadError, Format, load_game_config, load_game_file};

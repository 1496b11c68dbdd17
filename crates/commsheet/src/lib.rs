//! `commsheet` - An offline comm-sheet engine for pilots
//!
//! This library expands a flight route into an ordered script of radio
//! phraseology by combining a bundled master call library with layered user
//! customizations (text/type/sequence overrides, user-added calls,
//! permanent hides, user-defined blocks, block-level overrides), and keeps
//! that script consistent under interactive reordering with undo/redo.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod blocks;
pub mod call;
pub mod callsign;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod reorder;
pub mod route;
pub mod sheet;
pub mod store;
pub mod taxi;

pub use blocks::BlockType;
pub use call::{CallKind, ContextTag, FlightRules};
pub use config::Config;
pub use engine::{Engine, Generation};
pub use error::{Error, Result};
pub use history::History;
pub use logging::init_logging;
pub use reorder::Position;
pub use route::Route;
pub use sheet::Sheet;
pub use store::{LibraryBundle, Store};

//! Procedural room layout. Rooms are stamped out of a catalog at random spots, pushed apart until
//! none overlap ("explode"), then pulled together toward a random center ("condense").
//!
//! Everything random is driven by a single seed string, so the same inputs always produce the same
//! layout.

#[macro_use]
extern crate derivative;

pub mod condense;
pub mod error;
pub mod explode;
pub mod generator;
pub mod geometry;
pub mod render;
pub mod room;
pub mod settings;

pub use condense::{CompactionState, Compactor, IterationReport};
pub use error::LayoutError;
pub use explode::OverlapResolver;
pub use generator::{generate, hash_str, Layout, LayoutArgs, LayoutGenerator};
pub use geometry::{Point, Rect, RectKey};
pub use render::{NoopRenderHook, Phase, RenderHook};
pub use room::{CatalogEntry, Room, RoomCollection, RoomColor, RoomConnection, RoomId};
pub use settings::LayoutSettings;

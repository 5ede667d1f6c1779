use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::room::RoomCollection;

/// Which half of layout generation is running.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Random separation of overlapping rooms.
    Explode,
    /// Pulling rooms toward the layout center.
    Condense,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Explode => "explode",
            Phase::Condense => "condense",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RenderHook observes a layout while it is being generated. It is called once at the start of every
/// explode sweep and every condense iteration, before that round moves anything, with an iteration
/// index that restarts at zero for each phase.
///
/// Hooks only ever see the rooms by shared reference and nothing they return is consumed, so a hook
/// cannot change the outcome of a run.
pub trait RenderHook {
    fn render(&mut self, rooms: &RoomCollection, phase: Phase, iteration: u64);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRenderHook;

impl RenderHook for NoopRenderHook {
    fn render(&mut self, _rooms: &RoomCollection, _phase: Phase, _iteration: u64) {}
}

impl<F> RenderHook for F
where
    F: FnMut(&RoomCollection, Phase, u64),
{
    fn render(&mut self, rooms: &RoomCollection, phase: Phase, iteration: u64) {
        self(rooms, phase, iteration)
    }
}

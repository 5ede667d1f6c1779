use rand::Rng;
use tracing::{debug, trace, warn};

use crate::error::LayoutError;
use crate::render::{Phase, RenderHook};
use crate::room::{RoomCollection, RoomId};
use crate::settings::LayoutSettings;

/// OverlapResolver pushes overlapping rooms apart with random, equal and opposite displacements
/// until no two rooms overlap. Sweeps repeat until one finds nothing to separate.
///
/// The largest allowed displacement starts at max(room count, initial floor) and shrinks by one per
/// sweep, but never below the displacement floor, so rooms stuck deep inside a cluster keep a
/// chance of jumping clear late in the run.
#[derive(Clone, Debug)]
pub struct OverlapResolver {
    max_displacement: i32,
    displacement_floor: i32,
    max_sweeps: Option<u64>,
}

impl OverlapResolver {
    pub fn new(room_count: usize, settings: &LayoutSettings) -> Self {
        let room_count = i32::try_from(room_count).unwrap_or(i32::MAX);
        Self {
            max_displacement: room_count.max(settings.initial_displacement_floor),
            displacement_floor: settings.displacement_floor,
            max_sweeps: settings.max_explode_sweeps,
        }
    }

    pub fn max_displacement(&self) -> i32 {
        self.max_displacement
    }

    /// Run sweeps until the collection is overlap free. Returns the number of sweeps performed,
    /// including the final one that found nothing.
    pub fn resolve<R, H>(&mut self, rooms: &mut RoomCollection, rng: &mut R, hook: &mut H) -> Result<u64, LayoutError>
    where
        R: Rng + ?Sized,
        H: RenderHook + ?Sized,
    {
        if rooms.is_empty() {
            return Ok(0);
        }
        let ids = rooms.ids();
        let mut sweep: u64 = 0;
        loop {
            if let Some(max_sweeps) = self.max_sweeps {
                if sweep >= max_sweeps {
                    warn!(sweeps = sweep, "explode phase hit its sweep cap with rooms still overlapping");
                    return Err(LayoutError::ConvergenceTimeout {
                        phase: Phase::Explode,
                        iterations: sweep,
                    });
                }
            }
            hook.render(rooms, Phase::Explode, sweep);
            let separated = self.sweep(rooms, &ids, rng);
            sweep += 1;
            trace!(
                sweep,
                separated,
                max_displacement = self.max_displacement,
                "explode sweep finished"
            );
            if separated == 0 {
                debug!(sweeps = sweep, rooms = rooms.len(), "explode phase converged");
                return Ok(sweep);
            }
            self.cool();
        }
    }

    /// One pass over all rooms. Each room is separated from at most one partner, the first one
    /// found overlapping it. Returns how many separations happened.
    pub fn sweep<R>(&self, rooms: &mut RoomCollection, ids: &[RoomId], rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut separated = 0;
        for &id in ids {
            let rect = match rooms.rect(id) {
                Some(rect) => rect,
                None => continue,
            };
            let partner = ids
                .iter()
                .copied()
                .filter(|other_id| *other_id != id)
                .find(|other_id| rooms.rect(*other_id).map_or(false, |other| rect.overlaps(&other)));
            if let Some(other_id) = partner {
                let bound = self.max_displacement;
                let dx = rng.gen_range(-bound..=bound);
                let dy = rng.gen_range(-bound..=bound);
                rooms.translate(id, dx, dy);
                rooms.translate(other_id, -dx, -dy);
                separated += 1;
            }
        }
        separated
    }

    fn cool(&mut self) {
        if self.max_displacement > self.displacement_floor {
            self.max_displacement -= 1;
        }
    }
}

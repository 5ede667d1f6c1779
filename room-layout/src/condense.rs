use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::error::LayoutError;
use crate::geometry::{Point, Rect, RectKey};
use crate::render::{Phase, RenderHook};
use crate::room::{RoomCollection, RoomId};

/// Bookkeeping for one compaction run. Nothing here outlives the [`Compactor`] that owns it.
#[derive(Clone, Debug, Default)]
pub struct CompactionState {
    blocked_x: HashMap<RoomId, RoomId>,
    blocked_y: HashMap<RoomId, RoomId>,
    visited: HashMap<RoomId, HashSet<RectKey>>,
}

impl CompactionState {
    pub fn blocked_x(&self, id: RoomId) -> Option<RoomId> {
        self.blocked_x.get(&id).copied()
    }

    pub fn blocked_y(&self, id: RoomId) -> Option<RoomId> {
        self.blocked_y.get(&id).copied()
    }

    pub fn has_visited(&self, id: RoomId, key: RectKey) -> bool {
        self.visited.get(&id).map_or(false, |keys| keys.contains(&key))
    }

    fn is_fully_blocked(&self, id: RoomId) -> bool {
        self.blocked_x.contains_key(&id) && self.blocked_y.contains_key(&id)
    }

    /// Returns false if the room has been here before.
    fn visit(&mut self, id: RoomId, key: RectKey) -> bool {
        self.visited.entry(id).or_default().insert(key)
    }

    /// `mover` has changed position, so anything it was blocking may be free again.
    fn release(&mut self, mover: RoomId) {
        self.blocked_x.retain(|_, blocker| *blocker != mover);
        self.blocked_y.retain(|_, blocker| *blocker != mover);
    }
}

/// What happened to the rooms during one compaction iteration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IterationReport {
    /// Rooms that could not make progress, including rooms that moved back into a position they
    /// had already occupied.
    pub stuck: usize,
    /// Rooms whose position changed.
    pub moved: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Advance {
    Stuck,
    Moved,
    Revisited,
}

/// Compactor pulls every room one unit per axis per iteration toward a common center. A room only
/// moves into a free position; when its diagonal step is blocked it slides along whichever axis is
/// still open. The run ends at the first iteration in which every room is stuck, either blocked on
/// both axes or oscillating between positions it has already visited.
#[derive(Clone, Debug)]
pub struct Compactor {
    center: Point,
    max_iterations: Option<u64>,
    state: CompactionState,
    last_report: Option<IterationReport>,
}

impl Compactor {
    pub fn new(center: Point, max_iterations: Option<u64>) -> Self {
        Self {
            center,
            max_iterations,
            state: CompactionState::default(),
            last_report: None,
        }
    }

    pub fn state(&self) -> &CompactionState {
        &self.state
    }

    /// Report of the most recent iteration. After a successful run every room is counted stuck in
    /// it.
    ///
    /// That is not a fixed point in the strict sense: a room stuck by revisiting still moves, and
    /// its move releases any room it was blocking, so a further [`Compactor::step`] can find a room
    /// free to move again.
    pub fn last_report(&self) -> Option<IterationReport> {
        self.last_report
    }

    /// Iterate until every room is stuck. Returns the number of iterations this call performed.
    pub fn run<H>(&mut self, rooms: &mut RoomCollection, hook: &mut H) -> Result<u64, LayoutError>
    where
        H: RenderHook + ?Sized,
    {
        if rooms.is_empty() {
            return Ok(0);
        }
        let mut performed: u64 = 0;
        loop {
            if let Some(max_iterations) = self.max_iterations {
                if performed >= max_iterations {
                    warn!(iterations = performed, "condense phase hit its iteration cap");
                    return Err(LayoutError::ConvergenceTimeout {
                        phase: Phase::Condense,
                        iterations: performed,
                    });
                }
            }
            hook.render(rooms, Phase::Condense, performed);
            let report = self.step(rooms);
            performed += 1;
            trace!(
                iteration = performed,
                stuck = report.stuck,
                moved = report.moved,
                "condense iteration finished"
            );
            if report.stuck == rooms.len() {
                debug!(
                    iterations = performed,
                    center_x = self.center.x,
                    center_y = self.center.y,
                    "condense phase converged"
                );
                return Ok(performed);
            }
        }
    }

    /// One iteration over every room in collection order. Rooms see the positions of rooms that
    /// already moved earlier in the same iteration.
    pub fn step(&mut self, rooms: &mut RoomCollection) -> IterationReport {
        let ids = rooms.ids();
        let mut report = IterationReport::default();
        for &id in &ids {
            match self.advance(rooms, &ids, id) {
                Advance::Stuck => report.stuck += 1,
                Advance::Moved => report.moved += 1,
                Advance::Revisited => {
                    report.stuck += 1;
                    report.moved += 1;
                }
            }
        }
        self.last_report = Some(report);
        report
    }

    fn advance(&mut self, rooms: &mut RoomCollection, ids: &[RoomId], id: RoomId) -> Advance {
        if self.state.is_fully_blocked(id) {
            return Advance::Stuck;
        }
        let rect = match rooms.rect(id) {
            Some(rect) => rect,
            None => return Advance::Stuck,
        };
        let (step_x, step_y) = self.step_towards_center(&rect);
        let move_full = rect.moved_by(step_x, step_y);
        let mut move_x = Some(rect.moved_by(step_x, 0));
        let mut move_y = Some(rect.moved_by(0, step_y));
        let mut diagonal_clear = true;

        for &other_id in ids {
            if other_id == id {
                continue;
            }
            let other = match rooms.rect(other_id) {
                Some(other) => other,
                None => continue,
            };
            // An axis keeps the first room found blocking it.
            if move_y.map_or(false, |candidate| candidate.overlaps(&other)) {
                move_y = None;
                self.state.blocked_y.insert(id, other_id);
            }
            if move_x.map_or(false, |candidate| candidate.overlaps(&other)) {
                move_x = None;
                self.state.blocked_x.insert(id, other_id);
            }
            if move_x.is_none() && move_y.is_none() {
                return Advance::Stuck;
            }
            if diagonal_clear && move_full.overlaps(&other) {
                diagonal_clear = false;
            }
        }

        // Both single-axis steps can be free while the diagonal one clips a corner.
        let next: Rect = match (move_x, move_y) {
            (Some(_), Some(_)) if diagonal_clear => move_full,
            (Some(slide_x), _) => slide_x,
            (None, Some(slide_y)) => slide_y,
            (None, None) => return Advance::Stuck,
        };
        rooms.translate(id, next.x() - rect.x(), next.y() - rect.y());
        self.state.release(id);
        if self.state.visit(id, next.key()) {
            Advance::Moved
        } else {
            Advance::Revisited
        }
    }

    /// Unit step per axis toward the center. Never zero: a room whose center already sits on the
    /// target steps down/left and is caught by the revisit check on its way back.
    fn step_towards_center(&self, rect: &Rect) -> (i32, i32) {
        let (center_x, center_y) = rect.center_doubled();
        let step = |target: i32, doubled: i64| if 2 * i64::from(target) > doubled { 1 } else { -1 };
        (step(self.center.x, center_x), step(self.center.y, center_y))
    }
}

#[cfg(test)]
mod compactor_tests {
    use super::*;
    use crate::render::NoopRenderHook;
    use crate::room::Room;

    fn collection(rooms: Vec<Room>) -> RoomCollection {
        rooms.into_iter().collect()
    }

    #[test]
    pub fn lone_room_walks_to_the_center_and_stops_by_revisiting() {
        // === given ===
        let mut rooms = collection(vec![Room::new(0, 10, 5, 2, 2)]);
        let mut compactor = Compactor::new(Point::new(0, 0), None);

        // === when ===
        let iterations = compactor.run(&mut rooms, &mut NoopRenderHook).unwrap();

        // === then ===
        // Center starts at (11, 6); diagonal steps reach y = 0 first, then x slides in.
        let rect = rooms.rect(0).unwrap();
        let (center_x, center_y) = rect.center_doubled();
        assert!(center_x.abs() <= 2, "x center {} should sit on the target", center_x);
        assert!(center_y.abs() <= 2, "y center {} should sit on the target", center_y);
        assert!(iterations > 10);

        assert_eq!(compactor.last_report(), Some(IterationReport { stuck: 1, moved: 1 }));

        // One more synthetic iteration finds the room stuck as well.
        let report = compactor.step(&mut rooms);
        assert_eq!(report.stuck, 1);
    }

    #[test]
    pub fn blocked_axis_is_recorded_and_the_room_slides() {
        // === given ===
        // Room 1 sits directly left of room 0, which wants to move left and down. Room 1 is marked
        // as fully blocked so that it holds still.
        let mut rooms = collection(vec![
            Room::new(0, 2, 0, 2, 2),
            Room::new(1, 0, 0, 2, 2),
        ]);
        let mut compactor = Compactor::new(Point::new(-10, -10), None);
        compactor.state.blocked_x.insert(1, 7);
        compactor.state.blocked_y.insert(1, 7);

        // === when ===
        let report = compactor.step(&mut rooms);

        // === then ===
        assert_eq!(compactor.state().blocked_x(0), Some(1));
        assert_eq!(compactor.state().blocked_y(0), None);
        assert_eq!(rooms.rect(0), Some(Rect::new(2, -1, 2, 2)));
        assert_eq!(rooms.rect(1), Some(Rect::new(0, 0, 2, 2)));
        assert!(compactor.state().has_visited(0, RectKey(2, -1, 2, 2)));
        assert_eq!(report, IterationReport { stuck: 1, moved: 1 });
    }

    #[test]
    pub fn moving_blocker_releases_the_rooms_it_blocked() {
        // === given ===
        let mut rooms = collection(vec![
            Room::new(0, 2, 0, 2, 2),
            Room::new(1, 0, 0, 2, 2),
        ]);
        let mut compactor = Compactor::new(Point::new(-10, -10), None);

        // === when ===
        let report = compactor.step(&mut rooms);

        // === then ===
        // Room 0 slid down, then room 1 moved diagonally and cleared room 0's x blocker.
        assert_eq!(rooms.rect(0), Some(Rect::new(2, -1, 2, 2)));
        assert_eq!(rooms.rect(1), Some(Rect::new(-1, -1, 2, 2)));
        assert_eq!(compactor.state().blocked_x(0), None);
        assert_eq!(report, IterationReport { stuck: 0, moved: 2 });
    }

    #[test]
    pub fn diagonal_step_that_clips_a_corner_slides_instead() {
        // === given ===
        // Room 1 touches room 0's top-right corner.
        let mut rooms = collection(vec![
            Room::new(0, 0, 0, 2, 2),
            Room::new(1, 2, 2, 2, 2),
        ]);
        let mut compactor = Compactor::new(Point::new(100, 100), None);

        // === when ===
        compactor.step(&mut rooms);

        // === then ===
        assert_eq!(rooms.rect(0), Some(Rect::new(1, 0, 2, 2)));
        assert!(rooms.overlapping_pairs().is_empty());
    }

    #[test]
    pub fn rooms_pack_against_each_other_without_overlapping() {
        // === given ===
        let mut rooms = collection(vec![
            Room::new(0, -30, -30, 4, 4),
            Room::new(1, 25, -20, 6, 3),
            Room::new(2, 10, 30, 4, 4),
            Room::new(3, -40, 15, 6, 3),
            Room::new(4, 0, 0, 4, 4),
        ]);
        let before: i64 = distance_sum(&rooms, Point::new(3, -2));
        let mut compactor = Compactor::new(Point::new(3, -2), None);

        // === when ===
        let iterations = compactor.run(&mut rooms, &mut NoopRenderHook).unwrap();

        // === then ===
        assert!(iterations > 1);
        assert!(rooms.overlapping_pairs().is_empty());
        assert!(distance_sum(&rooms, Point::new(3, -2)) < before);
        let last = compactor.last_report().unwrap();
        assert_eq!(last.stuck, rooms.len());
    }

    #[test]
    pub fn an_axis_keeps_its_first_blocker() {
        // === given ===
        // Rooms 1 and 2 are stacked to the left of room 0 and both block its x step. Both are marked
        // fully blocked so that neither moves and releases room 0.
        let mut rooms = collection(vec![
            Room::new(0, 4, 0, 2, 2),
            Room::new(1, 2, -1, 2, 2),
            Room::new(2, 2, 1, 2, 2),
        ]);
        let mut compactor = Compactor::new(Point::new(-10, -10), None);
        for blocked in [1, 2] {
            compactor.state.blocked_x.insert(blocked, 7);
            compactor.state.blocked_y.insert(blocked, 7);
        }

        // === when ===
        let report = compactor.step(&mut rooms);

        // === then ===
        assert_eq!(compactor.state().blocked_x(0), Some(1));
        assert_eq!(compactor.state().blocked_y(0), None);
        assert_eq!(rooms.rect(0), Some(Rect::new(4, -1, 2, 2)));
        assert_eq!(report, IterationReport { stuck: 2, moved: 1 });
        assert_eq!(compactor.last_report(), Some(report));
    }

    #[test]
    pub fn fully_blocked_rooms_are_stuck_without_rescanning() {
        // === given ===
        let mut rooms = collection(vec![
            Room::new(0, 0, 0, 2, 2),
            Room::new(1, -2, 0, 2, 2),
            Room::new(2, 0, -2, 2, 2),
            Room::new(3, -2, -2, 2, 2),
        ]);
        let mut compactor = Compactor::new(Point::new(-50, -50), None);
        compactor.state.blocked_x.insert(0, 1);
        compactor.state.blocked_y.insert(0, 2);

        // === when ===
        let before = rooms.rect(0);
        compactor.step(&mut rooms);

        // === then ===
        assert_eq!(rooms.rect(0), before);
    }

    #[test]
    pub fn iteration_cap_surfaces_a_timeout() {
        let mut rooms = collection(vec![Room::new(0, 100, 100, 2, 2)]);
        let mut compactor = Compactor::new(Point::new(0, 0), Some(5));
        let mut seen = vec![];
        let mut hook = |_rooms: &RoomCollection, phase: Phase, iteration: u64| seen.push((phase, iteration));

        let result = compactor.run(&mut rooms, &mut hook);

        assert_eq!(
            result,
            Err(LayoutError::ConvergenceTimeout {
                phase: Phase::Condense,
                iterations: 5
            })
        );
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[4], (Phase::Condense, 4));
        assert_eq!(rooms.rect(0), Some(Rect::new(95, 95, 2, 2)));
    }

    #[test]
    pub fn empty_collection_runs_no_iterations() {
        let mut rooms = RoomCollection::new();
        let mut compactor = Compactor::new(Point::new(0, 0), None);
        assert_eq!(compactor.run(&mut rooms, &mut NoopRenderHook), Ok(0));
    }

    fn distance_sum(rooms: &RoomCollection, center: Point) -> i64 {
        rooms
            .iter()
            .map(|room| {
                let (x, y) = room.rect.center_doubled();
                (x - 2 * i64::from(center.x)).abs() + (y - 2 * i64::from(center.y)).abs()
            })
            .sum()
    }
}

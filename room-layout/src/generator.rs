use blake2::{digest::consts::U32, Blake2b, Digest};
use rand::prelude::SliceRandom;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::info;

use crate::condense::Compactor;
use crate::error::LayoutError;
use crate::explode::OverlapResolver;
use crate::geometry::{Point, Rect};
use crate::render::{NoopRenderHook, RenderHook};
use crate::room::{CatalogEntry, Room, RoomCollection, RoomColor};
use crate::settings::LayoutSettings;

type Blake2b256 = Blake2b<U32>;

/// Any string works as a seed; it is hashed down to the 32 bytes ChaCha20 wants.
pub fn hash_str(input: &str) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(input.as_bytes());
    let seed = hasher.finalize();
    seed.into()
}

pub struct LayoutArgs<'a> {
    pub catalog: &'a [CatalogEntry],
    pub room_count: i64,
    pub seed: &'a str,
    pub bounds: Rect,
    pub settings: LayoutSettings,
}

impl<'a> LayoutArgs<'a> {
    pub fn new(catalog: &'a [CatalogEntry], room_count: i64, seed: &'a str, bounds: Rect) -> Self {
        Self {
            catalog,
            room_count,
            seed,
            bounds,
            settings: LayoutSettings::default(),
        }
    }

    pub fn with_settings(self, settings: LayoutSettings) -> Self {
        Self { settings, ..self }
    }

    /// Reject inputs the layout phases cannot work with. Returns the room count as a usize.
    pub fn validate(&self) -> Result<usize, LayoutError> {
        let room_count = usize::try_from(self.room_count).map_err(|_| LayoutError::InvalidRoomCount(self.room_count))?;
        if !self.bounds.has_positive_area() {
            return Err(LayoutError::InvalidDimension {
                subject: "bounds".into(),
                width: self.bounds.width(),
                height: self.bounds.height(),
            });
        }
        if room_count > 0 && self.catalog.is_empty() {
            return Err(LayoutError::EmptyCatalog {
                room_count: self.room_count,
            });
        }
        if let Some((index, entry)) = self
            .catalog
            .iter()
            .enumerate()
            .find(|(_index, entry)| entry.width <= 0 || entry.height <= 0)
        {
            return Err(LayoutError::InvalidDimension {
                subject: format!("catalog entry {}", index),
                width: entry.width,
                height: entry.height,
            });
        }
        self.settings.validate()?;
        Ok(room_count)
    }
}

/// The outcome of a layout run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    pub rooms: RoomCollection,
    pub center: Point,
    pub explode_sweeps: u64,
    pub condense_iterations: u64,
}

/// LayoutGenerator places `room_count` rooms stamped from the catalog at random spots inside the
/// bounds, explodes them apart until nothing overlaps, then condenses them toward a random center.
///
/// Every random draw comes from one ChaCha20 stream seeded from the seed string, in a fixed order:
/// per room the catalog entry, x, y and colour, then the explode displacements, then the center.
pub struct LayoutGenerator<'a, H = NoopRenderHook>
where
    H: RenderHook,
{
    args: LayoutArgs<'a>,
    hook: H,
}

impl<'a> LayoutGenerator<'a, NoopRenderHook> {
    pub fn new(args: LayoutArgs<'a>) -> Self {
        Self {
            args,
            hook: NoopRenderHook,
        }
    }
}

impl<'a, H> LayoutGenerator<'a, H>
where
    H: RenderHook,
{
    pub fn with_render_hook<H2: RenderHook>(self, hook: H2) -> LayoutGenerator<'a, H2> {
        LayoutGenerator { args: self.args, hook }
    }

    pub fn run(mut self) -> Result<Layout, LayoutError> {
        let room_count = self.args.validate()?;
        let bounds = self.args.bounds;
        let settings = self.args.settings.clone();
        let mut rng = ChaCha20Rng::from_seed(hash_str(self.args.seed));

        let mut rooms = self.place_rooms(room_count, &mut rng)?;
        let explode_sweeps =
            OverlapResolver::new(room_count, &settings).resolve(&mut rooms, &mut rng, &mut self.hook)?;

        let center = random_point_in(&bounds, &mut rng);
        let condense_iterations =
            Compactor::new(center, settings.max_condense_iterations).run(&mut rooms, &mut self.hook)?;

        info!(
            rooms = rooms.len(),
            seed = self.args.seed,
            center_x = center.x,
            center_y = center.y,
            explode_sweeps,
            condense_iterations,
            "layout generated"
        );
        Ok(Layout {
            rooms,
            center,
            explode_sweeps,
            condense_iterations,
        })
    }

    fn place_rooms(&self, room_count: usize, rng: &mut ChaCha20Rng) -> Result<RoomCollection, LayoutError> {
        let mut rooms = RoomCollection::new();
        for id in 0..room_count {
            let entry = self.args.catalog.choose(rng).ok_or(LayoutError::EmptyCatalog {
                room_count: self.args.room_count,
            })?;
            let start = random_point_in(&self.args.bounds, rng);
            let color = RoomColor::random(rng);
            let mut room = Room::new(id, start.x, start.y, entry.width, entry.height).with_color(color);
            room.rect = room.rect.with_overlap_adjust(self.args.settings.overlap_adjust);
            rooms.insert(room);
        }
        Ok(rooms)
    }
}

/// Uniform point inside `bounds`, both edges included.
fn random_point_in<R: Rng + ?Sized>(bounds: &Rect, rng: &mut R) -> Point {
    Point::new(
        rng.gen_range(bounds.x()..=bounds.right()),
        rng.gen_range(bounds.y()..=bounds.top()),
    )
}

/// Lay out `room_count` rooms from `catalog` inside `bounds` with default settings.
pub fn generate(catalog: &[CatalogEntry], room_count: i64, seed: &str, bounds: Rect) -> Result<RoomCollection, LayoutError> {
    LayoutGenerator::new(LayoutArgs::new(catalog, room_count, seed, bounds))
        .run()
        .map(|layout| layout.rooms)
}

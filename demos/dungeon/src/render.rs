use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context};
use room_layout::{Phase, Rect, RenderHook, RoomCollection, RoomColor};
use tracing::{debug, warn};
use usvg::NodeExt;

const PIXELS_PER_UNIT: f64 = 4.0;
const PADDING: i64 = 5;

pub fn frame_file_name(phase: Phase, iteration: u64) -> String {
    format!("{}_{:05}.png", phase, iteration)
}

/// The region of the layout plane a frame shows: the bounds plus every room, padded. Layout y grows
/// upward and pixel y grows downward, so projection flips it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Canvas {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl Canvas {
    pub fn covering(bounds: &Rect, rooms: &RoomCollection) -> Self {
        let mut canvas = Canvas::around(bounds);
        for room in rooms.iter() {
            let around = Canvas::around(&room.rect);
            canvas.min_x = canvas.min_x.min(around.min_x);
            canvas.min_y = canvas.min_y.min(around.min_y);
            canvas.max_x = canvas.max_x.max(around.max_x);
            canvas.max_y = canvas.max_y.max(around.max_y);
        }
        canvas.min_x -= PADDING;
        canvas.min_y -= PADDING;
        canvas.max_x += PADDING;
        canvas.max_y += PADDING;
        canvas
    }

    fn around(rect: &Rect) -> Self {
        Canvas {
            min_x: i64::from(rect.x()),
            min_y: i64::from(rect.y()),
            max_x: i64::from(rect.x()) + i64::from(rect.width()),
            max_y: i64::from(rect.y()) + i64::from(rect.height()),
        }
    }

    pub fn pixel_width(&self) -> f64 {
        (self.max_x - self.min_x) as f64 * PIXELS_PER_UNIT
    }

    pub fn pixel_height(&self) -> f64 {
        (self.max_y - self.min_y) as f64 * PIXELS_PER_UNIT
    }

    /// Pixel-space (x, y, width, height) of `rect`, top-left origin.
    pub fn project(&self, rect: &Rect) -> (f64, f64, f64, f64) {
        let top = i64::from(rect.y()) + i64::from(rect.height());
        (
            (i64::from(rect.x()) - self.min_x) as f64 * PIXELS_PER_UNIT,
            (self.max_y - top) as f64 * PIXELS_PER_UNIT,
            f64::from(rect.width()) * PIXELS_PER_UNIT,
            f64::from(rect.height()) * PIXELS_PER_UNIT,
        )
    }
}

fn box_path(canvas: &Canvas, rect: &Rect, fill: Option<usvg::Fill>, stroke: Option<usvg::Stroke>) -> Option<usvg::Path> {
    let (x, y, width, height) = canvas.project(rect);
    let rect = usvg::Rect::new(x, y, width, height)?;
    Some(usvg::Path {
        fill,
        stroke,
        data: Rc::new(usvg::PathData::from_rect(rect)),
        ..usvg::Path::default()
    })
}

fn room_fill(color: RoomColor) -> Option<usvg::Fill> {
    Some(usvg::Fill {
        paint: usvg::Paint::Color(usvg::Color::new_rgb(color.r, color.g, color.b)),
        opacity: usvg::Opacity::new(1.0),
        ..usvg::Fill::default()
    })
}

pub fn draw(rooms: &RoomCollection, bounds: &Rect) -> anyhow::Result<tiny_skia::Pixmap> {
    let canvas = Canvas::covering(bounds, rooms);
    let size = usvg::Size::new(canvas.pixel_width(), canvas.pixel_height())
        .ok_or_else(|| anyhow!("canvas has no area"))?;
    let mut rtree = usvg::Tree::create(usvg::Svg {
        size,
        view_box: usvg::ViewBox {
            rect: size.to_rect(0.0, 0.0),
            aspect: usvg::AspectRatio::default(),
        },
    });
    rtree.root().append_kind(usvg::NodeKind::Path(usvg::Path {
        fill: Some(usvg::Fill {
            paint: usvg::Paint::Color(usvg::Color::white()),
            opacity: usvg::Opacity::new(1.0),
            ..usvg::Fill::default()
        }),
        data: Rc::new(usvg::PathData::from_rect(
            usvg::Rect::new(0.0, 0.0, size.width(), size.height()).ok_or_else(|| anyhow!("canvas has no area"))?,
        )),
        ..usvg::Path::default()
    }));

    let bounds_stroke = Some(usvg::Stroke {
        paint: usvg::Paint::Color(usvg::Color::new_rgb(160, 160, 160)),
        opacity: usvg::Opacity::new(1.0),
        ..usvg::Stroke::default()
    });
    if let Some(path) = box_path(&canvas, bounds, None, bounds_stroke) {
        rtree.root().append_kind(usvg::NodeKind::Path(path));
    }

    let room_stroke = Some(usvg::Stroke {
        paint: usvg::Paint::Color(usvg::Color::black()),
        opacity: usvg::Opacity::new(1.0),
        ..usvg::Stroke::default()
    });
    for room in rooms.iter() {
        if let Some(path) = box_path(&canvas, &room.rect, room_fill(room.color), room_stroke.clone()) {
            rtree.root().append_kind(usvg::NodeKind::Path(path));
        }
    }

    let pixmap_size = rtree.svg_node().size.to_screen_size();
    let mut pixmap = tiny_skia::Pixmap::new(pixmap_size.width(), pixmap_size.height())
        .ok_or_else(|| anyhow!("could not allocate a {}x{} pixmap", pixmap_size.width(), pixmap_size.height()))?;
    resvg::render(
        &rtree,
        usvg::FitTo::Original,
        tiny_skia::Transform::default(),
        pixmap.as_mut(),
    )
    .ok_or_else(|| anyhow!("failed to render frame"))?;
    Ok(pixmap)
}

/// Writes one PNG per sampled render call into a directory. A failed write is kept and stops
/// further frames; the layout itself keeps running.
pub struct PngFrameWriter {
    directory: PathBuf,
    every: u64,
    bounds: Rect,
    frames_written: usize,
    error: Option<anyhow::Error>,
}

impl PngFrameWriter {
    pub fn new(directory: &Path, every: u64, bounds: Rect) -> anyhow::Result<Self> {
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create frame directory {}", directory.display()))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            every: every.max(1),
            bounds,
            frames_written: 0,
            error: None,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    pub fn write_final(&mut self, rooms: &RoomCollection) -> anyhow::Result<PathBuf> {
        let path = self.directory.join("final.png");
        self.write(rooms, &path)?;
        Ok(path)
    }

    fn write(&mut self, rooms: &RoomCollection, path: &Path) -> anyhow::Result<()> {
        let pixmap = draw(rooms, &self.bounds)?;
        pixmap
            .save_png(path)
            .map_err(|err| anyhow!("failed to write {}: {}", path.display(), err))?;
        self.frames_written += 1;
        Ok(())
    }
}

impl RenderHook for PngFrameWriter {
    fn render(&mut self, rooms: &RoomCollection, phase: Phase, iteration: u64) {
        if self.error.is_some() || iteration % self.every != 0 {
            return;
        }
        let path = self.directory.join(frame_file_name(phase, iteration));
        match self.write(rooms, &path) {
            Ok(()) => debug!(path = %path.display(), "frame written"),
            Err(err) => {
                warn!(error = %err, "giving up on frames");
                self.error = Some(err);
            }
        }
    }
}

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Integer point on the layout plane.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Structural identity of a rectangle's placement, used to remember positions a room has already
/// occupied.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RectKey(pub i32, pub i32, pub i32, pub i32);

/// Rect is an axis-aligned box whose (x, y) is the bottom-left corner. Width and height are expected
/// to be positive; that is checked once when a layout is requested, not here.
///
/// overlap_adjust is a buffer that only affects [`Rect::overlaps`]. It is never used for placement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    #[serde(default)]
    overlap_adjust: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            overlap_adjust: 0,
        }
    }

    pub fn with_overlap_adjust(self, overlap_adjust: i32) -> Self {
        Self { overlap_adjust, ..self }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn overlap_adjust(&self) -> i32 {
        self.overlap_adjust
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn top(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn has_positive_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether this box and `other` share a region of positive area. Boxes that only touch along
    /// an edge or at a corner do not overlap.
    ///
    /// Only this box's overlap_adjust is applied, so `a.overlaps(&b)` and `b.overlaps(&a)` can
    /// disagree when the two buffers differ.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let adjust = i64::from(self.overlap_adjust);
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        let (other_x, other_y) = (i64::from(other.x), i64::from(other.y));
        let (other_width, other_height) = (i64::from(other.width), i64::from(other.height));

        let dx = (x + width - adjust).min(other_x + other_width + adjust) - (x - adjust).max(other_x + adjust);
        let dy = (y + height - adjust).min(other_y + other_height + adjust) - (y - adjust).max(other_y + adjust);
        dx >= 0 && dy >= 0 && dx * dy > 0
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn moved_by(&self, dx: i32, dy: i32) -> Rect {
        let mut moved = *self;
        moved.move_by(dx, dy);
        moved
    }

    /// Twice the center, so that odd widths and heights stay exact in integer arithmetic.
    pub fn center_doubled(&self) -> (i64, i64) {
        (
            2 * i64::from(self.x) + i64::from(self.width),
            2 * i64::from(self.y) + i64::from(self.height),
        )
    }

    pub fn key(&self) -> RectKey {
        RectKey(self.x, self.y, self.width, self.height)
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod rect_tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    pub fn shared_edge_is_not_an_overlap() {
        // === given ===
        let left = Rect::new(0, 0, 2, 2);
        let right = Rect::new(2, 0, 2, 2);

        // === when / then ===
        assert!(!left.overlaps(&right));
        assert!(!right.overlaps(&left));
    }

    #[test]
    pub fn shared_corner_is_not_an_overlap() {
        let first = Rect::new(0, 0, 2, 2);
        let second = Rect::new(2, 2, 3, 3);
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    pub fn partial_and_contained_boxes_overlap() {
        let outer = Rect::new(0, 0, 10, 10);
        assert!(outer.overlaps(&Rect::new(9, 9, 4, 4)));
        assert!(outer.overlaps(&Rect::new(2, 3, 1, 1)));
        assert!(Rect::new(2, 3, 1, 1).overlaps(&outer));
        assert!(outer.overlaps(&outer));
    }

    #[test]
    pub fn overlap_adjust_only_applies_to_the_caller() {
        // === given ===
        let buffered = Rect::new(0, 0, 2, 2).with_overlap_adjust(1);
        let plain = Rect::new(-2, -2, 1, 1);

        // === when / then ===
        // On each axis buffered compares [-1, 1] against [-1, 0]; plain compares [-2, -1] against [0, 2].
        assert!(buffered.overlaps(&plain));
        assert!(!plain.overlaps(&buffered));
    }

    #[test]
    pub fn move_by_translates_in_place() {
        let mut rect = Rect::new(1, 2, 3, 4);
        rect.move_by(-5, 7);
        assert_eq!(rect, Rect::new(-4, 9, 3, 4));
        assert_eq!(rect.moved_by(1, 1).key(), RectKey(-3, 10, 3, 4));
        assert_eq!(rect.key(), RectKey(-4, 9, 3, 4));
    }

    #[test]
    pub fn display_is_comma_separated() {
        assert_eq!(Rect::new(-3, 4, 5, 6).to_string(), "-3,4,5,6");
    }

    #[test]
    pub fn center_doubled_keeps_half_units() {
        assert_eq!(Rect::new(0, 0, 3, 4).center_doubled(), (3, 4));
        assert_eq!(Rect::new(-2, 1, 4, 1).center_doubled(), (0, 3));
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric_without_adjust(x1 in -100i32..100, y1 in -100i32..100,
                                               w1 in 1i32..50, h1 in 1i32..50,
                                               x2 in -100i32..100, y2 in -100i32..100,
                                               w2 in 1i32..50, h2 in 1i32..50) {
            let first = Rect::new(x1, y1, w1, h1);
            let second = Rect::new(x2, y2, w2, h2);
            prop_assert_eq!(first.overlaps(&second), second.overlaps(&first));
        }

        #[test]
        fn boxes_placed_side_by_side_never_overlap(x in -100i32..100, y in -100i32..100,
                                                   w in 1i32..50, h in 1i32..50,
                                                   other_w in 1i32..50, other_h in 1i32..50,
                                                   slide in -60i32..60) {
            let first = Rect::new(x, y, w, h);
            let beside = Rect::new(x + w, y + slide, other_w, other_h);
            let above = Rect::new(x + slide, y + h, other_w, other_h);
            prop_assert!(!first.overlaps(&beside));
            prop_assert!(!first.overlaps(&above));
        }

        #[test]
        fn a_box_always_overlaps_itself(x in -100i32..100, y in -100i32..100, w in 1i32..50, h in 1i32..50) {
            let rect = Rect::new(x, y, w, h);
            prop_assert!(rect.overlaps(&rect));
        }
    }
}

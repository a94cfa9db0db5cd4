// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Geometry Value Objects
//!
//! `BoundingBox` and `Polygon` are the immutable shapes a `RegionResult`
//! carries. Both are plain value objects: no behaviour beyond validation,
//! coordinate transforms, and the IoU metric used to merge multi-scale
//! detections (§4.3.3).

use serde::{Deserialize, Serialize};

/// An axis-aligned box in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Per §3 invariants: `0 ≤ x`, `0 ≤ y`, `x+w ≤ width`, `y+h ≤ height`.
    /// `x`/`y` are unsigned so only the upper bounds need checking here.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x.saturating_add(self.w) <= width && self.y.saturating_add(self.h) <= height
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Intersection-over-union with another box, in `[0, 1]`.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix0 = self.x.max(other.x);
        let iy0 = self.y.max(other.y);
        let ix1 = (self.x + self.w).min(other.x + other.w);
        let iy1 = (self.y + self.h).min(other.y + other.h);

        if ix1 <= ix0 || iy1 <= iy0 {
            return 0.0;
        }

        let inter = (ix1 - ix0) as u64 * (iy1 - iy0) as u64;
        let union = self.area() + other.area() - inter;
        if union == 0 {
            0.0
        } else {
            inter as f32 / union as f32
        }
    }

    /// Clamps a box into `[0, width) x [0, height)`, per the box-validity
    /// invariant (§8.5). Engines occasionally overshoot at the image edge;
    /// this is applied defensively rather than treated as a stage error.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let w = self.w.min(width.saturating_sub(x));
        let h = self.h.min(height.saturating_sub(y));
        BoundingBox { x, y, w, h }
    }
}

/// A 2D point in image-pixel coordinates (sub-pixel precision, hence `f32`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A detected text region's outline, either a minimum-area rectangle (4
/// points) or a raw contour (arbitrary point count) depending on
/// `DetectConfig::polygon_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// The axis-aligned bounding box enclosing every vertex, rounded
    /// outward so the box never clips the polygon it encloses.
    pub fn bounding_box(&self) -> BoundingBox {
        if self.points.is_empty() {
            return BoundingBox::new(0, 0, 0, 0);
        }
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let x = min_x.max(0.0).floor() as u32;
        let y = min_y.max(0.0).floor() as u32;
        let w = (max_x - min_x).max(0.0).ceil() as u32;
        let h = (max_y - min_y).max(0.0).ceil() as u32;
        BoundingBox::new(x, y, w, h)
    }

    /// Rotates every point about the center of a `(width, height)` image by
    /// `rotation` degrees clockwise, returning points valid in a frame whose
    /// dimensions are swapped for 90/270. Used by the executor to carry
    /// Detect/Recognise polygons (produced in the rotated frame) back into
    /// the caller-visible original frame (§4.4, §9 "Inverse-rotation of
    /// polygons").
    pub fn inverse_rotate(&self, rotation: Rotation, rotated_width: u32, rotated_height: u32) -> Polygon {
        let (rw, rh) = (rotated_width as f32, rotated_height as f32);
        let points = self
            .points
            .iter()
            .map(|p| match rotation {
                Rotation::None => *p,
                // Image was rotated 90 CW to produce the rotated frame;
                // invert by rotating points 90 CCW back into the original frame.
                Rotation::Clockwise90 => Point { x: p.y, y: rw - p.x },
                Rotation::Rotate180 => Point { x: rw - p.x, y: rh - p.y },
                Rotation::Clockwise270 => Point { x: rh - p.y, y: p.x },
            })
            .collect();
        Polygon::new(points)
    }
}

/// The four rotations a document orienter may report (§3, §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Clockwise90,
    Rotate180,
    Clockwise270,
}

impl Rotation {
    /// Coerces an arbitrary engine angle to one of the four supported
    /// rotations, or `None` (with the caller expected to log at debug) per
    /// the invariant in §3: "any other value ... is coerced to 0".
    pub fn from_degrees(angle: i32) -> Option<Rotation> {
        match angle.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    pub fn as_degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BoundingBox::new(10, 10, 20, 20);
        assert!((a.iou(&a) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(100, 100, 10, 10);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_partially_overlapping_boxes() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 5, 10, 10);
        // intersection: 5x5 = 25, union: 100+100-25 = 175
        let expected = 25.0 / 175.0;
        assert!((a.iou(&b) - expected).abs() < 1e-6);
    }

    #[test]
    fn rotation_from_degrees_accepts_only_quadrants() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn box_clamp_keeps_box_within_image() {
        let b = BoundingBox::new(300, 200, 50, 80);
        let clamped = b.clamp_to(320, 240);
        assert!(clamped.is_within(320, 240));
    }

    #[test]
    fn bounding_box_of_polygon_encloses_all_points() {
        let poly = Polygon::new(vec![
            Point { x: 1.2, y: 2.8 },
            Point { x: 10.5, y: 0.1 },
            Point { x: 4.0, y: 9.9 },
        ]);
        let bbox = poly.bounding_box();
        assert!(bbox.is_within(u32::MAX, u32::MAX));
        assert!(bbox.x <= 1 && bbox.y == 0);
        assert!(bbox.x + bbox.w >= 11);
    }
}

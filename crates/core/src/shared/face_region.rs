use serde::Serialize;

/// Axis-aligned face bounding box in frame coordinates.
///
/// Invariant: `x1 < x2` and `y1 < y2` for a usable region. Detector output
/// may violate this (or fall outside the frame entirely), so consumers go
/// through [`FaceRegion::clipped`] before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FaceRegion {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl FaceRegion {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        self.width() as i64 * self.height() as i64
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Face area as a fraction of the frame area. Zero for degenerate
    /// regions or a zero-sized frame.
    pub fn area_ratio(&self, frame_width: u32, frame_height: u32) -> f64 {
        let frame_area = frame_width as i64 * frame_height as i64;
        if frame_area == 0 {
            return 0.0;
        }
        self.area() as f64 / frame_area as f64
    }

    /// Expands the region by `fraction` of its width/height on each side.
    ///
    /// The result is unclipped and may extend outside the frame.
    pub fn padded(&self, fraction: f64) -> FaceRegion {
        let pad_x = (self.width() as f64 * fraction) as i32;
        let pad_y = (self.height() as f64 * fraction) as i32;
        FaceRegion {
            x1: self.x1 - pad_x,
            y1: self.y1 - pad_y,
            x2: self.x2 + pad_x,
            y2: self.y2 + pad_y,
        }
    }

    /// Intersects the region with the frame bounds.
    ///
    /// Returns `None` when nothing usable remains (zero area), which callers
    /// treat as "no face" rather than an error.
    pub fn clipped(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        let clipped = FaceRegion {
            x1: self.x1.max(0),
            y1: self.y1.max(0),
            x2: self.x2.min(frame_width as i32),
            y2: self.y2.min(frame_height as i32),
        };
        clipped.is_valid().then_some(clipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_dimensions_and_area() {
        let r = FaceRegion::new(10, 20, 110, 70);
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 50);
        assert_eq!(r.area(), 5000);
        assert!(r.is_valid());
    }

    #[rstest]
    #[case::zero_width(FaceRegion::new(10, 10, 10, 50))]
    #[case::zero_height(FaceRegion::new(10, 10, 50, 10))]
    #[case::inverted(FaceRegion::new(50, 50, 10, 10))]
    fn test_degenerate_regions(#[case] r: FaceRegion) {
        assert!(!r.is_valid());
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_area_ratio() {
        let r = FaceRegion::new(0, 0, 50, 50);
        assert_relative_eq!(r.area_ratio(100, 100), 0.25);
    }

    #[test]
    fn test_area_ratio_zero_frame() {
        let r = FaceRegion::new(0, 0, 50, 50);
        assert_relative_eq!(r.area_ratio(0, 100), 0.0);
    }

    #[test]
    fn test_padded_expands_both_sides() {
        let r = FaceRegion::new(100, 100, 200, 150);
        let p = r.padded(0.1);
        assert_eq!(p, FaceRegion::new(90, 95, 210, 155));
    }

    #[test]
    fn test_clipped_inside_frame_unchanged() {
        let r = FaceRegion::new(10, 10, 50, 50);
        assert_eq!(r.clipped(100, 100), Some(r));
    }

    #[test]
    fn test_clipped_partial_overlap() {
        let r = FaceRegion::new(-20, -10, 50, 50);
        assert_eq!(r.clipped(100, 100), Some(FaceRegion::new(0, 0, 50, 50)));
    }

    #[test]
    fn test_clipped_entirely_outside_is_none() {
        let r = FaceRegion::new(200, 200, 300, 300);
        assert_eq!(r.clipped(100, 100), None);
    }

    #[test]
    fn test_clipped_degenerate_is_none() {
        let r = FaceRegion::new(50, 50, 50, 80);
        assert_eq!(r.clipped(100, 100), None);
    }
}

//! Geometry constants and math for annotation rendering
//!
//! All values are in source-image pixels; photos are annotated at their
//! stored resolution, so there is no display scale to apply.

/// Arrow geometry constants
pub mod arrow {
    /// Arrowhead line length
    pub const HEAD_SIZE: f32 = 15.0;
    /// Arrowhead angle from shaft in radians (30 degrees)
    pub const HEAD_ANGLE: f32 = std::f32::consts::FRAC_PI_6;
    /// Shorter arrows get no head, only the shaft
    pub const MIN_LENGTH: f32 = 1.0;

    /// Calculate arrow head points given start, end, and head size
    /// Returns (head1_x, head1_y, head2_x, head2_y) for the two head lines
    pub fn head_points(
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
        head_size: f32,
    ) -> Option<(f32, f32, f32, f32)> {
        let dx = end_x - start_x;
        let dy = end_y - start_y;
        let length = (dx * dx + dy * dy).sqrt();
        if length < MIN_LENGTH {
            return None;
        }

        // Unit direction vector (pointing from start to end)
        let nx = dx / length;
        let ny = dy / length;

        let cos_a = HEAD_ANGLE.cos();
        let sin_a = HEAD_ANGLE.sin();

        // First head line (rotated clockwise from the reversed heading)
        let head1_x = end_x + (-nx * cos_a + ny * sin_a) * head_size;
        let head1_y = end_y + (-nx * sin_a - ny * cos_a) * head_size;

        // Second head line (rotated counter-clockwise)
        let head2_x = end_x + (-nx * cos_a - ny * sin_a) * head_size;
        let head2_y = end_y + (nx * sin_a - ny * cos_a) * head_size;

        Some((head1_x, head1_y, head2_x, head2_y))
    }
}

/// Stroke constants shared by every outlined shape
pub mod shape {
    /// Stroke width of lines, arrows, rectangles and circles
    pub const THICKNESS: f32 = 3.0;

    /// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
    pub const BEZIER_K: f32 = 0.552_284_8;
}

/// Bitmap label constants
pub mod label {
    /// Glyph cell scale; 8x8 glyphs become 24x24
    pub const TEXT_SCALE: f32 = 3.0;
    /// Distance of a measurement label from its line
    pub const OFFSET: f32 = 14.0;
}

/// Normalize min/max coordinates from arbitrary start/end points
#[inline]
pub fn normalize_rect(x1: f32, y1: f32, x2: f32, y2: f32) -> (f32, f32, f32, f32) {
    let (min_x, max_x) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
    let (min_y, max_y) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
    (min_x, min_y, max_x, max_y)
}

/// Calculate ellipse center and radii from bounding box
#[inline]
pub fn ellipse_from_bounds(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (f32, f32, f32, f32) {
    let cx = (min_x + max_x) * 0.5;
    let cy = (min_y + max_y) * 0.5;
    let rx = ((max_x - min_x) * 0.5).max(1.0);
    let ry = ((max_y - min_y) * 0.5).max(1.0);
    (cx, cy, rx, ry)
}

/// Anchor of a measurement label: the segment midpoint pushed `offset`
/// along the segment normal, on the upper side for horizontal lines
pub fn measure_label_anchor(x1: f32, y1: f32, x2: f32, y2: f32, offset: f32) -> (f32, f32) {
    let (mx, my) = ((x1 + x2) * 0.5, (y1 + y2) * 0.5);
    let (dx, dy) = (x2 - x1, y2 - y1);
    let length = (dx * dx + dy * dy).sqrt();
    if length < f32::EPSILON {
        return (mx, my - offset);
    }
    let (mut nx, mut ny) = (-dy / length, dx / length);
    if ny > 0.0 {
        nx = -nx;
        ny = -ny;
    }
    (mx + nx * offset, my + ny * offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_points_are_symmetric_behind_the_tip() {
        let (x1, y1, x2, y2) = arrow::head_points(0.0, 0.0, 10.0, 0.0, 15.0).unwrap();
        assert!(x1 < 10.0 && x2 < 10.0);
        assert!((x1 - x2).abs() < 1e-4);
        assert!((y1 + y2).abs() < 1e-4);
        assert!((y1.abs() - 7.5).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_arrow_has_no_head() {
        assert!(arrow::head_points(3.0, 3.0, 3.0, 3.0, 15.0).is_none());
    }

    #[test]
    fn test_measure_label_sits_above_horizontal_line() {
        let (x, y) = measure_label_anchor(0.0, 50.0, 100.0, 50.0, 14.0);
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y - 36.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_rect() {
        assert_eq!(normalize_rect(10.0, 2.0, 1.0, 8.0), (1.0, 2.0, 10.0, 8.0));
    }
}

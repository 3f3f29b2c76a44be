//! Annotation compositing using tiny-skia
//!
//! Primitives are drawn onto a copy of the photo in list order, then the
//! result is encoded as JPEG for embedding.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::geometry::{self, arrow, label, shape};
use super::text;
use crate::config::Palette;
use crate::domain::{AnnotationPrimitive, Point, Shape};
use crate::error::Result;

/// JPEG quality of annotated photos
pub const JPEG_QUALITY: u8 = 90;

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    // Copy back
    img.copy_from_slice(pixmap.data());
}

/// Build an arrow path as stroked lines (shaft + two angled head lines)
fn build_arrow_path(
    start_x: f32,
    start_y: f32,
    end_x: f32,
    end_y: f32,
    head_size: f32,
) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();

    // Shaft line from start to end
    pb.move_to(start_x, start_y);
    pb.line_to(end_x, end_y);

    if let Some((head1_x, head1_y, head2_x, head2_y)) =
        arrow::head_points(start_x, start_y, end_x, end_y, head_size)
    {
        pb.move_to(end_x, end_y);
        pb.line_to(head1_x, head1_y);

        pb.move_to(end_x, end_y);
        pb.line_to(head2_x, head2_y);
    }

    pb.finish()
}

fn build_line_path(a: Point, b: Point) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(a.x, a.y);
    pb.line_to(b.x, b.y);
    pb.finish()
}

fn build_rect_path(a: Point, b: Point) -> Option<tiny_skia::Path> {
    let (min_x, min_y, max_x, max_y) = geometry::normalize_rect(a.x, a.y, b.x, b.y);
    let rect = tiny_skia::Rect::from_ltrb(min_x, min_y, max_x.max(min_x + 1.0), max_y.max(min_y + 1.0))?;
    Some(PathBuilder::from_rect(rect))
}

/// Build an ellipse path using cubic bezier curves
fn build_ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<tiny_skia::Path> {
    let kx = rx * shape::BEZIER_K;
    let ky = ry * shape::BEZIER_K;

    let mut pb = PathBuilder::new();

    // Start at top
    pb.move_to(cx, cy - ry);

    // Top to right
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);

    // Right to bottom
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);

    // Bottom to left
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);

    // Left to top
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);

    pb.close();
    pb.finish()
}

fn stroke_path(pixmap: &mut Pixmap, path: Option<tiny_skia::Path>, paint: &Paint) {
    let Some(path) = path else {
        return;
    };
    let stroke = Stroke {
        width: shape::THICKNESS,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
}

/// Draw one primitive; false when it was skipped
fn draw_primitive(pixmap: &mut Pixmap, index: usize, primitive: &AnnotationPrimitive, palette: &Palette) -> bool {
    let needed = primitive.shape.required_points();
    if needed == 0 {
        log::warn!("Annotation {index}: unsupported kind {:?}, skipping", primitive.shape.name());
        return false;
    }
    if primitive.points.len() < needed {
        log::warn!(
            "Annotation {index}: {} needs {needed} points, got {}, skipping",
            primitive.shape.name(),
            primitive.points.len()
        );
        return false;
    }

    let [r, g, b, a] = palette.resolve(&primitive.color).to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let p0 = primitive.points[0];
    match &primitive.shape {
        Shape::Arrow => {
            let p1 = primitive.points[1];
            stroke_path(pixmap, build_arrow_path(p0.x, p0.y, p1.x, p1.y, arrow::HEAD_SIZE), &paint);
        }
        Shape::Line => stroke_path(pixmap, build_line_path(p0, primitive.points[1]), &paint),
        Shape::Rectangle => stroke_path(pixmap, build_rect_path(p0, primitive.points[1]), &paint),
        Shape::Circle => {
            let p1 = primitive.points[1];
            let (min_x, min_y, max_x, max_y) = geometry::normalize_rect(p0.x, p0.y, p1.x, p1.y);
            let (cx, cy, rx, ry) = geometry::ellipse_from_bounds(min_x, min_y, max_x, max_y);
            stroke_path(pixmap, build_ellipse_path(cx, cy, rx, ry), &paint);
        }
        Shape::Text { label } => {
            if label.is_empty() {
                return false;
            }
            text::draw_text(pixmap, label, p0.x, p0.y, label::TEXT_SCALE, &paint);
        }
        Shape::Measure { distance } => {
            let p1 = primitive.points[1];
            stroke_path(pixmap, build_line_path(p0, p1), &paint);
            if !distance.is_empty() {
                let caption = format!("{distance}m");
                let (ax, ay) = geometry::measure_label_anchor(p0.x, p0.y, p1.x, p1.y, label::OFFSET);
                let x = ax - text::text_width(&caption, label::TEXT_SCALE) * 0.5;
                let y = ay - text::text_height(label::TEXT_SCALE) * 0.5;
                text::draw_text(pixmap, &caption, x, y, label::TEXT_SCALE, &paint);
            }
        }
        Shape::Unsupported(_) => return false,
    }
    true
}

/// Draw `primitives` onto a copy of `source`, in list order
pub fn draw_annotations(source: &RgbaImage, primitives: &[AnnotationPrimitive], palette: &Palette) -> RgbaImage {
    let mut img = source.clone();
    if primitives.is_empty() {
        return img;
    }
    with_pixmap(&mut img, |pixmap| {
        for (index, primitive) in primitives.iter().enumerate() {
            draw_primitive(pixmap, index, primitive, palette);
        }
    });
    img
}

/// Annotate the photo at `path` and return the bytes to embed
///
/// When no primitive leaves a mark the original file bytes are returned as-is.
pub fn annotate_photo(path: &Path, primitives: &[AnnotationPrimitive], palette: &Palette) -> Result<Vec<u8>> {
    let original = std::fs::read(path)?;
    let source = image::load_from_memory(&original)?.to_rgba8();
    let drawn = draw_annotations(&source, primitives, palette);
    if drawn == source {
        return Ok(original);
    }

    let rgb = DynamicImage::ImageRgba8(drawn).to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    const BACKGROUND: Rgba<u8> = Rgba([200, 200, 200, 255]);

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(64, 64, BACKGROUND)
    }

    fn prim(shape: Shape, points: &[(f32, f32)]) -> AnnotationPrimitive {
        AnnotationPrimitive::new(shape, points, "red")
    }

    #[test]
    fn test_arrow_marks_tip_and_leaves_background() {
        let source = canvas();
        let out = draw_annotations(&source, &[prim(Shape::Arrow, &[(0.0, 0.0), (10.0, 0.0)])], &Palette::default());
        assert_ne!(*out.get_pixel(10, 0), BACKGROUND);
        assert_eq!(*out.get_pixel(5, 5), BACKGROUND);
        // Source is never touched
        assert_eq!(*source.get_pixel(10, 0), BACKGROUND);
    }

    #[test]
    fn test_empty_text_is_identical_to_source() {
        let source = canvas();
        let out = draw_annotations(
            &source,
            &[prim(Shape::Text { label: String::new() }, &[(10.0, 10.0)])],
            &Palette::default(),
        );
        assert_eq!(out, source);
    }

    #[test]
    fn test_malformed_primitives_do_not_stop_the_rest() {
        let source = canvas();
        let prims = vec![
            prim(Shape::Unsupported("freehand".into()), &[(1.0, 1.0), (2.0, 2.0)]),
            prim(Shape::Rectangle, &[(5.0, 5.0)]),
            prim(Shape::Line, &[(0.0, 40.0), (63.0, 40.0)]),
        ];
        let out = draw_annotations(&source, &prims, &Palette::default());
        assert_ne!(*out.get_pixel(30, 40), BACKGROUND);
        assert_eq!(*out.get_pixel(5, 5), BACKGROUND);
    }

    #[test]
    fn test_later_primitives_draw_over_earlier() {
        let source = canvas();
        let prims = vec![
            AnnotationPrimitive::new(Shape::Line, &[(0.0, 20.0), (63.0, 20.0)], "blue"),
            AnnotationPrimitive::new(Shape::Line, &[(0.0, 20.0), (63.0, 20.0)], "black"),
        ];
        let out = draw_annotations(&source, &prims, &Palette::default());
        assert_eq!(*out.get_pixel(30, 20), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_rectangle_is_outline_only() {
        let out = draw_annotations(&canvas(), &[prim(Shape::Rectangle, &[(10.0, 10.0), (50.0, 50.0)])], &Palette::default());
        assert_ne!(*out.get_pixel(10, 30), BACKGROUND);
        assert_eq!(*out.get_pixel(30, 30), BACKGROUND);
    }

    #[test]
    fn test_measure_draws_line_and_label() {
        let out = draw_annotations(
            &RgbaImage::from_pixel(200, 100, BACKGROUND),
            &[prim(Shape::Measure { distance: "4.5".into() }, &[(10.0, 70.0), (190.0, 70.0)])],
            &Palette::default(),
        );
        assert_ne!(*out.get_pixel(100, 70), BACKGROUND);
        // Label sits above the line
        let label_marked = (40..66u32).any(|y| (60..140u32).any(|x| *out.get_pixel(x, y) != BACKGROUND));
        assert!(label_marked);
    }

    #[test]
    fn test_annotate_photo_encodes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        canvas().save_with_format(&path, ImageFormat::Png).unwrap();

        let bytes = annotate_photo(&path, &[prim(Shape::Circle, &[(8.0, 8.0), (56.0, 56.0)])], &Palette::default()).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        let untouched = annotate_photo(&path, &[prim(Shape::Text { label: String::new() }, &[(1.0, 1.0)])], &Palette::default()).unwrap();
        assert_eq!(untouched, std::fs::read(&path).unwrap());
    }

    #[test]
    fn test_corrupt_photo_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xff\xd8garbage").unwrap();
        assert!(annotate_photo(&path, &[prim(Shape::Line, &[(0.0, 0.0), (5.0, 5.0)])], &Palette::default()).is_err());
    }
}

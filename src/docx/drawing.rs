//! Inline pictures (DrawingML) and their media parts

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::Result;
use crate::ooxml::rels::REL_IMAGE;
use crate::ooxml::{ContentTypes, Element, Package, Relationships};

const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const EMU_PER_CM: f64 = 360_000.0;

/// Encoded image ready to be stored as a media part
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ImageBlob {
    /// Sniff format and size; formats Word cannot show are re-encoded as PNG
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader.format();
        let (width, height) = reader.into_dimensions()?;

        let (extension, content_type) = match format {
            Some(ImageFormat::Jpeg) => ("jpeg", "image/jpeg"),
            Some(ImageFormat::Png) => ("png", "image/png"),
            Some(ImageFormat::Gif) => ("gif", "image/gif"),
            Some(ImageFormat::Bmp) => ("bmp", "image/bmp"),
            _ => {
                let decoded = image::load_from_memory(&bytes)?;
                let mut png = Vec::new();
                decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
                return Ok(Self {
                    bytes: png,
                    extension: "png",
                    content_type: "image/png",
                    width,
                    height,
                });
            }
        };
        Ok(Self {
            bytes,
            extension,
            content_type,
            width,
            height,
        })
    }

    /// Extent in EMU at `width_cm`, keeping the aspect ratio
    pub fn extent(&self, width_cm: f32) -> (i64, i64) {
        let cx = (f64::from(width_cm) * EMU_PER_CM).round();
        let cy = if self.width == 0 {
            cx
        } else {
            (cx * f64::from(self.height) / f64::from(self.width)).round()
        };
        (cx as i64, cy as i64)
    }
}

/// Store `blob` as a new media part of `source_part` and return its relationship id
pub fn add_media(
    package: &mut Package,
    rels: &mut Relationships,
    types: &mut ContentTypes,
    source_part: &str,
    blob: ImageBlob,
) -> String {
    let dir = source_part.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    let prefix = if dir.is_empty() {
        "media/image".to_string()
    } else {
        format!("{dir}/media/image")
    };
    let part = package.unused_part_name(&prefix, blob.extension);
    let target = part
        .strip_prefix(dir)
        .map(|t| t.trim_start_matches('/'))
        .unwrap_or(&part)
        .to_string();
    types.ensure_default(blob.extension, blob.content_type);
    package.set_part(&part, blob.bytes);
    rels.add(REL_IMAGE, &target)
}

/// Highest `wp:docPr/@id` in the document, so new drawings get unique ids
pub fn max_drawing_id(root: &Element) -> u32 {
    root.paths_of("wp:docPr")
        .iter()
        .filter_map(|p| root.at_path(p))
        .filter_map(|e| e.attr("id"))
        .filter_map(|id| id.parse().ok())
        .max()
        .unwrap_or(0)
}

/// Paragraph holding one inline picture
pub fn picture_paragraph(rel_id: &str, drawing_id: u32, name: &str, cx: i64, cy: i64) -> Element {
    let (cx, cy) = (cx.to_string(), cy.to_string());

    let pic = Element::new("pic:pic")
        .with_attr("xmlns:pic", NS_PIC)
        .with_child(
            Element::new("pic:nvPicPr")
                .with_child(
                    Element::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", name),
                )
                .with_child(Element::new("pic:cNvPicPr")),
        )
        .with_child(
            Element::new("pic:blipFill")
                .with_child(
                    Element::new("a:blip")
                        .with_attr("xmlns:r", NS_R)
                        .with_attr("r:embed", rel_id),
                )
                .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect"))),
        )
        .with_child(
            Element::new("pic:spPr")
                .with_child(
                    Element::new("a:xfrm")
                        .with_child(Element::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            Element::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    Element::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(Element::new("a:avLst")),
                ),
        );

    let inline = Element::new("wp:inline")
        .with_attr("xmlns:wp", NS_WP)
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            Element::new("wp:extent")
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(
            Element::new("wp:effectExtent")
                .with_attr("l", "0")
                .with_attr("t", "0")
                .with_attr("r", "0")
                .with_attr("b", "0"),
        )
        .with_child(
            Element::new("wp:docPr")
                .with_attr("id", drawing_id.to_string())
                .with_attr("name", format!("Picture {drawing_id}")),
        )
        .with_child(
            Element::new("wp:cNvGraphicFramePr").with_child(
                Element::new("a:graphicFrameLocks")
                    .with_attr("xmlns:a", NS_A)
                    .with_attr("noChangeAspect", "1"),
            ),
        )
        .with_child(
            Element::new("a:graphic").with_attr("xmlns:a", NS_A).with_child(
                Element::new("a:graphicData")
                    .with_attr("uri", NS_PIC)
                    .with_child(pic),
            ),
        );

    Element::new("w:p").with_child(
        Element::new("w:r").with_child(Element::new("w:drawing").with_child(inline)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(w, h, Rgb([10, 20, 30]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn test_blob_sniffs_png_and_keeps_aspect() {
        let blob = ImageBlob::from_bytes(png_bytes(40, 30)).unwrap();
        assert_eq!(blob.extension, "png");
        assert_eq!((blob.width, blob.height), (40, 30));
        assert_eq!(blob.extent(16.0), (5_760_000, 4_320_000));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(ImageBlob::from_bytes(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn test_add_media_registers_part_rel_and_type() {
        let mut package = Package::new();
        let mut rels = Relationships::empty();
        let mut types = ContentTypes::empty();
        let blob = ImageBlob::from_bytes(png_bytes(2, 2)).unwrap();
        let id = add_media(&mut package, &mut rels, &mut types, "word/document.xml", blob);
        assert!(package.contains("word/media/image1.png"));
        assert_eq!(rels.target_of(&id), Some("media/image1.png"));

        let p = picture_paragraph(&id, 7, "a.png", 100, 50);
        assert_eq!(p.find("a:blip").unwrap().attr("r:embed"), Some(id.as_str()));
        assert_eq!(max_drawing_id(&Element::new("root").with_child(p)), 7);
    }
}

//! Document encoding: fitted pages → one multi-page PDF.
//!
//! Each page becomes an 8-bit DeviceRGB image XObject drawn full-bleed on a
//! page whose MediaBox is the pixel size converted at `dpi`
//! (`points = px × 72 / dpi`). A 2481 × 3507 page at 300 DPI therefore reads
//! as 595.4 × 841.7 pt, i.e. A4, in any viewer. Image streams are Flate
//! compressed by lopdf, which keeps the white margins nearly free.

use crate::error::GenerateError;
use crate::pipeline::fit::FittedPage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;
use tracing::debug;

/// Resource name every page uses for its single image.
const IMAGE_NAME: &str = "Im0";

/// Encode `pages` in order into PDF bytes.
///
/// The first page is the base of the page tree and the rest follow in input
/// order. `title` goes into the document information dictionary. Each raster
/// is moved into its image stream, so a page's pixels are never held twice.
pub fn encode_document(
    pages: Vec<FittedPage>,
    dpi: u32,
    title: Option<&str>,
) -> Result<Vec<u8>, GenerateError> {
    if pages.is_empty() {
        return Err(GenerateError::EmptyPageSet);
    }
    let dpi = dpi.max(1);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    let page_count = pages.len();
    for (i, page) in pages.into_iter().enumerate() {
        let (width_px, height_px) = (page.width(), page.height());
        let width_pt = px_to_pt(width_px, dpi);
        let height_pt = px_to_pt(height_px, dpi);

        let orientation = page.orientation;
        let image_id = doc.add_object(image_stream(page));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), width_pt.into(), height_pt.into()]),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        });
        kids.push(page_id.into());

        debug!(
            "Encoded page {}: {}x{} px → {:.1}x{:.1} pt ({})",
            i + 1,
            width_px,
            height_px,
            width_pt,
            height_pt,
            orientation
        );
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Producer" => Object::string_literal(concat!("query2pdf ", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        info.set("Title", text_string(title));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut out = Vec::new();
    write_document(&mut doc, &mut out)?;
    debug!("PDF assembled: {} pages, {} bytes", page_count, out.len());
    Ok(out)
}

/// 8-bit DeviceRGB image XObject that takes ownership of the page raster.
fn image_stream(page: FittedPage) -> Stream {
    let (width, height) = (page.width(), page.height());
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
        },
        page.image.into_raw(),
    )
}

fn write_document<W: Write>(doc: &mut Document, target: &mut W) -> Result<(), GenerateError> {
    doc.save_to(target).map_err(GenerateError::PdfWrite)
}

fn px_to_pt(px: u32, dpi: u32) -> f32 {
    px as f32 * 72.0 / dpi as f32
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Orientation;
    use crate::pipeline::fit::Placement;
    use image::{Rgb, RgbImage};

    fn page(w: u32, h: u32, shade: u8) -> FittedPage {
        FittedPage {
            image: RgbImage::from_pixel(w, h, Rgb([shade, shade, shade])),
            orientation: if w >= h {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            },
            placement: Placement {
                x: 0,
                y: 0,
                width: w,
                height: h,
            },
        }
    }

    fn image_sizes(doc: &Document) -> Vec<(i64, i64)> {
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let page = doc.get_dictionary(page_id).unwrap();
                let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
                let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
                let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
                let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
                (
                    stream.dict.get(b"Width").unwrap().as_i64().unwrap(),
                    stream.dict.get(b"Height").unwrap().as_i64().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn empty_page_set_is_rejected() {
        let err = encode_document(Vec::new(), 300, None).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyPageSet));
    }

    #[test]
    fn output_is_a_pdf() {
        let bytes = encode_document(vec![page(8, 12, 255)], 300, Some("cats")).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn n_pages_in_input_order() {
        let pages = vec![page(10, 20, 0), page(30, 15, 128), page(11, 13, 255)];
        let bytes = encode_document(pages, 300, None).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(image_sizes(&doc), vec![(10, 20), (30, 15), (11, 13)]);
    }

    #[test]
    fn media_box_reflects_dpi() {
        let bytes = encode_document(vec![page(300, 600, 255)], 150, None).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media_box = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        let w = media_box[2].as_float().unwrap();
        let h = media_box[3].as_float().unwrap();
        assert!((w - 144.0).abs() < 0.01, "width {w}");
        assert!((h - 288.0).abs() < 0.01, "height {h}");
    }

    #[test]
    fn image_stream_takes_the_raster_without_copying() {
        let p = page(16, 9, 40);
        let raster = p.image.as_raw().as_ptr();
        let stream = image_stream(p);
        assert_eq!(stream.content.as_ptr(), raster);
        assert_eq!(stream.content.len(), 16 * 9 * 3);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_pdf_write_error() {
        let mut doc = Document::with_version("1.5");
        let err = write_document(&mut doc, &mut FailingWriter).unwrap_err();
        assert!(matches!(err, GenerateError::PdfWrite(_)), "got {err:?}");
    }

    #[test]
    fn non_ascii_title_uses_utf16() {
        match text_string("chats · été") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            text_string("plain"),
            Object::String(_, StringFormat::Literal)
        ));
    }
}

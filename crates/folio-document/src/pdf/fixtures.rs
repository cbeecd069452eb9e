// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small synthetic PDFs for tests, built directly with lopdf.

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::image::processor::ImageProcessor;

/// A PDF with one page per entry of `pages`. Each line of an entry is drawn
/// in its own text object, so extracted text keeps the line breaks.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let y = 760 - 16 * index as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![50.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let encoded = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        kids.push(add_page(&mut doc, pages_id, content_id, Some(resources_id)).into());
    }

    finish(doc, pages_id, kids)
}

/// A one-page PDF whose only content is a `width` x `height` noisy RGB image
/// embedded as a high-quality JPEG (/DCTDecode), so recompression at a lower
/// quality shrinks it.
pub fn jpeg_pdf(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x1234_5678;
    let image = RgbImage::from_fn(width, height, |_, _| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    });
    let jpeg = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(image))
        .to_jpeg_bytes(100)
        .unwrap_or_default();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    );
    image_stream.allows_compression = false;
    let image_id = doc.add_object(image_stream);
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (width as i64).into(),
                    0.into(),
                    0.into(),
                    (height as i64).into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap_or_default()));
    let page_id = add_page(&mut doc, pages_id, content_id, Some(resources_id));

    finish(doc, pages_id, vec![page_id.into()])
}

fn add_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    content_id: lopdf::ObjectId,
    resources_id: Option<lopdf::ObjectId>,
) -> lopdf::ObjectId {
    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
    };
    if let Some(resources_id) = resources_id {
        page.set("Resources", resources_id);
    }
    doc.add_object(page)
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId, kids: Vec<Object>) -> Vec<u8> {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    // Writing into a Vec only fails on a broken document, which these never are.
    let _ = doc.save_to(&mut bytes);
    bytes
}

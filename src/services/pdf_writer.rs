//! Image pages → PDF.
//!
//! Builds a fresh document with one page per image. Pixels are stored as a
//! Flate-compressed `DeviceRGB` image XObject and painted over the whole
//! page; the page is sized so that one pixel maps to one point (72 dpi).

use flate2::{Compression, write::ZlibEncoder};
use image::DynamicImage;
use lopdf::{
    Dictionary, Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfWriteError {
    #[error("no images to merge")]
    NoImages,
    #[error("image {index} has zero width or height")]
    EmptyImage { index: usize },
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Merge `images` into a single PDF, preserving their order.
pub fn images_to_pdf(images: &[DynamicImage]) -> Result<Vec<u8>, PdfWriteError> {
    if images.is_empty() {
        return Err(PdfWriteError::NoImages);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let page_id = add_image_page(&mut doc, pages_id, index, image)?;
        kids.push(Object::Reference(page_id));
    }

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
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    index: usize,
    image: &DynamicImage,
) -> Result<ObjectId, PdfWriteError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(PdfWriteError::EmptyImage { index });
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rgb.as_raw())?;
    let pixels = encoder.finish()?;

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        pixels,
    ));

    let (w, h) = (width as i64, height as i64);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(image_id),
            },
        },
        "Contents" => Object::Reference(content_id),
    });

    Ok(page_id)
}

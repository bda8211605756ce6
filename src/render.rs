// src/render.rs
//! Writes laid-out documents as PDF using `lopdf`.
//!
//! Text uses the standard Helvetica and Courier-Bold fonts with WinAnsiEncoding, so no font
//! data is embedded. Content streams are left uncompressed.

use crate::error::Result;
use crate::fonts::BaseFont;
use crate::layout::{LaidOutDocument, Page, PageElement};
use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const PDF_VERSION: &str = "1.7";
const PRODUCER: &str = concat!("csv-to-pdf ", env!("CARGO_PKG_VERSION"));

/// An in-memory PDF renderer. Pages are added one at a time and the object graph is
/// written out by [`LopdfDocumentRenderer::finalize`].
pub struct LopdfDocumentRenderer {
    document: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl Default for LopdfDocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfDocumentRenderer {
    pub fn new() -> Self {
        let mut document = Document::with_version(PDF_VERSION);
        let pages_id = document.new_object_id();

        let mut fonts = Dictionary::new();
        for font in BaseFont::ALL {
            let font_id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.postscript_name(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }
        let resources_id = document.add_object(dictionary! { "Font" => fonts });

        Self {
            document,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
        }
    }

    pub fn render_page(&mut self, page: &Page, page_width: f32, page_height: f32) -> Result<()> {
        let mut page_ctx = PageContext::default();
        for element in &page.elements {
            page_ctx.draw_element(element);
        }
        let content = page_ctx.finish();

        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Completes the page tree, catalog and info dictionary and serialises the document.
    pub fn finalize<W: Write>(mut self, title: &str, writer: &mut W) -> Result<()> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let info_id = self.document.add_object(dictionary! {
            "Title" => text_string(title),
            "Producer" => text_string(PRODUCER),
        });
        self.document.trailer.set("Info", info_id);

        self.document.save_to(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Renders `doc` into a new file at `path`, replacing any existing file.
pub fn render_to_file(doc: &LaidOutDocument, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    render_to_writer(doc, &mut writer)
}

pub fn render_to_writer<W: Write>(doc: &LaidOutDocument, writer: &mut W) -> Result<()> {
    let mut renderer = LopdfDocumentRenderer::new();
    for page in &doc.pages {
        renderer.render_page(page, doc.page_width, doc.page_height)?;
    }
    renderer.finalize(&doc.title, writer)
}

/// Per-page drawing state. Every page starts without a selected font, so the body font is
/// set again on the first text run of a continuation page.
#[derive(Default)]
struct PageContext {
    operations: Vec<Operation>,
    font: Option<(BaseFont, f32)>,
}

impl PageContext {
    fn finish(self) -> Content {
        Content {
            operations: self.operations,
        }
    }

    fn draw_element(&mut self, element: &PageElement) {
        match element {
            PageElement::Text {
                x,
                y,
                font,
                size,
                text,
            } => self.draw_text(*x, *y, *font, *size, text),
            PageElement::Rule { x1, x2, y } => self.draw_rule(*x1, *x2, *y),
        }
    }

    fn set_font(&mut self, font: BaseFont, size: f32) {
        if self.font != Some((font, size)) {
            self.operations.push(Operation::new(
                "Tf",
                vec![Object::Name(font.resource_name().as_bytes().to_vec()), size.into()],
            ));
            self.font = Some((font, size));
        }
    }

    fn draw_text(&mut self, x: f32, y: f32, font: BaseFont, size: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        self.operations.push(Operation::new("BT", vec![]));
        self.set_font(font, size);
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn draw_rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.operations.push(Operation::new("w", vec![1.into()]));
        self.operations.push(Operation::new("m", vec![x1.into(), y.into()]));
        self.operations.push(Operation::new("l", vec![x2.into(), y.into()]));
        self.operations.push(Operation::new("S", vec![]));
    }
}

/// Encodes text for a WinAnsiEncoding font; characters outside the code page become `?`.
fn to_win_ansi(text: &str) -> Vec<u8> {
    let mut buf = [0u8; 4];
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

/// PDF text string: plain literal for ASCII, UTF-16BE with byte order mark otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

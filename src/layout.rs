// src/layout.rs
//! Places one group's records on fixed-size pages.
//!
//! Layout is pure geometry: it produces positioned text runs and rules in PDF user space
//! (origin at the bottom-left corner) and leaves serialisation to [`crate::render`].

use crate::fonts::BaseFont;
use crate::grouping::Group;
use std::mem;

/// Page size, margins and type sizes, all in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Distance from the top edge to the title baseline.
    pub title_offset: f32,
    /// Distance from the top edge to the rule under the title.
    pub rule_offset: f32,
    /// Distance from the top edge to the first body line on the first page.
    pub body_offset: f32,
    /// Distance from the top edge to the first body line on continuation pages.
    pub continuation_offset: f32,
    pub line_height: f32,
    /// Extra space after the last line of a record.
    pub record_gap: f32,
    /// The cursor may not go below this height.
    pub bottom_margin: f32,
    /// Space between the widest label and the value column.
    pub gutter: f32,
    pub title_font: BaseFont,
    pub title_size: f32,
    pub body_font: BaseFont,
    pub body_size: f32,
}

impl PageGeometry {
    pub const A4_WIDTH: f32 = 595.2756;
    pub const A4_HEIGHT: f32 = 841.8898;

    pub fn a4() -> Self {
        Self {
            width: Self::A4_WIDTH,
            height: Self::A4_HEIGHT,
            margin_left: 30.0,
            margin_right: 30.0,
            title_offset: 30.0,
            rule_offset: 60.0,
            body_offset: 75.0,
            continuation_offset: 60.0,
            line_height: 16.0,
            record_gap: 32.0,
            bottom_margin: 20.0,
            gutter: 10.0,
            title_font: BaseFont::CourierBold,
            title_size: 16.0,
            body_font: BaseFont::Helvetica,
            body_size: 12.0,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    /// A single text run; `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        font: BaseFont,
        size: f32,
        text: String,
    },
    /// A horizontal line from `x1` to `x2`.
    Rule { x1: f32, x2: f32, y: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<PageElement>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The text runs of this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32, f32)> {
        self.elements.iter().filter_map(|el| match el {
            PageElement::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
            PageElement::Rule { .. } => None,
        })
    }
}

/// A group laid out and ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: String,
    pub pages: Vec<Page>,
    pub page_width: f32,
    pub page_height: f32,
}

/// Tracks the vertical position and the pages filled so far.
struct PageCursor<'g> {
    geometry: &'g PageGeometry,
    finished: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'g> PageCursor<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            finished: Vec::new(),
            current: Page::default(),
            y: geometry.height - geometry.body_offset,
        }
    }

    fn push(&mut self, element: PageElement) {
        self.current.elements.push(element);
    }

    /// Moves the cursor down and starts a new page when it crosses the bottom margin.
    /// Continuation pages carry no title band.
    fn advance(&mut self, dy: f32) {
        self.y -= dy;
        if self.y < self.geometry.bottom_margin {
            if !self.current.is_empty() {
                self.finished.push(mem::take(&mut self.current));
            }
            self.y = self.geometry.height - self.geometry.continuation_offset;
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.finished.is_empty() {
            self.finished.push(self.current);
        }
        self.finished
    }
}

pub struct PageLayoutEngine {
    geometry: PageGeometry,
}

impl Default for PageLayoutEngine {
    fn default() -> Self {
        Self::new(PageGeometry::a4())
    }
}

impl PageLayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    /// X position of the value column. It depends only on the configured column names,
    /// never on which fields a record actually has.
    pub fn value_column_x(&self, columns: &[String]) -> f32 {
        let g = &self.geometry;
        let widest = columns
            .iter()
            .map(|name| g.body_font.text_width(name, g.body_size))
            .fold(0.0_f32, f32::max);
        g.margin_left + widest + g.gutter
    }

    pub fn layout(&self, grouping_column: &str, columns: &[String], group: &Group) -> LaidOutDocument {
        let g = &self.geometry;
        let value_x = self.value_column_x(columns);
        let mut cursor = PageCursor::new(g);

        cursor.push(PageElement::Text {
            x: g.margin_left,
            y: g.height - g.title_offset,
            font: g.title_font,
            size: g.title_size,
            text: format!("{}: {}", grouping_column, group.key),
        });
        cursor.push(PageElement::Rule {
            x1: g.margin_left,
            x2: g.width - g.margin_right,
            y: g.height - g.rule_offset,
        });

        for record in &group.records {
            for column in columns {
                let Some(value) = record.get(column) else {
                    continue;
                };
                let y = cursor.y;
                cursor.push(PageElement::Text {
                    x: g.margin_left,
                    y,
                    font: g.body_font,
                    size: g.body_size,
                    text: column.clone(),
                });
                cursor.push(PageElement::Text {
                    x: value_x,
                    y,
                    font: g.body_font,
                    size: g.body_size,
                    text: format!(": {}", value),
                });
                cursor.advance(g.line_height);
            }
            cursor.advance(g.record_gap);
        }

        LaidOutDocument {
            title: group.key.clone(),
            pages: cursor.finish(),
            page_width: g.width,
            page_height: g.height,
        }
    }
}

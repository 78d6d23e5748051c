use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::layout::FormContent;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN_LEFT: i64 = 54;
const TOP_BASELINE: i64 = 738;
const LINE_HEIGHT: i64 = 14;
const FOOTER_BASELINE: i64 = 36;

/// Lines of body text that fit between the top margin and the footer.
pub const LINES_PER_PAGE: usize = 46;
/// Wrap width in characters for 10pt Helvetica across the printable width.
pub const WRAP_COLUMNS: usize = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
    Blank,
}

impl Style {
    fn font(self) -> (&'static str, i64) {
        match self {
            Style::Title => ("F2", 13),
            Style::Heading => ("F2", 10),
            Style::Body | Style::Blank => ("F1", 10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    style: Style,
    text: String,
}

impl Line {
    fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(Style::Blank, "")
    }
}

/// Render form content to PDF bytes.
///
/// No creation date or document id is written, so identical content yields identical bytes.
pub fn render_pdf(content: &FormContent) -> Result<Vec<u8>, lopdf::Error> {
    let lines = flatten(content);
    let pages: Vec<&[Line]> = lines.chunks(LINES_PER_PAGE).collect();
    let page_count = pages.len().max(1);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let footer_label = content.form.code().to_ascii_uppercase();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for (index, page_lines) in pages.iter().enumerate() {
        let footer = format!("{footer_label}    Page {} of {}", index + 1, page_count);
        let stream = page_stream(page_lines, &footer)?;
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Number of pages `render_pdf` will produce for this content.
pub fn page_count(content: &FormContent) -> usize {
    flatten(content).len().div_ceil(LINES_PER_PAGE).max(1)
}

fn flatten(content: &FormContent) -> Vec<Line> {
    let mut lines = Vec::new();
    for caption in &content.caption {
        lines.push(Line::new(Style::Heading, pdf_text(caption)));
    }
    lines.push(Line::blank());
    for wrapped in wrap(&pdf_text(&content.title), WRAP_COLUMNS - 20) {
        lines.push(Line::new(Style::Title, wrapped));
    }

    for section in &content.sections {
        lines.push(Line::blank());
        if let Some(heading) = &section.heading {
            lines.push(Line::new(Style::Heading, pdf_text(heading)));
        }
        for paragraph in &section.paragraphs {
            for wrapped in wrap(&pdf_text(paragraph), WRAP_COLUMNS) {
                lines.push(Line::new(Style::Body, wrapped));
            }
        }
    }
    lines
}

fn page_stream(lines: &[Line], footer: &str) -> Result<Stream, lopdf::Error> {
    let mut operations = Vec::with_capacity(lines.len() * 5 + 5);
    let mut baseline = TOP_BASELINE;

    for line in lines {
        if line.style != Style::Blank {
            let (font, size) = line.style.font();
            operations.extend(text_at(font, size, MARGIN_LEFT, baseline, &line.text));
        }
        baseline -= LINE_HEIGHT;
    }
    operations.extend(text_at("F1", 8, MARGIN_LEFT, FOOTER_BASELINE, footer));

    let content = Content { operations };
    Ok(Stream::new(dictionary! {}, content.encode()?))
}

fn text_at(font: &str, size: i64, x: i64, y: i64, text: &str) -> [Operation; 5] {
    [
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(win_ansi_bytes(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(width)
                .map(|(index, _)| index)
                .unwrap_or(word.len());
            let rest = word.split_off(split_at);
            lines.push(word);
            word = rest;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Standard Type1 fonts only cover WinAnsi: Latin-1 plus the CP1252 punctuation block.
/// Anything else becomes `?`.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{00A0}' | '\t' | '\n' | '\r' => ' ',
            ch if win_ansi_byte(ch).is_some() => ch,
            _ => '?',
        })
        .collect()
}

fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| win_ansi_byte(ch).unwrap_or(b'?'))
        .collect()
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = u32::from(ch);
    match code {
        0x20..=0x7E | 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => CP1252_EXTRAS
            .iter()
            .find(|(extra, _)| *extra == ch)
            .map(|(_, byte)| *byte),
    }
}

const CP1252_EXTRAS: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

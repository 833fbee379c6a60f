//! Flow layout of region blocks into an SVG document.

use std::fmt::Write as _;

use unicode_width::UnicodeWidthChar;

/// An image decoded and re-encoded for inlining
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// `data:image/png;base64,...`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// A region node ready for layout; remote images are already resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Subheading(String),
    Paragraph(String),
    List { ordered: bool, items: Vec<String> },
    Image(InlineImage),
    Control(String),
}

/// Layout metrics in CSS pixels
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub width: f32,
    pub padding: f32,
    pub gap: f32,
    pub max_image_height: f32,
    pub font_family: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 640.0,
            padding: 24.0,
            gap: 12.0,
            max_image_height: 360.0,
            font_family: "sans-serif".to_string(),
        }
    }
}

/// Laid-out SVG plus its size in CSS pixels
#[derive(Debug, Clone)]
pub struct SvgLayout {
    pub svg: String,
    pub width: f32,
    pub height: f32,
}

struct TextStyle {
    size: f32,
    line_height: f32,
    weight: &'static str,
    fill: &'static str,
}

const HEADING: TextStyle = TextStyle {
    size: 26.0,
    line_height: 34.0,
    weight: "bold",
    fill: "#1f1f1f",
};
const SUBHEADING: TextStyle = TextStyle {
    size: 16.0,
    line_height: 22.0,
    weight: "bold",
    fill: "#555555",
};
const BODY: TextStyle = TextStyle {
    size: 14.0,
    line_height: 20.0,
    weight: "normal",
    fill: "#222222",
};
const CONTROL: TextStyle = TextStyle {
    size: 12.0,
    line_height: 18.0,
    weight: "normal",
    fill: "#333333",
};

/// Average glyph advance relative to font size
const GLYPH_RATIO: f32 = 0.55;
/// Advance of double-width glyphs (Hangul, CJK, fullwidth forms)
const WIDE_GLYPH_RATIO: f32 = 1.0;
const LIST_INDENT: f32 = 16.0;

/// Lay blocks out top to bottom on a white page.
pub fn layout(blocks: &[Block], options: &LayoutOptions) -> SvgLayout {
    let content_width = (options.width - 2.0 * options.padding).max(1.0);
    let left = options.padding;
    let mut body = String::new();
    let mut y = options.padding;

    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            y += options.gap;
        }
        match block {
            Block::Heading(text) => {
                y = text_lines(&mut body, &wrap(text, content_width, &HEADING), left, y, &HEADING, options);
            }
            Block::Subheading(text) => {
                y = text_lines(&mut body, &wrap(text, content_width, &SUBHEADING), left, y, &SUBHEADING, options);
            }
            Block::Paragraph(text) => {
                let lines: Vec<String> = text
                    .lines()
                    .flat_map(|line| wrap(line, content_width, &BODY))
                    .collect();
                y = text_lines(&mut body, &lines, left, y, &BODY, options);
            }
            Block::List { ordered, items } => {
                for (n, item) in items.iter().enumerate() {
                    let marker = if *ordered { format!("{}.", n + 1) } else { "•".to_string() };
                    let lines = wrap(item, content_width - LIST_INDENT, &BODY);
                    text_lines(&mut body, &[marker], left, y, &BODY, options);
                    y = text_lines(&mut body, &lines, left + LIST_INDENT, y, &BODY, options);
                }
            }
            Block::Image(image) => {
                let (w, h) = fit(image, content_width, options.max_image_height);
                let x = left + (content_width - w) / 2.0;
                let _ = write!(
                    body,
                    r#"<image x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" preserveAspectRatio="xMidYMid meet" xlink:href="{}"/>"#,
                    image.data_uri
                );
                y += h;
            }
            Block::Control(label) => {
                let width = text_width(label, CONTROL.size) + 16.0;
                let height = CONTROL.line_height + 8.0;
                let _ = write!(
                    body,
                    r##"<rect x="{left:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" rx="4" fill="none" stroke="#999999"/>"##
                );
                text_lines(&mut body, &[label.clone()], left + 8.0, y + 4.0, &CONTROL, options);
                y += height;
            }
        }
    }

    let height = (y + options.padding).ceil();
    let width = options.width;
    let mut svg = String::with_capacity(body.len() + 256);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = write!(svg, r#"<rect x="0" y="0" width="{width}" height="{height}" fill="white"/>"#);
    svg.push_str(&body);
    svg.push_str("</svg>");

    SvgLayout { svg, width, height }
}

fn text_lines(
    out: &mut String,
    lines: &[String],
    x: f32,
    top: f32,
    style: &TextStyle,
    options: &LayoutOptions,
) -> f32 {
    let mut y = top;
    for line in lines {
        // Baseline sits roughly 3/4 down the line box
        let baseline = y + style.line_height * 0.75;
        let _ = write!(
            out,
            r#"<text x="{x:.2}" y="{baseline:.2}" font-family="{}" font-size="{}" font-weight="{}" fill="{}">{}</text>"#,
            escape(&options.font_family),
            style.size,
            style.weight,
            style.fill,
            escape(line)
        );
        y += style.line_height;
    }
    y
}

/// Greedy word wrap by estimated glyph width.
fn glyph_width(c: char, size: f32) -> f32 {
    match c.width() {
        Some(2) => size * WIDE_GLYPH_RATIO,
        Some(0) => 0.0,
        _ => size * GLYPH_RATIO,
    }
}

/// Estimated advance of `text` at `size`
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(|c| glyph_width(c, size)).sum()
}

/// Longest prefix of `word` that fits in `width`; never empty
fn split_at_width(word: &str, width: f32, size: f32) -> (String, String) {
    let mut used = 0.0;
    let mut end = 0;
    for (index, c) in word.char_indices() {
        let advance = glyph_width(c, size);
        if end > 0 && used + advance > width {
            break;
        }
        used += advance;
        end = index + c.len_utf8();
    }
    (word[..end].to_string(), word[end..].to_string())
}

fn wrap(text: &str, width: f32, style: &TextStyle) -> Vec<String> {
    let space = glyph_width(' ', style.size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        let mut word_width = text_width(&word, style.size);
        while word_width > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            let (head, rest) = split_at_width(&word, width, style.size);
            lines.push(head);
            word = rest;
            word_width = text_width(&word, style.size);
        }
        if word.is_empty() {
            continue;
        }

        if !current.is_empty() && current_width + space + word_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += space;
        }
        current.push_str(&word);
        current_width += word_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn fit(image: &InlineImage, max_width: f32, max_height: f32) -> (f32, f32) {
    let (iw, ih) = (image.width.max(1) as f32, image.height.max(1) as f32);
    let mut w = max_width.min(iw);
    let mut h = w * ih / iw;
    if h > max_height {
        h = max_height;
        w = h * iw / ih;
    }
    (w, h)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

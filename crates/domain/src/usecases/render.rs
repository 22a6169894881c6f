//! Rendering use case - lays out a phrase on the fixed template and hands it to the backend

use serde::{Deserialize, Serialize};

use crate::model::{Color, ImageArtifact, ImageLayout, LogoSlot, PhraseEntry, PlacedLine, TextRole};
use crate::naming;
use crate::ports::{RenderBackend, RenderError};

/// Parameters of the image template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    /// Width and height of the square canvas
    pub canvas_size: u32,
    pub background: Color,
    pub text_color: Color,
    pub hashtag_color: Color,
    pub footer_color: Color,
    /// Headline font size in pixels
    pub text_size: f32,
    pub hashtag_size: f32,
    pub footer_size: f32,
    /// Vertical distance between headline lines
    pub line_height: f32,
    /// Maximum measured width of any line
    pub max_text_width: f32,
    /// Top of the first headline line
    pub text_top: f32,
    /// Space between the headline block and the hashtags
    pub hashtag_gap: f32,
    /// Space between the hashtags and the footer
    pub footer_gap: f32,
    pub logo_top: u32,
    pub logo_max_width: u32,
    /// Phrase characters kept in the artifact label
    pub label_max_chars: usize,
    pub jpeg_quality: u8,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            canvas_size: 1080,
            background: Color::rgb(0x1F, 0x2A, 0x44),
            text_color: Color::WHITE,
            hashtag_color: Color::rgb(0xF2, 0xC1, 0x4E),
            footer_color: Color::rgb(0xC8, 0xC8, 0xC8),
            text_size: 64.0,
            hashtag_size: 36.0,
            footer_size: 28.0,
            line_height: 80.0,
            max_text_width: 880.0,
            text_top: 360.0,
            hashtag_gap: 50.0,
            footer_gap: 90.0,
            logo_top: 80,
            logo_max_width: 240,
            label_max_chars: naming::DEFAULT_LABEL_CHARS,
            jpeg_quality: 95,
        }
    }
}

/// Greedy word-wrap.
///
/// Words are appended to the current line until the measured width of the
/// next candidate exceeds `max_width`. A word that is wider than `max_width`
/// on its own still gets a line of its own.
pub fn wrap_words<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Renders phrase entries into image artifacts
pub struct ImageRenderer<'a, B: RenderBackend + ?Sized> {
    backend: &'a B,
    template: Template,
}

impl<'a, B: RenderBackend + ?Sized> ImageRenderer<'a, B> {
    pub fn new(backend: &'a B, template: Template) -> Self {
        Self { backend, template }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Render one entry. Blank phrases yield `Ok(None)`.
    pub fn render(
        &self,
        entry: &PhraseEntry,
        sequence_index: u32,
    ) -> Result<Option<ImageArtifact>, RenderError> {
        let Some(layout) = self.layout(entry) else {
            return Ok(None);
        };

        let bytes = self.backend.render(&layout)?;

        Ok(Some(ImageArtifact {
            sequence_index,
            source_text: entry.text.clone(),
            label: naming::sanitize_label(&entry.text, self.template.label_max_chars),
            bytes,
        }))
    }

    /// Compute the layout for an entry without drawing it
    pub fn layout(&self, entry: &PhraseEntry) -> Option<ImageLayout> {
        let headline = entry.normalized_text();
        if headline.is_empty() {
            return None;
        }

        let t = &self.template;
        let mut lines = Vec::new();

        let consumed = self.place_block(
            &mut lines,
            &headline,
            TextRole::Headline,
            t.text_size,
            t.text_color,
            t.text_top,
        );
        let mut cursor = t.text_top + consumed;

        let hashtags = entry.hashtag_line.trim();
        if !hashtags.is_empty() {
            cursor += t.hashtag_gap;
            cursor += self.place_block(
                &mut lines,
                hashtags,
                TextRole::Hashtag,
                t.hashtag_size,
                t.hashtag_color,
                cursor,
            );
        }

        let footer = entry.footer_line.trim();
        if !footer.is_empty() {
            cursor += t.footer_gap;
            self.place_block(
                &mut lines,
                footer,
                TextRole::Footer,
                t.footer_size,
                t.footer_color,
                cursor,
            );
        }

        Some(ImageLayout {
            canvas_size: t.canvas_size,
            background: t.background,
            logo: LogoSlot {
                top: t.logo_top,
                max_width: t.logo_max_width,
            },
            lines,
            jpeg_quality: t.jpeg_quality,
        })
    }

    /// Wrap and center a block of text starting at `top`, returns its height
    fn place_block(
        &self,
        out: &mut Vec<PlacedLine>,
        text: &str,
        role: TextRole,
        size: f32,
        color: Color,
        top: f32,
    ) -> f32 {
        let line_height = self.line_height_for(size);
        let measure = |s: &str| self.backend.measure_text_width(s, size);
        let wrapped = wrap_words(text, self.template.max_text_width, measure);
        let center = self.template.canvas_size as f32 / 2.0;

        for (i, line) in wrapped.iter().enumerate() {
            let width = self.backend.measure_text_width(line, size);
            out.push(PlacedLine {
                role,
                text: line.clone(),
                x: (center - width / 2.0).max(0.0),
                y: top + i as f32 * line_height,
                size,
                color,
                width,
            });
        }

        wrapped.len() as f32 * line_height
    }

    /// Headline uses the template line height, smaller roles scale it down
    fn line_height_for(&self, size: f32) -> f32 {
        let t = &self.template;
        if t.text_size <= 0.0 {
            return t.line_height;
        }
        t.line_height * (size / t.text_size)
    }
}

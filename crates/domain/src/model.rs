//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::naming;

/// One row of the phrase input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseEntry {
    /// Headline phrase (blank means the row is skipped)
    pub text: String,
    /// Hashtag line rendered below the phrase
    #[serde(default)]
    pub hashtag_line: String,
    /// Footer line rendered at the bottom
    #[serde(default)]
    pub footer_line: String,
}

impl PhraseEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_hashtags(mut self, hashtags: impl Into<String>) -> Self {
        self.hashtag_line = hashtags.into();
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer_line = footer.into();
        self
    }

    /// Headline text as it is drawn: trimmed and upper-cased
    pub fn normalized_text(&self) -> String {
        self.text.trim().to_uppercase()
    }

    pub fn is_blank(&self) -> bool {
        self.normalized_text().is_empty()
    }
}

/// A rendered image ready to be persisted
#[derive(Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    /// 1-based position of the source row
    pub sequence_index: u32,
    /// Phrase the image was rendered from
    pub source_text: String,
    /// Filesystem-safe label derived from the phrase
    pub label: String,
    /// Encoded JPEG bytes
    pub bytes: Vec<u8>,
}

impl ImageArtifact {
    pub fn file_name(&self) -> String {
        naming::artifact_file_name(self.sequence_index, &self.label)
    }
}

impl fmt::Debug for ImageArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageArtifact")
            .field("sequence_index", &self.sequence_index)
            .field("source_text", &self.source_text)
            .field("label", &self.label)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Identifier of a persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// File name inside the content directory
    pub name: String,
    /// Index parsed from the name, if it carries one
    pub sequence_index: Option<u32>,
}

impl ArtifactRef {
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let sequence_index = naming::parse_sequence_index(&name);
        Self {
            name,
            sequence_index,
        }
    }
}

impl Ord for ArtifactRef {
    // Numbered names first in numeric order, then unnumbered names by name.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sequence_index, other.sequence_index) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.name.cmp(&other.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
        }
    }
}

impl PartialOrd for ArtifactRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 24-bit RGB color, written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid color '{0}': expected #RRGGBB")]
pub struct ColorParseError(String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Which template slot a line of text belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    Headline,
    Hashtag,
    Footer,
}

/// A single line of text, positioned on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub role: TextRole,
    pub text: String,
    /// Left edge in pixels
    pub x: f32,
    /// Top edge in pixels
    pub y: f32,
    /// Font size in pixels
    pub size: f32,
    pub color: Color,
    /// Measured width in pixels
    pub width: f32,
}

/// Area reserved for the logo, if the backend has one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoSlot {
    pub top: u32,
    pub max_width: u32,
}

/// Everything a render backend needs to draw one image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayout {
    pub canvas_size: u32,
    pub background: Color,
    pub logo: LogoSlot,
    pub lines: Vec<PlacedLine>,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl ImageLayout {
    pub fn lines_for(&self, role: TextRole) -> impl Iterator<Item = &PlacedLine> {
        self.lines.iter().filter(move |l| l.role == role)
    }
}

/// Media handed to a publisher
#[derive(Clone)]
pub struct MediaPost {
    pub artifact_name: String,
    pub image: Vec<u8>,
    pub caption: String,
}

impl fmt::Debug for MediaPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPost")
            .field("artifact_name", &self.artifact_name)
            .field("image", &self.image.len())
            .field("caption", &self.caption)
            .finish()
    }
}

/// Ledger row for a confirmed publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Artifact file name
    pub artifact_name: String,
    /// Index parsed from the artifact name
    pub sequence_index: Option<u32>,
    /// SHA-256 of the published bytes
    pub content_hash: String,
    /// Remote media ID
    pub remote_id: String,
    /// Remote URL, if the platform returned one
    pub remote_url: Option<String>,
    /// Caption sent with the image
    pub caption: String,
    /// When published
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

/// Outcome of one generation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Rows read from the source
    pub entries: usize,
    /// Artifacts rendered and persisted
    pub generated: usize,
    /// Rows with blank phrase text
    pub skipped: usize,
    /// Rows whose rendering failed
    pub render_failed: usize,
    /// Artifacts that rendered but could not be written
    pub store_failed: usize,
    /// Persisted artifacts in source order
    pub artifacts: Vec<ArtifactRef>,
}

impl GenerationReport {
    pub fn failed(&self) -> usize {
        self.render_failed + self.store_failed
    }
}

/// Outcome of a successful publication cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub artifact: ArtifactRef,
    pub caption: String,
    /// Remote ID, absent in dry-run mode
    pub remote_id: Option<String>,
    pub remote_url: Option<String>,
    pub dry_run: bool,
}

/// Last publication attempt, kept for status reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishAttempt {
    #[serde(with = "time::serde::rfc3339")]
    pub attempted_at: OffsetDateTime,
    pub artifact: Option<String>,
    pub success: bool,
    pub message: String,
}

/// Point-in-time view of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub images_generated: usize,
    pub images_published: usize,
    pub images_pending: usize,
    pub credentials_configured: bool,
    pub next_artifact: Option<String>,
    pub last_generation: Option<GenerationReport>,
    pub last_publish: Option<PublishAttempt>,
}

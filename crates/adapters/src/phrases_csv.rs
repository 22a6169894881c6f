//! CSV phrase source

use async_trait::async_trait;
use phrasecast_domain::{PhraseEntry, PhraseSource, SourceError};
use std::path::{Path, PathBuf};

const TEXT_COLUMN: &str = "Frase";
const HASHTAG_COLUMN: &str = "Hashtag";
const FOOTER_COLUMN: &str = "Footer";

/// Reads phrase rows from a CSV file with a header row
pub struct CsvPhraseSource {
    path: PathBuf,
}

impl CsvPhraseSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PhraseSource for CsvPhraseSource {
    async fn load(&self) -> Result<Vec<PhraseEntry>, SourceError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError::NotFound(format!("{}: {}", self.path.display(), e)))?;

        let entries = parse_phrases(&data)?;
        tracing::debug!(path = %self.path.display(), rows = entries.len(), "Read phrase file");
        Ok(entries)
    }
}

/// Parse CSV bytes into entries, preserving row order.
///
/// Headers are matched after trimming and ignoring case. Missing columns
/// and short rows read as empty strings. Invalid UTF-8 is replaced with
/// U+FFFD so one bad row never costs the others their index.
pub fn parse_phrases(data: &[u8]) -> Result<Vec<PhraseEntry>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| SourceError::Parse {
            row: 0,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
    };
    let text_col = column(TEXT_COLUMN);
    let hashtag_col = column(HASHTAG_COLUMN);
    let footer_col = column(FOOTER_COLUMN);

    if text_col.is_none() {
        tracing::warn!(column = TEXT_COLUMN, "Phrase column missing, every row will be blank");
    }

    let mut entries = Vec::new();
    for (i, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| SourceError::Parse {
            row: i + 1,
            message: e.to_string(),
        })?;

        if std::str::from_utf8(record.as_slice()).is_err() {
            tracing::warn!(row = i + 1, "Row is not valid UTF-8, replacing invalid bytes");
        }

        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };

        entries.push(PhraseEntry {
            text: field(text_col),
            hashtag_line: field(hashtag_col),
            footer_line: field(footer_col),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parses_all_columns_in_order() {
        let data = "Frase,Hashtag,Footer\nhola mundo,#hola,@cuenta\nadiós,,\n";
        let entries = parse_phrases(data.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "hola mundo");
        assert_eq!(entries[0].hashtag_line, "#hola");
        assert_eq!(entries[0].footer_line, "@cuenta");
        assert_eq!(entries[1].text, "adiós");
        assert!(entries[1].hashtag_line.is_empty());
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let data = " frase , HASHTAG \nuno,#a\n";
        let entries = parse_phrases(data.as_bytes()).unwrap();

        assert_eq!(entries[0].text, "uno");
        assert_eq!(entries[0].hashtag_line, "#a");
        assert_eq!(entries[0].footer_line, "");
    }

    #[test]
    fn test_blank_rows_are_kept() {
        let data = "Frase\nprimera\n\"\"\ntercera\n";
        let entries = parse_phrases(data.as_bytes()).unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries[1].is_blank());
    }

    #[test]
    fn test_quoted_commas() {
        let data = "Frase,Footer\n\"uno, dos y tres\",pie\n";
        let entries = parse_phrases(data.as_bytes()).unwrap();

        assert_eq!(entries[0].text, "uno, dos y tres");
        assert_eq!(entries[0].footer_line, "pie");
    }

    #[test]
    fn test_invalid_utf8_row_keeps_its_slot() {
        let data = b"Frase\nuno\ndos \xff\ntres\ncuatro\n";
        let entries = parse_phrases(data).unwrap();

        let texts: Vec<_> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["uno", "dos \u{fffd}", "tres", "cuatro"]);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frases.csv");
        std::fs::write(&path, "Frase,Hashtag\nbuenos días,#mañana\n").unwrap();

        let entries = CsvPhraseSource::new(&path).load().await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].normalized_text(), "BUENOS DÍAS");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = CsvPhraseSource::new(dir.path().join("missing.csv"));

        let result = source.load().await;

        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }
}

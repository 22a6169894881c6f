//! Artifact file naming.
//!
//! Artifacts are named `{index}_{label}.jpg` where `index` is the 1-based
//! source row zero-padded to [`INDEX_WIDTH`] digits, and `label` is the first
//! characters of the upper-cased phrase with everything outside `[A-Za-z0-9]`
//! replaced by `_`.
//!
//! Zero-padding keeps plain lexicographic listings in numeric order up to
//! 9999 rows. Listings still sort on the parsed index, so names written by
//! other tools (`1_x.jpg`, `10_x.jpg`) order correctly too.

/// Extension of generated artifacts
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Digits used for the index prefix
pub const INDEX_WIDTH: usize = 4;

/// Default number of phrase characters kept in a label
pub const DEFAULT_LABEL_CHARS: usize = 30;

/// Derive a filesystem-safe label from a phrase.
pub fn sanitize_label(phrase: &str, max_chars: usize) -> String {
    phrase
        .trim()
        .to_uppercase()
        .chars()
        .take(max_chars)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Build the file name for an artifact.
pub fn artifact_file_name(sequence_index: u32, label: &str) -> String {
    format!(
        "{:0width$}_{}.{}",
        sequence_index,
        label,
        ARTIFACT_EXTENSION,
        width = INDEX_WIDTH
    )
}

/// Parse the leading numeric index from an artifact name.
///
/// - `"0003_HOLA.jpg"` → `Some(3)`
/// - `"12_X.jpg"` → `Some(12)`
/// - `"cover.jpg"` → `None`
pub fn parse_sequence_index(name: &str) -> Option<u32> {
    let digits: &str = {
        let end = name
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(name.len());
        &name[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let rest = &name[digits.len()..];
    if !(rest.is_empty() || rest.starts_with('_') || rest.starts_with('.')) {
        return None;
    }
    digits.parse().ok()
}

/// Whether a file name looks like a generated artifact.
pub fn is_artifact_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty()
                && (ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_replaces_non_alphanumerics() {
        assert_eq!(sanitize_label("¡Hola, mundo!", 30), "_HOLA__MUNDO_");
    }

    #[test]
    fn label_truncates_to_max_chars() {
        let label = sanitize_label("el viaje es la recompensa y el camino tambien", 30);
        assert_eq!(label.chars().count(), 30);
        assert_eq!(label, "EL_VIAJE_ES_LA_RECOMPENSA_Y_EL");
    }

    #[test]
    fn label_replaces_accented_letters() {
        assert_eq!(sanitize_label("año", 30), "A_O");
    }

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(artifact_file_name(3, "HOLA"), "0003_HOLA.jpg");
        assert_eq!(artifact_file_name(12345, "X"), "12345_X.jpg");
    }

    #[test]
    fn zero_padded_names_sort_lexicographically() {
        let mut names = vec![artifact_file_name(10, "A"), artifact_file_name(2, "B")];
        names.sort();
        assert_eq!(names, vec!["0002_B.jpg", "0010_A.jpg"]);
    }

    #[test]
    fn parses_leading_index() {
        assert_eq!(parse_sequence_index("0003_HOLA.jpg"), Some(3));
        assert_eq!(parse_sequence_index("12_X.jpg"), Some(12));
        assert_eq!(parse_sequence_index("7.jpg"), Some(7));
        assert_eq!(parse_sequence_index("cover.jpg"), None);
        assert_eq!(parse_sequence_index("2024-01-01.jpg"), None);
    }

    #[test]
    fn recognizes_artifact_extensions() {
        assert!(is_artifact_file("0001_A.jpg"));
        assert!(is_artifact_file("0001_A.JPEG"));
        assert!(!is_artifact_file("0001_A.png"));
        assert!(!is_artifact_file(".jpg"));
        assert!(!is_artifact_file("notes"));
    }
}

//! Splitting model output into individual pieces.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)---(?:POST|THREAD|CAPTION|EMAIL|ARTICLE|SCRIPT|QUOTE|SUMMARY)\s*\d*---").ok()
});

/// Splits a generation response on `---POST 1---`-style separators.
///
/// Blank parts are dropped. When at least `count` parts remain the first
/// `count` are returned trimmed; otherwise the whole response is returned
/// as a single piece.
#[must_use]
pub fn parse_content_response(response: &str, count: usize) -> Vec<String> {
    let whole = || vec![response.trim().to_string()];

    let Some(separator) = SEPARATOR.as_ref() else {
        return whole();
    };

    let parts: Vec<&str> = separator
        .split(response)
        .filter(|part| !part.trim().is_empty())
        .collect();

    if parts.len() >= count {
        parts
            .into_iter()
            .take(count)
            .map(|part| part.trim().to_string())
            .collect()
    } else {
        whole()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_numbered_sections() {
        let response = "---POST 1---\nFirst post.\n\n---POST 2---\nSecond post.\n---POST 3---\nThird.";
        assert_eq!(
            parse_content_response(response, 2),
            vec!["First post.", "Second post."]
        );
    }

    #[test]
    fn test_case_insensitive_and_unnumbered() {
        let response = "Intro line\n---summary---\nThe summary body";
        assert_eq!(
            parse_content_response(response, 2),
            vec!["Intro line", "The summary body"]
        );
    }

    #[test]
    fn test_spacing_before_number() {
        let response = "---THREAD   12---\n1/ hello\n---Thread 13---\n1/ again";
        assert_eq!(parse_content_response(response, 2).len(), 2);
    }

    #[test]
    fn test_too_few_parts_returns_whole_response() {
        let response = "  ---QUOTE 1---\n\"Ship it.\"  \n";
        assert_eq!(
            parse_content_response(response, 3),
            vec!["---QUOTE 1---\n\"Ship it.\""]
        );
    }

    #[test]
    fn test_no_separators() {
        assert_eq!(
            parse_content_response("  just text  ", 1),
            vec!["just text"]
        );
    }

    #[test]
    fn test_unrelated_markers_do_not_split() {
        let response = "---VIDEO 1---\nnot a separator";
        assert_eq!(parse_content_response(response, 1), vec![response.trim()]);
    }
}

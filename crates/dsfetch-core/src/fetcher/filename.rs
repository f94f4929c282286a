//! Local file name for a download, taken from the URL path.

/// Returns the last non-empty path segment of `url`, ignoring query and
/// fragment. `None` when the URL does not parse or has no usable segment.
pub fn archive_file_name(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    match segment {
        "." | ".." => None,
        s if s.contains('\\') => None,
        s => Some(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment() {
        assert_eq!(
            archive_file_name("https://bop.example.org/data/lm_base.zip").as_deref(),
            Some("lm_base.zip")
        );
        assert_eq!(
            archive_file_name("http://127.0.0.1:8080/tless_models.zip?dl=1#x").as_deref(),
            Some("tless_models.zip")
        );
    }

    #[test]
    fn trailing_slash_uses_previous_segment() {
        assert_eq!(
            archive_file_name("https://example.org/archives/ycbv/").as_deref(),
            Some("ycbv")
        );
    }

    #[test]
    fn unusable_urls() {
        assert_eq!(archive_file_name("https://example.org/"), None);
        assert_eq!(archive_file_name("https://example.org"), None);
        assert_eq!(archive_file_name("not a url"), None);
        assert_eq!(archive_file_name("mailto:someone@example.org"), None);
    }
}

use crate::error::Error;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r#"[<>:"|?*/\\\x00-\x1f\x7f]"#).unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Make one path segment safe to create on any common filesystem.
///
/// Leading `_`/`.` are stripped so a user-supplied name can never collide
/// with the reserved sidecar namespace.
pub fn sanitize_segment(segment: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(segment, " ");
    let replaced = UNSAFE_CHARS.replace_all(&collapsed, "_");
    replaced
        .trim()
        .trim_start_matches(|c| c == '.' || c == '_')
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Sanitize a suggested, possibly nested, folder path into `/`-joined
/// segments. `..` is rejected; an empty result falls back to `default_folder`.
pub fn sanitize_folder_path(raw: &str, default_folder: &str) -> Result<String, Error> {
    let mut segments = Vec::new();
    for segment in raw.split(|c| c == '/' || c == '\\') {
        let trimmed = segment.trim();
        if trimmed == ".." {
            return Err(Error::validation(format!(
                "folder path '{}' escapes the organize root",
                raw
            )));
        }
        let clean = sanitize_segment(trimmed);
        if !clean.is_empty() {
            segments.push(clean);
        }
    }

    if segments.is_empty() {
        let fallback = sanitize_segment(default_folder);
        if fallback.is_empty() {
            return Err(Error::validation("no usable folder name"));
        }
        return Ok(fallback);
    }
    Ok(segments.join("/"))
}

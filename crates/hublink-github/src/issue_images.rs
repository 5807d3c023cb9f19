//! Image-URL extraction from issue bodies for attachment rendering.

use std::collections::HashSet;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg"];

/// Pattern-extracts embedded image URLs (markdown links and bare URLs) from
/// an issue body, deduplicated in order of first appearance.
pub fn extract_image_urls(body: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    for token in body.split_whitespace() {
        if let Some(markdown_url) = extract_markdown_link_url(token) {
            push_image_url(markdown_url, &mut urls, &mut seen);
        }
        push_image_url(token, &mut urls, &mut seen);
    }
    urls
}

fn extract_markdown_link_url(token: &str) -> Option<&str> {
    let start = token.find("](")?;
    let remainder = &token[start + 2..];
    let end = remainder.find(')')?;
    Some(&remainder[..end])
}

fn push_image_url(raw: &str, urls: &mut Vec<String>, seen: &mut HashSet<String>) {
    let candidate = raw.trim_matches(|ch: char| {
        matches!(
            ch,
            '"' | '\'' | '<' | '>' | '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';' | '!'
        )
    });
    if !candidate.starts_with("http://") && !candidate.starts_with("https://") {
        return;
    }
    let candidate = candidate.trim_end_matches(['.', ',', ';', ':']);
    if !is_image_url(candidate) {
        return;
    }
    if seen.insert(candidate.to_string()) {
        urls.push(candidate.to_string());
    }
}

fn is_image_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(extension) = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|segment| segment.rsplit('.').next())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|extension| extension.to_ascii_lowercase())
    else {
        return false;
    };
    IMAGE_EXTENSIONS.contains(&extension.as_str())
}

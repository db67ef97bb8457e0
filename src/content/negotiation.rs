//! Response content type negotiation.

use std::path::Path;

const TEXT_PLAIN: &str = "text/plain";
const ANY: &str = "*/*";

/// Derive a response content type from Accept values, falling back to the
/// file extension when the client accepts anything.
pub fn resolve_content_type(file: Option<&Path>, accept: Option<&[String]>) -> String {
    let Some(accept) = accept else {
        return TEXT_PLAIN.to_string();
    };

    if !accept.is_empty() && accept.iter().all(|t| t == ANY) {
        return file.map_or(TEXT_PLAIN, guess_type).to_string();
    }

    accept
        .first()
        .cloned()
        .unwrap_or_else(|| TEXT_PLAIN.to_string())
}

/// Guess a MIME type from the file extension.
pub fn guess_type(file: &Path) -> &'static str {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("js") | Some("javascript") => "text/javascript",
        Some("css") => "text/css",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => TEXT_PLAIN,
    }
}

/// Media type without parameters, e.g. `text/html; charset=utf-8` → `text/html`.
pub fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or(value).trim()
}

/// Does an accepted range (`*/*`, `type/*`, or exact) cover `candidate`?
pub fn accepts(range: &str, candidate: &str) -> bool {
    let range = media_type(range);
    let candidate = media_type(candidate);

    if range == ANY {
        return true;
    }
    match range.strip_suffix("/*") {
        Some(major) => candidate
            .split('/')
            .next()
            .is_some_and(|c| c.eq_ignore_ascii_case(major)),
        None => range.eq_ignore_ascii_case(candidate),
    }
}

/// Pick the type a handler should respond with.
///
/// Walks the accepted ranges in order and returns the first produced type
/// they cover. With nothing produced, falls back to [`resolve_content_type`].
pub fn negotiate_produced(produces: &[String], accept: Option<&[String]>) -> String {
    let Some(first) = produces.first() else {
        return resolve_content_type(None, accept);
    };

    accept
        .into_iter()
        .flatten()
        .find_map(|range| produces.iter().find(|p| accepts(range, p)))
        .unwrap_or(first)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_accept_is_text_plain() {
        assert_eq!(resolve_content_type(Some(Path::new("app.js")), None), "text/plain");
    }

    #[test]
    fn test_wildcard_guesses_from_extension() {
        let accept = list(&["*/*"]);
        assert_eq!(resolve_content_type(Some(Path::new("app.js")), Some(&accept)), "text/javascript");
        assert_eq!(resolve_content_type(Some(Path::new("site.CSS")), Some(&accept)), "text/css");
        assert_eq!(resolve_content_type(Some(Path::new("a/b/photo.jpeg")), Some(&accept)), "image/jpeg");
        assert_eq!(resolve_content_type(Some(Path::new("readme")), Some(&accept)), "text/plain");
        assert_eq!(resolve_content_type(None, Some(&accept)), "text/plain");

        let repeated = list(&["*/*", "*/*"]);
        assert_eq!(resolve_content_type(Some(Path::new("x.gif")), Some(&repeated)), "image/gif");
    }

    #[test]
    fn test_first_accept_verbatim() {
        let accept = list(&["application/json", "*/*"]);
        assert_eq!(resolve_content_type(Some(Path::new("app.js")), Some(&accept)), "application/json");

        let with_params = list(&["text/html;q=0.9"]);
        assert_eq!(resolve_content_type(None, Some(&with_params)), "text/html;q=0.9");
    }

    #[test]
    fn test_empty_accept_is_text_plain() {
        assert_eq!(resolve_content_type(Some(Path::new("app.js")), Some(&[])), "text/plain");
    }

    #[test]
    fn test_guess_type_table() {
        assert_eq!(guess_type(Path::new("x.javascript")), "text/javascript");
        assert_eq!(guess_type(Path::new("x.JPG")), "image/jpeg");
        assert_eq!(guess_type(Path::new("x.png")), "image/png");
        assert_eq!(guess_type(Path::new("x.html")), "text/plain");
    }

    #[test]
    fn test_accepts_ranges() {
        assert!(accepts("*/*", "application/json"));
        assert!(accepts("application/*", "application/json"));
        assert!(accepts("Application/JSON; q=0.5", "application/json"));
        assert!(!accepts("text/*", "application/json"));
        assert!(!accepts("text/html", "application/json"));
    }

    #[test]
    fn test_negotiate_produced() {
        let produces = list(&["application/json", "text/html"]);
        assert_eq!(negotiate_produced(&produces, Some(&list(&["text/html"]))), "text/html");
        assert_eq!(negotiate_produced(&produces, Some(&list(&["image/png", "*/*"]))), "application/json");
        assert_eq!(negotiate_produced(&produces, Some(&list(&["image/png"]))), "application/json");
        assert_eq!(negotiate_produced(&produces, None), "application/json");
        assert_eq!(negotiate_produced(&[], Some(&list(&["text/csv"]))), "text/csv");
        assert_eq!(negotiate_produced(&[], None), "text/plain");
    }
}

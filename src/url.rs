//! URL helpers shared by the route enumerator and the serializers. Site
//! paths in this crate are always site-relative and start with `/`; they
//! become absolute only when joined onto the configured site URL.

use url::form_urlencoded::byte_serialize;
use url::{ParseError, Url};

/// Makes sure `url` ends in a trailing slash. Without it, the last path
/// component is considered to be a "file" name and [`Url::join`] would drop
/// it (e.g. `https://example.org/blog` joined with `posts/a` would give
/// `https://example.org/posts/a`).
pub fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Resolves a site-relative `path` against the site's base URL.
pub fn absolute(base: &Url, path: &str) -> Result<Url, ParseError> {
    base.join(path.trim_start_matches('/'))
}

/// Percent-encodes `label` so it can be used as exactly one path segment.
/// Labels are not slugified: `Rust` and `rust` are distinct labels and must
/// stay distinct routes, and non-ASCII labels must survive intact.
pub fn encode_segment(label: &str) -> String {
    byte_serialize(label.as_bytes())
        .collect::<String>()
        // `byte_serialize` follows form encoding, where a space becomes `+`.
        // A literal `+` is always emitted as `%2B`, so this is unambiguous.
        .replace('+', "%20")
}

// URL helpers shared by the service clients

use once_cell::sync::Lazy;
use regex::Regex;

static REPEATED_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+").unwrap());

static COLLAPSED_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+):/").unwrap());

static FILE_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^file:").unwrap());

static SLASH_BEFORE_QUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\?|&|#[^!])").unwrap());

/// Join URL segments with single slashes
///
/// - `http://host/` + `v1` → `http://host/v1`
/// - the scheme separator (`://`) survives slash collapsing
/// - slashes in front of `?`, `&` or `#` are dropped, and the first query
///   separator becomes `?` with every later one `&`
pub fn url_join<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join("/");

    let url = REPEATED_SLASHES.replace_all(&joined, "/");
    let url = COLLAPSED_SCHEME.replace(&url, "${1}://");
    let url = FILE_SCHEME.replace(&url, "file:/");
    let url = SLASH_BEFORE_QUERY.replace_all(&url, "${1}");
    let url = url.replace('?', "&");

    url.replacen('&', "?", 1)
}

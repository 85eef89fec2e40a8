//! URL path helpers
//!
//! Every page is keyed by its normalized URL path. The same key drives the
//! cache file name, the menu entry and the prompt sent to the generator, so
//! all conversions live here.

/// Suffix shared by every cached content snippet
pub const CONTENT_FILE_SUFFIX: &str = "_content.html";

/// Cache base name used for the root path
const INDEX_NAME: &str = "index";

/// Normalize a request path: empty or `/` becomes `/`, anything else gets a
/// single leading slash and no trailing slash.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Convert a page path into the file name of its cached content snippet.
///
/// Slashes become underscores and anything outside `[A-Za-z0-9_-]` is
/// dropped, so `/products/item1/details` maps to
/// `products_item1_details_content.html`. Only the root maps to `index`; a
/// path made entirely of dropped characters keeps an empty base.
pub fn cache_file_name(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let base: String = if trimmed.is_empty() {
        INDEX_NAME.to_string()
    } else {
        trimmed
            .replace('/', "_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    };
    format!("{}{}", base, CONTENT_FILE_SUFFIX)
}

/// Recover the page path a cache file was written for.
///
/// Returns `None` for files that are not content snippets, and for the
/// empty-base snippet, which has no recoverable path. Underscores are
/// read back as path separators, which is lossy for paths that contained
/// underscores to begin with.
pub fn path_from_cache_file_name(file_name: &str) -> Option<String> {
    let base = file_name.strip_suffix(CONTENT_FILE_SUFFIX)?;
    if base.is_empty() {
        return None;
    }
    if base == INDEX_NAME {
        Some("/".to_string())
    } else {
        Some(format!("/{}", base.replace('_', "/")))
    }
}

/// Human-readable menu label for a path
pub fn display_name(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "Home".to_string();
    }
    title_case(&trimmed.replace(['_', '-'], " "))
}

/// The path as the content generator sees it: `homepage` for the root,
/// otherwise the path without surrounding slashes.
pub fn page_query(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "homepage".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Uppercase the first letter of every run of letters, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", "/" ; "empty")]
    #[test_case("/", "/" ; "root")]
    #[test_case("//", "/" ; "double slash")]
    #[test_case("about", "/about" ; "no leading slash")]
    #[test_case("/about/", "/about" ; "trailing slash")]
    #[test_case("products/item1/details", "/products/item1/details" ; "multi level")]
    fn test_normalize_path(raw: &str, expected: &str) {
        assert_eq!(normalize_path(raw), expected);
    }

    #[test_case("/", "index_content.html" ; "root")]
    #[test_case("/about", "about_content.html" ; "single level")]
    #[test_case("/products/item1/details", "products_item1_details_content.html" ; "multi level")]
    #[test_case("/a b/c.d?e", "ab_cde_content.html" ; "unsafe characters dropped")]
    #[test_case("/my-page", "my-page_content.html" ; "dash kept")]
    #[test_case("/!!", "_content.html" ; "only unsafe characters")]
    #[test_case("/%C3%BC", "C3BC_content.html" ; "percent escapes stripped")]
    fn test_cache_file_name(path: &str, expected: &str) {
        assert_eq!(cache_file_name(path), expected);
    }

    #[test]
    fn test_path_from_cache_file_name() {
        assert_eq!(path_from_cache_file_name("index_content.html").as_deref(), Some("/"));
        assert_eq!(
            path_from_cache_file_name("products_item1_details_content.html").as_deref(),
            Some("/products/item1/details")
        );
        assert_eq!(path_from_cache_file_name("about.html"), None);
        assert_eq!(path_from_cache_file_name("_content.html"), None);
        assert_eq!(path_from_cache_file_name("about_content.html.tmp"), None);
    }

    #[test_case("/", "Home" ; "root")]
    #[test_case("", "Home" ; "empty")]
    #[test_case("/about", "About" ; "single word")]
    #[test_case("/contact-us", "Contact Us" ; "dash")]
    #[test_case("/our_team", "Our Team" ; "underscore")]
    #[test_case("/products/item1/details", "Products/Item1/Details" ; "multi level")]
    #[test_case("/FAQ", "Faq" ; "uppercase folded")]
    fn test_display_name(path: &str, expected: &str) {
        assert_eq!(display_name(path), expected);
    }

    #[test]
    fn test_page_query() {
        assert_eq!(page_query("/"), "homepage");
        assert_eq!(page_query(""), "homepage");
        assert_eq!(page_query("/about"), "about");
        assert_eq!(page_query("/products/item1/details"), "products/item1/details");
    }
}

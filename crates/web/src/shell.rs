//! HTML shell rendering
//!
//! Every page path is served the same shell with the menu and the page's
//! content already in place. The embedded script then handles in-app
//! navigation through `/get_page_data`.

use askama::Template;

use pagegen_common::{display_name, MenuItem, PageData};

/// Full document for one page path
#[derive(Template)]
#[template(path = "index.html")]
struct ShellTemplate<'a> {
    title: String,
    path: &'a str,
    menu_items: &'a [MenuItem],
    /// Trusted generator output, inserted unescaped
    content: &'a str,
}

/// Render the full document for `path`
pub fn render_page(path: &str, data: &PageData) -> askama::Result<String> {
    ShellTemplate {
        title: format!("{} | pagegen", display_name(path)),
        path,
        menu_items: &data.menu_items,
        content: &data.main_content_html,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn about_page() -> PageData {
        PageData {
            main_content_html: "<h1>Content for path: about</h1>".to_string(),
            menu_items: vec![
                MenuItem { name: "Home".to_string(), path: "/".to_string(), is_current: false },
                MenuItem { name: "About".to_string(), path: "/about".to_string(), is_current: true },
            ],
        }
    }

    #[test]
    fn test_render_page() {
        let html = render_page("/about", &about_page()).unwrap();

        assert!(html.contains("<title>About | pagegen</title>"));
        assert!(html.contains("<h1>Content for path: about</h1></main>"));
        assert!(html.contains(r#"data-nav class="current">About</a></li>"#));
        assert!(html.contains("data-nav>Home</a></li>"));
        assert!(!html.contains("{{"));
        assert!(!html.contains("{%"));
    }

    #[test]
    fn test_menu_labels_escaped() {
        let mut data = about_page();
        data.menu_items[1].name = "<b>About</b> & more".to_string();

        let html = render_page("/about", &data).unwrap();

        assert!(html.contains("&lt;b&gt;About&lt;/b&gt; &amp; more"));
        assert!(!html.contains("<b>About</b>"));
    }
}

//! Page data types shared by the server and its clients

use serde::{Deserialize, Serialize};

/// A navigation menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Display label
    pub name: String,

    /// Normalized page path
    pub path: String,

    /// Whether this entry is the page being viewed
    pub is_current: bool,
}

/// Payload of `GET /get_page_data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    /// HTML snippet for the page's main region
    pub main_content_html: String,

    /// Menu reflecting the cache contents at request time
    pub menu_items: Vec<MenuItem>,
}

//! pagegen Common Library
//!
//! Path naming, the content cache, the navigation menu model and site
//! configuration shared by the page server and the navigation harness.

pub mod cache;
pub mod config;
pub mod error;
pub mod menu;
pub mod paths;
pub mod types;

pub use cache::ContentCache;
pub use config::{SiteConfig, WebsiteProfile};
pub use error::{Error, Result};
pub use menu::build_menu;
pub use paths::{cache_file_name, display_name, normalize_path, page_query};
pub use types::{MenuItem, PageData};

/// pagegen version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

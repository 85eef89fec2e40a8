//! Navigation menu construction

use std::collections::HashSet;

use crate::paths::{display_name, normalize_path};
use crate::types::MenuItem;

/// Build the menu for `current`, given the paths that already have cached
/// content.
///
/// The current page is always listed first-class even before its content is
/// cached. Entries are sorted with the root first, then by display name.
pub fn build_menu<I>(current: &str, cached_paths: I) -> Vec<MenuItem>
where
    I: IntoIterator<Item = String>,
{
    let current = normalize_path(current);
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(current.clone());

    let mut menu = vec![MenuItem {
        name: display_name(&current),
        path: current,
        is_current: true,
    }];

    for path in cached_paths {
        if seen.insert(path.clone()) {
            menu.push(MenuItem {
                name: display_name(&path),
                path,
                is_current: false,
            });
        }
    }

    menu.sort_by(|a, b| {
        (a.path != "/", &a.name).cmp(&(b.path != "/", &b.name))
    });
    menu
}

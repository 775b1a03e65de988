//! Snippet formatting for captured page activity
//!
//! Every snippet opens with a comment header naming its kind so the
//! joined session buffer stays readable without further parsing.

use crate::page::{ElementSnapshot, NodeId};

pub const URL_CHANGE_HEADER: &str = "/* URL CHANGE */";
pub const ELEMENT_HTML_HEADER: &str = "/* ELEMENT HTML */";
pub const VALUE_HEADER: &str = "/* VALUE */";
pub const DROPDOWN_HEADER: &str = "/* DROPDOWN <li> ELEMENT HTML */";
pub const INNER_LINK_HEADER: &str = "/* INNER <a> ELEMENT HTML */";

/// Compound selector for the dropdown ancestor special case
const DROPDOWN_TAG: &str = "li";
const DROPDOWN_CLASSES: [&str; 2] = ["dropdown", "mega-dropdown"];

/// Formats a URL change record
pub fn url_change(url: &str) -> String {
    format!("{}\n{}", URL_CHANGE_HEADER, url)
}

/// Formats the serialized markup of one element. Text input controls get
/// their current value appended as a separate labeled section.
pub fn element_capture(snapshot: &ElementSnapshot, id: NodeId) -> String {
    let mut info = format!("{}\n{}", ELEMENT_HTML_HEADER, snapshot.outer_html(id));
    if snapshot.is_text_input(id) {
        info.push_str(&format!(
            "\n{}\n{}",
            VALUE_HEADER,
            snapshot.value(id).unwrap_or_default()
        ));
    }
    info
}

/// Snippets produced by one click.
///
/// A click anywhere inside a dropdown list item yields the item's markup
/// followed by the nearest enclosing link when one exists. Any other click
/// yields a single capture of the exact target.
pub fn click_snippets(snapshot: &ElementSnapshot) -> Vec<String> {
    let target = snapshot.target();
    let dropdown = snapshot.closest(target, |snap, id| {
        snap.tag(id) == DROPDOWN_TAG
            && DROPDOWN_CLASSES
                .iter()
                .all(|class| snap.has_class(id, class))
    });

    match dropdown {
        Some(item) => {
            let mut snippets = vec![format!(
                "{}\n{}",
                DROPDOWN_HEADER,
                snapshot.outer_html(item)
            )];
            if let Some(link) = snapshot.closest(target, |snap, id| snap.tag(id) == "a") {
                snippets.push(format!(
                    "{}\n{}",
                    INNER_LINK_HEADER,
                    snapshot.outer_html(link)
                ));
            }
            snippets
        }
        None => vec![element_capture(snapshot, target)],
    }
}

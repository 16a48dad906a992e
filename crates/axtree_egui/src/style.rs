//! Colors, strokes and label text shared by the main view and the overview.

use egui::{Color32, Stroke};

// =============================================================================
// ROLE COLORS
// =============================================================================

/// Keyword -> fill, checked in order against the lower-cased role label.
pub const ROLE_PALETTE: [(&str, Color32); 7] = [
    ("heading", Color32::from_rgb(0x4F, 0x46, 0xE5)),
    ("button", Color32::from_rgb(0x05, 0x96, 0x69)),
    ("link", Color32::from_rgb(0x25, 0x63, 0xEB)),
    ("iframe", Color32::from_rgb(0xDC, 0x26, 0x26)),
    ("textbox", Color32::from_rgb(0xD9, 0x77, 0x06)),
    ("banner", Color32::from_rgb(0x93, 0x33, 0xEA)),
    ("generic", Color32::from_rgb(0x6B, 0x72, 0x80)),
];

/// Fill for roles matching no keyword.
pub const OTHER_ROLE: Color32 = Color32::from_rgb(0x37, 0x41, 0x51);

/// Fill for nodes without a role.
pub const NO_ROLE: Color32 = Color32::WHITE;

pub fn role_color(role: &str) -> Color32 {
    if role.is_empty() {
        return NO_ROLE;
    }
    let role = role.to_lowercase();
    ROLE_PALETTE
        .iter()
        .find(|(keyword, _)| role.contains(keyword))
        .map(|(_, color)| *color)
        .unwrap_or(OTHER_ROLE)
}

// =============================================================================
// STROKES
// =============================================================================

pub const HIGHLIGHT: Color32 = Color32::from_rgb(0xFF, 0xD5, 0x4F);
pub const EDGE: Color32 = Color32::from_rgb(0xCC, 0xCC, 0xCC);
pub const OVERVIEW_EDGE: Color32 = Color32::from_rgb(0xDD, 0xDD, 0xDD);
pub const LABEL: Color32 = Color32::from_rgb(0x1F, 0x29, 0x37);

pub const NODE_RADIUS: f32 = 8.0;
pub const LABEL_OFFSET: f32 = 12.0;
pub const LABEL_SIZE: f32 = 11.0;
pub const NAME_CHARS: usize = 28;

pub fn edge_stroke() -> Stroke {
    Stroke::new(1.2, EDGE)
}

/// Ring around a node: gold when highlighted, grey when ignored.
pub fn node_stroke(highlighted: bool, ignored: bool) -> Stroke {
    if highlighted {
        Stroke::new(4.0, HIGHLIGHT)
    } else if ignored {
        Stroke::new(1.0, EDGE)
    } else {
        Stroke::new(1.0, Color32::WHITE)
    }
}

// =============================================================================
// LABELS
// =============================================================================

/// Containers without semantics get no marker, only their edges.
pub fn draws_marker(role_key: &str) -> bool {
    !role_key.is_empty() && role_key != "generic" && role_key != "none"
}

/// `"<role> <name>"`, name cut to [`NAME_CHARS`] characters.
pub fn node_label(role: &str, name: &str) -> String {
    let role = if role.is_empty() { "node" } else { role };
    if name.is_empty() {
        role.to_string()
    } else {
        let name: String = name.chars().take(NAME_CHARS).collect();
        format!("{role} {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_keyword_order() {
        assert_eq!(role_color("heading"), ROLE_PALETTE[0].1);
        assert_eq!(role_color("Link"), ROLE_PALETTE[2].1);
        assert_eq!(role_color("menuitembutton"), ROLE_PALETTE[1].1);
        assert_eq!(role_color("RootWebArea"), OTHER_ROLE);
        assert_eq!(role_color(""), NO_ROLE);
    }

    #[test]
    fn markers_skip_semantic_free_containers() {
        assert!(draws_marker("link"));
        assert!(!draws_marker("generic"));
        assert!(!draws_marker("none"));
        assert!(!draws_marker(""));
    }

    #[test]
    fn labels_truncate_names() {
        assert_eq!(node_label("", ""), "node");
        assert_eq!(node_label("link", "Home"), "link Home");
        let long = "x".repeat(40);
        assert_eq!(node_label("button", &long), format!("button {}", "x".repeat(28)));
    }

    #[test]
    fn highlight_beats_ignored() {
        assert_eq!(node_stroke(true, true).width, 4.0);
        assert_eq!(node_stroke(false, true).color, EDGE);
    }
}

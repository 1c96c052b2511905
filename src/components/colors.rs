use image::Rgba;

#[cfg(test)]
#[path = "colors_test.rs"]
mod colors_test;

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

// ============================================================================
// Palette
// ============================================================================

/// Colors an agent may ask for by name. All fully opaque.
pub const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("pink", [255, 0, 255]),
    ("cyan", [0, 255, 255]),
    ("yellow", [255, 255, 0]),
    ("purple", [155, 0, 255]),
    ("brown", [102, 51, 0]),
    ("orange", [255, 165, 0]),
];

/// Look up a palette entry. Names are matched case-insensitively.
pub fn named_color(name: &str) -> Option<Rgba<u8>> {
    let name = name.trim();
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, [r, g, b])| Rgba([r, g, b, 255]))
}

pub fn palette_names() -> impl Iterator<Item = &'static str> {
    NAMED_COLORS.iter().map(|(n, _)| *n)
}

/// Human-readable form used in confirmation messages: the palette name when
/// the color is an opaque palette entry, `rgba(r, g, b, a)` otherwise.
pub fn describe(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    if a == 255 {
        if let Some((name, _)) = NAMED_COLORS.iter().find(|(_, rgb)| *rgb == [r, g, b]) {
            return (*name).to_string();
        }
    }
    format!("rgba({r}, {g}, {b}, {a})")
}

// ============================================================================
// Brush
// ============================================================================

/// Global stroke state. Changing it only affects later rasterization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Brush {
    pub color: Rgba<u8>,
    /// Stroke thickness in pixels, at least 1.
    pub width: u32,
}

impl Brush {
    pub fn new(color: Rgba<u8>, width: u32) -> Self {
        Self { color, width: width.max(1) }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: BLACK, width: 1 }
    }
}

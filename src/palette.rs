//! Autumnal role palette and brightness helpers.

/// Role colours, assigned round-robin as roles are created
pub const ROLE_COLORS: [&str; 8] = [
    "#D4A574", // tan
    "#C17817", // dark orange
    "#8B4513", // saddle brown
    "#CD853F", // peru
    "#A0522D", // sienna
    "#DAA520", // goldenrod
    "#B8860B", // dark goldenrod
    "#8B7355", // burlywood dark
];

/// Colour for the `index`-th role (cycles through the palette)
pub fn role_color(index: usize) -> &'static str {
    ROLE_COLORS[index % ROLE_COLORS.len()]
}

/// Parse `#RRGGBB`. Malformed input yields `None`.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Scale every channel by `factor`, clamped to 255
pub fn adjust_brightness(hex: &str, factor: f32) -> Option<String> {
    let (r, g, b) = hex_to_rgb(hex)?;
    let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
    Some(rgb_to_hex(scale(r), scale(g), scale(b)))
}

/// Brightened colour for the focused panel (120%)
pub fn active_color(hex: &str) -> String {
    adjust_brightness(hex, 1.2).unwrap_or_else(|| hex.to_string())
}

/// Dulled colour for secondary text (70%)
pub fn muted_color(hex: &str) -> String {
    adjust_brightness(hex, 0.7).unwrap_or_else(|| hex.to_string())
}

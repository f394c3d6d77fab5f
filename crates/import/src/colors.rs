//! Stable per-agent colors for log lines.

/// Derives an RGB color from `name`. The same name always maps to the same
/// color.
pub fn string_to_rgb(name: &str) -> (u8, u8, u8) {
    let hash = name
        .chars()
        .fold(0i32, |hash, c| (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash)));
    let [_, r, g, b] = hash.to_be_bytes();
    (r, g, b)
}

/// Wraps `text` in a 24-bit ANSI foreground color.
pub fn paint(text: &str, (r, g, b): (u8, u8, u8)) -> String {
    format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[39m")
}

/// The server URL as shown in log lines: tinted with the agent's color, or
/// plain when the agent has no name.
pub fn color_url(url: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => paint(url, string_to_rgb(name)),
        _ => url.to_string(),
    }
}

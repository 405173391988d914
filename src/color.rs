/// Straight-alpha RGBA in `0.0..=1.0`, the layout the GPU vertex format uses.
pub type Rgba = [f32; 4];

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("pink", [255, 192, 203]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
];

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic CSS color name.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, [r, g, b])| [channel(*r), channel(*g), channel(*b), 1.0])
}

/// Like [`parse_color`], but unknown strings fall back to opaque black.
pub fn parse_color_or_black(value: &str) -> Rgba {
    parse_color(value).unwrap_or_else(|| {
        log::warn!("Unrecognized color {:?}, using black", value);
        [0.0, 0.0, 0.0, 1.0]
    })
}

pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    [color[0], color[1], color[2], color[3] * alpha]
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut out = [1.0; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = channel(v * 17);
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [1.0; 4];
            for i in 0..hex.len() / 2 {
                out[i] = channel(byte(&hex[i * 2..i * 2 + 2])?);
            }
            Some(out)
        }
        _ => None,
    }
}

fn channel(v: u8) -> f32 {
    v as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_color("#fff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_color("#00000000"), Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_named_colors_are_case_insensitive() {
        assert_eq!(parse_color("Blue"), Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(parse_color("chartreuse-ish"), None);
        assert_eq!(parse_color_or_black("nope"), [0.0, 0.0, 0.0, 1.0]);
    }
}

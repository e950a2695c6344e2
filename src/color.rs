/// RGBA tuple with components in `[0, 1]`.
pub type Rgba = [f32; 4];

/// Entry of the built-in palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedColor {
    pub name: &'static str,
    pub rgba: Rgba,
}

impl NamedColor {
    const fn new(name: &'static str, r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            name,
            rgba: [r, g, b, a],
        }
    }

    /// Color without its alpha channel, as used for per-vertex colors.
    pub fn rgb(&self) -> [f32; 3] {
        [self.rgba[0], self.rgba[1], self.rgba[2]]
    }

    pub fn to_wgpu(&self) -> wgpu::Color {
        to_wgpu_color(self.rgba)
    }
}

pub const GRAY: NamedColor = NamedColor::new("gray", 0.5, 0.5, 0.5, 0.9);
pub const WHITE: NamedColor = NamedColor::new("white", 1.0, 1.0, 1.0, 1.0);
pub const BLACK: NamedColor = NamedColor::new("black", 0.0, 0.0, 0.0, 1.0);
pub const GREEN: NamedColor = NamedColor::new("green", 0.0, 1.0, 0.0, 1.0);
pub const RED: NamedColor = NamedColor::new("red", 1.0, 0.0, 0.0, 1.0);
pub const BLUE: NamedColor = NamedColor::new("blue", 0.0, 0.0, 1.0, 1.0);
pub const YELLOW: NamedColor = NamedColor::new("yellow", 1.0, 1.0, 0.0, 1.0);
pub const CYAN: NamedColor = NamedColor::new("cyan", 0.0, 1.0, 1.0, 1.0);
pub const MAGENTA: NamedColor = NamedColor::new("magenta", 1.0, 0.0, 1.0, 1.0);
pub const ORANGE: NamedColor = NamedColor::new("orange", 1.0, 0.5, 0.0, 1.0);

/// Read-only palette shared by every demo.
pub static PALETTE: &[NamedColor] = &[
    GRAY, WHITE, BLACK, GREEN, RED, BLUE, YELLOW, CYAN, MAGENTA, ORANGE,
];

/// Looks up a palette entry by name, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<&'static NamedColor> {
    PALETTE
        .iter()
        .find(|color| color.name.eq_ignore_ascii_case(name.trim()))
}

pub fn to_wgpu_color(rgba: Rgba) -> wgpu::Color {
    wgpu::Color {
        r: rgba[0] as f64,
        g: rgba[1] as f64,
        b: rgba[2] as f64,
        a: rgba[3] as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(lookup("Magenta"), Some(&MAGENTA));
        assert_eq!(lookup(" yellow "), Some(&YELLOW));
        assert!(lookup("chartreuse").is_none());
    }

    #[test]
    fn gray_is_the_only_translucent_entry() {
        let translucent: Vec<_> = PALETTE.iter().filter(|c| c.rgba[3] < 1.0).collect();
        assert_eq!(translucent, vec![&GRAY]);
        assert_eq!(GRAY.rgb(), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn components_stay_in_unit_range() {
        for color in PALETTE {
            assert!(color.rgba.iter().all(|c| (0.0..=1.0).contains(c)), "{}", color.name);
        }
    }
}

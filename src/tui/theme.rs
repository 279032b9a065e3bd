//! Theme palettes: pure style data for the rendering layer.
//!
//! Five palettes, selectable at runtime. Each palette fixes the same six
//! roles so every screen reads consistently:
//! - fg / bg: body text and screen background
//! - card: story card background
//! - accent: headings, focused fields, interactive hints
//! - glow: card borders and highlights
//! - muted: de-emphasized chrome (help line, separators)

use ratatui::style::{Color, Modifier, Style};

use crate::types::ThemeName;

/// The six color roles of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub card: Color,
    pub accent: Color,
    pub glow: Color,
    pub muted: Color,
}

// ============================================================================
// PALETTES
// ============================================================================

pub const LIGHT: Palette = Palette {
    fg: Color::Rgb(0x00, 0x00, 0x00),
    bg: Color::Rgb(0xff, 0xff, 0xff),
    card: Color::Rgb(0xf4, 0xf0, 0xfb),
    accent: Color::Rgb(0x7c, 0x3a, 0xed),
    glow: Color::Rgb(0xa8, 0x55, 0xf7),
    muted: Color::Rgb(0x8a, 0x8a, 0x8a),
};

pub const DARK: Palette = Palette {
    fg: Color::Rgb(0xff, 0xff, 0xff),
    bg: Color::Rgb(0x1e, 0x1e, 0x1e),
    card: Color::Rgb(0x2a, 0x2a, 0x2a),
    accent: Color::Rgb(0x06, 0xb6, 0xd4),
    glow: Color::Rgb(0x3b, 0x82, 0xf6),
    muted: Color::Rgb(0x6b, 0x6b, 0x6b),
};

pub const SOLARIZED: Palette = Palette {
    fg: Color::Rgb(0x58, 0x6e, 0x75),
    bg: Color::Rgb(0xfd, 0xf6, 0xe3),
    card: Color::Rgb(0xee, 0xe8, 0xd5),
    accent: Color::Rgb(0xb5, 0x89, 0x00),
    glow: Color::Rgb(0xcb, 0x4b, 0x16),
    muted: Color::Rgb(0x93, 0xa1, 0xa1),
};

pub const MIDNIGHT: Palette = Palette {
    fg: Color::Rgb(0xf8, 0xfa, 0xfc),
    bg: Color::Rgb(0x0f, 0x17, 0x2a),
    card: Color::Rgb(0x1e, 0x29, 0x3b),
    accent: Color::Rgb(0x4f, 0x46, 0xe5),
    glow: Color::Rgb(0x1e, 0x3a, 0x8a),
    muted: Color::Rgb(0x64, 0x74, 0x8b),
};

pub const PASTEL: Palette = Palette {
    fg: Color::Rgb(0x5a, 0x5a, 0x5a),
    bg: Color::Rgb(0xfe, 0xf3, 0xf3),
    card: Color::Rgb(0xff, 0xf1, 0xf2),
    accent: Color::Rgb(0xfc, 0xa5, 0xa5),
    glow: Color::Rgb(0xf4, 0x72, 0xb6),
    muted: Color::Rgb(0xb0, 0xa0, 0xa4),
};

/// Palette for a theme name.
pub fn palette(theme: ThemeName) -> &'static Palette {
    match theme {
        ThemeName::Light => &LIGHT,
        ThemeName::Dark => &DARK,
        ThemeName::Solarized => &SOLARIZED,
        ThemeName::Midnight => &MIDNIGHT,
        ThemeName::Pastel => &PASTEL,
    }
}

// ============================================================================
// STYLE HELPERS
// ============================================================================

impl Palette {
    /// Body text on the screen background.
    pub fn base(&self) -> Style {
        Style::new().fg(self.fg).bg(self.bg)
    }

    /// Headings and titles.
    pub fn title(&self) -> Style {
        Style::new().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// Interactive hints and the focused form field.
    pub fn interactive(&self) -> Style {
        Style::new().fg(self.accent)
    }

    /// Card body: story text on the card background.
    pub fn card_body(&self) -> Style {
        Style::new().fg(self.fg).bg(self.card)
    }

    /// Card border.
    pub fn card_border(&self) -> Style {
        Style::new().fg(self.glow)
    }

    /// De-emphasized chrome.
    pub fn dim(&self) -> Style {
        Style::new().fg(self.muted)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_a_palette() {
        for theme in ThemeName::ALL {
            let p = palette(theme);
            assert_ne!(p.fg, p.bg, "{:?} foreground equals background", theme);
        }
    }

    #[test]
    fn palettes_are_distinct() {
        let mut backgrounds = Vec::new();
        for theme in ThemeName::ALL {
            backgrounds.push(palette(theme).bg);
        }
        backgrounds.dedup();
        assert_eq!(backgrounds.len(), ThemeName::ALL.len());
    }

    #[test]
    fn title_style_is_bold_accent() {
        let p = palette(ThemeName::Midnight);
        let style = p.title();
        assert_eq!(style.fg, Some(p.accent));
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn base_style_uses_theme_colors() {
        let p = palette(ThemeName::Solarized);
        let style = p.base();
        assert_eq!(style.fg, Some(p.fg));
        assert_eq!(style.bg, Some(p.bg));
    }
}

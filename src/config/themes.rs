use ratatui::style::Color;

use crate::post::{BadgeStyle, Platform, Theme};

/// Opaque sRGB color carried from the palette into both the terminal
/// renderer and the PNG rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}

impl Rgb {
    pub fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// Resolved colors for one platform/theme combination.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Rgb,
    pub foreground: Rgb,
    pub subtext: Rgb,
    pub accent: Rgb,
    pub border: Rgb,
}

/// Looks up the palette for a card. Values follow each platform's house
/// colors rather than a shared scheme, which is why this is keyed on both
/// discriminants.
pub fn palette(platform: Platform, theme: Theme) -> Palette {
    match (platform, theme) {
        (Platform::Twitter, Theme::Dark) => Palette {
            background: Rgb(0x00, 0x00, 0x00),
            foreground: Rgb(0xe7, 0xe9, 0xea),
            subtext: Rgb(0x71, 0x76, 0x7b),
            accent: Rgb(0x1d, 0x9b, 0xf0),
            border: Rgb(0x2f, 0x33, 0x36),
        },
        (Platform::Twitter, Theme::Light) => Palette {
            background: Rgb(0xff, 0xff, 0xff),
            foreground: Rgb(0x0f, 0x14, 0x19),
            subtext: Rgb(0x53, 0x64, 0x71),
            accent: Rgb(0x1d, 0x9b, 0xf0),
            border: Rgb(0xef, 0xf3, 0xf4),
        },
        (Platform::LinkedIn, Theme::Dark) => Palette {
            background: Rgb(0x1b, 0x1f, 0x23),
            foreground: Rgb(0xff, 0xff, 0xff),
            subtext: Rgb(0xa3, 0xa3, 0xa3),
            accent: Rgb(0x0a, 0x66, 0xc2),
            border: Rgb(0x38, 0x43, 0x4f),
        },
        (Platform::LinkedIn, Theme::Light) => Palette {
            background: Rgb(0xff, 0xff, 0xff),
            foreground: Rgb(0x19, 0x19, 0x19),
            subtext: Rgb(0x66, 0x66, 0x66),
            accent: Rgb(0x0a, 0x66, 0xc2),
            border: Rgb(0xe5, 0xe7, 0xeb),
        },
        (Platform::Instagram, Theme::Dark) => Palette {
            background: Rgb(0x00, 0x00, 0x00),
            foreground: Rgb(0xff, 0xff, 0xff),
            subtext: Rgb(0x9c, 0xa3, 0xaf),
            accent: Rgb(0xe0, 0xf1, 0xff),
            border: Rgb(0x1f, 0x29, 0x37),
        },
        (Platform::Instagram, Theme::Light) => Palette {
            background: Rgb(0xff, 0xff, 0xff),
            foreground: Rgb(0x26, 0x26, 0x26),
            subtext: Rgb(0x6b, 0x72, 0x80),
            accent: Rgb(0x00, 0x37, 0x6b),
            border: Rgb(0xe5, 0xe7, 0xeb),
        },
    }
}

/// Explicit fill behind the captured card. Transparent regions must come out
/// deterministic in the PNG, so this is passed to the rasterizer rather than
/// inferred from the surface.
pub fn capture_background(platform: Platform, theme: Theme) -> Rgb {
    palette(platform, theme).background
}

/// Color of the verified check mark, or `None` when the badge is hidden.
pub fn badge_color(style: BadgeStyle) -> Option<Rgb> {
    match style {
        BadgeStyle::Blue => Some(Rgb(0x1d, 0x9b, 0xf0)),
        BadgeStyle::Gold => Some(Rgb(0xe7, 0xb4, 0x16)),
        BadgeStyle::Grey => Some(Rgb(0x82, 0x9a, 0xab)),
        BadgeStyle::Pink => Some(Rgb(0xf9, 0x18, 0x80)),
        BadgeStyle::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_platform_theme_pair_has_a_palette() {
        for platform in Platform::iter() {
            for theme in [Theme::Dark, Theme::Light] {
                let palette = palette(platform, theme);
                assert_ne!(
                    palette.background, palette.foreground,
                    "unreadable palette for {platform}/{theme}"
                );
            }
        }
    }

    #[test]
    fn capture_background_matches_card_background() {
        let bg = capture_background(Platform::Twitter, Theme::Dark);
        assert_eq!(bg, Rgb(0, 0, 0));
        let bg = capture_background(Platform::LinkedIn, Theme::Dark);
        assert_eq!(bg, Rgb(0x1b, 0x1f, 0x23));
    }

    #[test]
    fn hidden_badge_has_no_color() {
        assert!(badge_color(BadgeStyle::None).is_none());
        for style in BadgeStyle::iter().filter(|s| *s != BadgeStyle::None) {
            assert!(badge_color(style).is_some());
        }
    }
}

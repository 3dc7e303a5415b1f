//! Named visual presets for document PDFs.

use std::str::FromStr;

use printpdf::BuiltinFont;
use serde::{Deserialize, Serialize};

use super::error::PdfError;

/// Visual template preset, selected per user in settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatePreset {
    /// Serif typography, navy rules, traditional layout.
    #[default]
    Classic,
    /// Sans-serif typography with a filled accent header band.
    Modern,
    /// Dense sans-serif layout for long item lists.
    Compact,
}

impl TemplatePreset {
    /// All presets, for settings validation and listings.
    pub const ALL: [Self; 3] = [Self::Classic, Self::Modern, Self::Compact];

    /// Returns the stable identifier stored in settings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Compact => "compact",
        }
    }

    pub(super) fn style(self) -> TemplateStyle {
        match self {
            Self::Classic => TemplateStyle {
                body_font: BuiltinFont::TimesRoman,
                bold_font: BuiltinFont::TimesBold,
                accent: (0.10, 0.15, 0.35),
                text: (0.10, 0.10, 0.10),
                muted: (0.45, 0.45, 0.45),
                title_size: 24.0,
                body_size: 10.0,
                small_size: 8.5,
                row_height: 7.0,
                header_band: false,
            },
            Self::Modern => TemplateStyle {
                body_font: BuiltinFont::Helvetica,
                bold_font: BuiltinFont::HelveticaBold,
                accent: (0.05, 0.55, 0.55),
                text: (0.12, 0.12, 0.12),
                muted: (0.50, 0.50, 0.50),
                title_size: 26.0,
                body_size: 10.0,
                small_size: 8.5,
                row_height: 8.0,
                header_band: true,
            },
            Self::Compact => TemplateStyle {
                body_font: BuiltinFont::Helvetica,
                bold_font: BuiltinFont::HelveticaBold,
                accent: (0.25, 0.25, 0.25),
                text: (0.10, 0.10, 0.10),
                muted: (0.55, 0.55, 0.55),
                title_size: 18.0,
                body_size: 8.5,
                small_size: 7.5,
                row_height: 5.5,
                header_band: false,
            },
        }
    }
}

impl FromStr for TemplatePreset {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "modern" => Ok(Self::Modern),
            "compact" => Ok(Self::Compact),
            other => Err(PdfError::UnknownTemplate(other.to_string())),
        }
    }
}

impl std::fmt::Display for TemplatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved style values consumed by the renderer.
pub(super) struct TemplateStyle {
    pub body_font: BuiltinFont,
    pub bold_font: BuiltinFont,
    pub accent: (f32, f32, f32),
    pub text: (f32, f32, f32),
    pub muted: (f32, f32, f32),
    pub title_size: f32,
    pub body_size: f32,
    pub small_size: f32,
    pub row_height: f32,
    pub header_band: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_round_trip() {
        for preset in TemplatePreset::ALL {
            assert_eq!(preset.as_str().parse::<TemplatePreset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_unknown_preset_rejected() {
        assert!(matches!(
            "neon".parse::<TemplatePreset>(),
            Err(PdfError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_default_is_classic() {
        assert_eq!(TemplatePreset::default(), TemplatePreset::Classic);
    }
}

//! RGB color handling with hex parsing and serialization.

// Allow small types passed by reference for API consistency
#![allow(clippy::trivially_copy_pass_by_ref)]

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// RGB color value with hex string representation.
///
/// Represents a color using red, green, and blue channels (0-255 each).
/// Serialized as a `#RRGGBB` string so catalog snapshots stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RgbColor {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl RgbColor {
    /// Creates a new `RgbColor` from individual channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses an `RgbColor` from a hex string.
    ///
    /// Supports formats: "#RRGGBB", "RRGGBB", and the CSS shorthand "#RGB".
    ///
    /// # Examples
    ///
    /// ```
    /// use startdeck::models::RgbColor;
    ///
    /// let color = RgbColor::from_hex("#FF0000").unwrap();
    /// assert_eq!(color, RgbColor::new(255, 0, 0));
    ///
    /// let color = RgbColor::from_hex("#0f0").unwrap();
    /// assert_eq!(color, RgbColor::new(0, 255, 0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid hex color format.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if !hex.is_ascii() {
            anyhow::bail!("Invalid hex color format '{hex}'. Expected hex digits only");
        }

        let expanded;
        let hex = match hex.len() {
            6 => hex,
            3 => {
                expanded = hex.chars().flat_map(|c| [c, c]).collect::<String>();
                expanded.as_str()
            }
            _ => anyhow::bail!(
                "Invalid hex color format '{hex}'. Expected 6 hex digits (RRGGBB) or 3 (RGB)"
            ),
        };

        let r = u8::from_str_radix(&hex[0..2], 16)
            .context(format!("Invalid red channel in hex color '{hex}'"))?;
        let g = u8::from_str_radix(&hex[2..4], 16)
            .context(format!("Invalid green channel in hex color '{hex}'"))?;
        let b = u8::from_str_radix(&hex[4..6], 16)
            .context(format!("Invalid blue channel in hex color '{hex}'"))?;

        Ok(Self::new(r, g, b))
    }

    /// Converts the color to a hex string in the format "#RRGGBB" (uppercase).
    ///
    /// ```
    /// use startdeck::models::RgbColor;
    ///
    /// assert_eq!(RgbColor::new(0, 128, 255).to_hex(), "#0080FF");
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Relative luminance (WCAG definition), 0.0 for black to 1.0 for white.
    #[must_use]
    pub fn luminance(&self) -> f32 {
        fn channel(value: u8) -> f32 {
            let c = f32::from(value) / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Returns black or white, whichever reads better on top of this color.
    #[must_use]
    pub fn contrasting_text(&self) -> Self {
        if self.luminance() > 0.179 {
            Self::new(0, 0, 0)
        } else {
            Self::new(255, 255, 255)
        }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Default for RgbColor {
    /// Default color is slate gray (#64748B), used for sites without a color.
    fn default() -> Self {
        Self::new(0x64, 0x74, 0x8B)
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

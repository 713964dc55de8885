//! Viewport dimensions and breakpoint classification.
//!
//! # Responsibility
//! - Define the raw viewport size pushed by the host resize signal.
//! - Resolve breakpoint thresholds with per-field default fallback.
//! - Classify a width into exactly one of mobile/tablet/desktop.
//!
//! # Invariants
//! - `width < tablet` is mobile, `tablet <= width < desktop` is tablet,
//!   `width >= desktop` is desktop.
//! - Exactly one classification holds for any width when `tablet < desktop`.

use serde::{Deserialize, Serialize};

/// Default tablet threshold in CSS pixels.
pub const DEFAULT_TABLET_BREAKPOINT: u32 = 768;
/// Default desktop threshold in CSS pixels.
pub const DEFAULT_DESKTOP_BREAKPOINT: u32 = 1280;

/// Viewport size read from the host at notification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Resolved breakpoint thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointConfig {
    pub tablet: u32,
    pub desktop: u32,
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            tablet: DEFAULT_TABLET_BREAKPOINT,
            desktop: DEFAULT_DESKTOP_BREAKPOINT,
        }
    }
}

impl BreakpointConfig {
    /// Returns whether thresholds partition the width axis into three bands.
    pub fn is_valid(&self) -> bool {
        self.tablet < self.desktop
    }

    /// Classifies one width against these thresholds.
    pub fn classify(&self, width: u32) -> Breakpoint {
        if width < self.tablet {
            Breakpoint::Mobile
        } else if width < self.desktop {
            Breakpoint::Tablet
        } else {
            Breakpoint::Desktop
        }
    }
}

/// Partial breakpoint declaration as it appears in host configuration.
///
/// Each missing field falls back to its own default, so supplying only
/// `tablet` keeps the default `desktop`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointOverrides {
    #[serde(default)]
    pub tablet: Option<u32>,
    #[serde(default)]
    pub desktop: Option<u32>,
}

impl BreakpointOverrides {
    pub fn resolve(&self) -> BreakpointConfig {
        BreakpointConfig {
            tablet: self.tablet.unwrap_or(DEFAULT_TABLET_BREAKPOINT),
            desktop: self.desktop.unwrap_or(DEFAULT_DESKTOP_BREAKPOINT),
        }
    }
}

/// Device class derived from viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Breakpoint, BreakpointConfig, BreakpointOverrides};

    #[test]
    fn default_thresholds_match_common_layout_bands() {
        let config = BreakpointConfig::default();
        assert_eq!(config.tablet, 768);
        assert_eq!(config.desktop, 1280);
        assert!(config.is_valid());
    }

    #[test]
    fn classify_respects_inclusive_lower_bounds() {
        let config = BreakpointConfig::default();
        assert_eq!(config.classify(0), Breakpoint::Mobile);
        assert_eq!(config.classify(767), Breakpoint::Mobile);
        assert_eq!(config.classify(768), Breakpoint::Tablet);
        assert_eq!(config.classify(1279), Breakpoint::Tablet);
        assert_eq!(config.classify(1280), Breakpoint::Desktop);
        assert_eq!(config.classify(u32::MAX), Breakpoint::Desktop);
    }

    #[test]
    fn partial_override_keeps_other_default() {
        let only_tablet = BreakpointOverrides {
            tablet: Some(600),
            desktop: None,
        };
        assert_eq!(
            only_tablet.resolve(),
            BreakpointConfig {
                tablet: 600,
                desktop: 1280
            }
        );

        let only_desktop = BreakpointOverrides {
            tablet: None,
            desktop: Some(1440),
        };
        assert_eq!(
            only_desktop.resolve(),
            BreakpointConfig {
                tablet: 768,
                desktop: 1440
            }
        );
    }

    #[test]
    fn overrides_deserialize_from_partial_json() {
        let overrides: BreakpointOverrides =
            serde_json::from_str(r#"{"tablet": 640}"#).expect("partial overrides should parse");
        assert_eq!(overrides.tablet, Some(640));
        assert_eq!(overrides.desktop, None);
    }
}

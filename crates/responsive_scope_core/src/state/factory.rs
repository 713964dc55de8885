//! Responsive view-state construction.

use crate::model::viewport::{BreakpointConfig, BreakpointOverrides, Viewport};
use crate::state::view_state::{SharedViewState, ViewState};
use log::warn;

/// Builds correctly-shaped view states for newly mounted fragments.
pub struct ResponsiveStateFactory;

impl ResponsiveStateFactory {
    /// Creates a view state from raw dimensions and optional overrides.
    ///
    /// Missing override fields fall back to defaults one by one. Overrides
    /// that do not produce `tablet < desktop` are discarded as a whole so the
    /// mobile/tablet/desktop bands stay exhaustive.
    pub fn create(
        width: u32,
        height: u32,
        breakpoints: Option<BreakpointOverrides>,
    ) -> SharedViewState {
        let resolved = breakpoints.unwrap_or_default().resolve();
        Self::create_with(Viewport::new(width, height), resolved)
    }

    pub fn create_with(viewport: Viewport, breakpoints: BreakpointConfig) -> SharedViewState {
        let breakpoints = if breakpoints.is_valid() {
            breakpoints
        } else {
            warn!(
                "event=breakpoints_rejected module=state status=fallback tablet={} desktop={}",
                breakpoints.tablet, breakpoints.desktop
            );
            BreakpointConfig::default()
        };
        SharedViewState::new(ViewState::new(viewport, breakpoints))
    }
}

#[cfg(test)]
mod tests {
    use super::ResponsiveStateFactory;
    use crate::model::viewport::{BreakpointConfig, BreakpointOverrides, Viewport};

    #[test]
    fn exactly_one_flag_holds_across_width_range() {
        let configs = [
            BreakpointConfig::default(),
            BreakpointConfig {
                tablet: 1,
                desktop: 2,
            },
            BreakpointConfig {
                tablet: 500,
                desktop: 501,
            },
        ];
        for config in configs {
            let state = ResponsiveStateFactory::create_with(Viewport::new(0, 0), config);
            for width in (0..2000).step_by(7).chain([config.tablet, config.desktop]) {
                state.set_viewport(width, 0);
                let flags = [state.is_mobile(), state.is_tablet(), state.is_desktop()];
                assert_eq!(
                    flags.iter().filter(|flag| **flag).count(),
                    1,
                    "width {width} with {config:?}"
                );
            }
        }
    }

    #[test]
    fn boundaries_belong_to_the_upper_band() {
        let state = ResponsiveStateFactory::create(768, 600, None);
        assert!(state.is_tablet());
        assert!(!state.is_mobile());

        state.set_viewport(1280, 600);
        assert!(state.is_desktop());
        assert!(!state.is_tablet());
    }

    #[test]
    fn partial_overrides_are_applied_independently() {
        let state = ResponsiveStateFactory::create(
            700,
            600,
            Some(BreakpointOverrides {
                tablet: Some(600),
                desktop: None,
            }),
        );
        assert!(state.is_tablet());
        assert_eq!(state.borrow().breakpoints().desktop, 1280);
    }

    #[test]
    fn inverted_thresholds_fall_back_to_defaults() {
        let state = ResponsiveStateFactory::create(
            900,
            600,
            Some(BreakpointOverrides {
                tablet: Some(2000),
                desktop: None,
            }),
        );
        assert_eq!(state.borrow().breakpoints(), BreakpointConfig::default());
        assert!(state.is_tablet());
    }
}

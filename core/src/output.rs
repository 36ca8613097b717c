//! Output modes and eyes.

use serde::{Deserialize, Serialize};

/// Eye that a view is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Eye {
    Center,
    Left,
    Right,
}

/// Head-mounted display runtime family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HmdKind {
    /// Swap-chain based runtime that takes layers on frame submit.
    Oculus,
    /// Compositor runtime fed with plain textures per eye.
    OpenVr,
    /// Render-manager runtime with registered buffers and its own presenter.
    Osvr,
    /// Mobile runtime presenting on a thread it owns.
    GoogleVr,
}

/// How a window presents mono or stereo imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    #[default]
    Center,
    Left,
    Right,
    /// Quad-buffered stereo.
    Stereo,
    RedCyan,
    GreenMagenta,
    AmberBlue,
    Oculus,
    #[serde(rename = "openvr")]
    OpenVr,
    Osvr,
    #[serde(rename = "googlevr")]
    GoogleVr,
}

impl OutputMode {
    pub const ALL: [OutputMode; 11] = [
        OutputMode::Center,
        OutputMode::Left,
        OutputMode::Right,
        OutputMode::Stereo,
        OutputMode::RedCyan,
        OutputMode::GreenMagenta,
        OutputMode::AmberBlue,
        OutputMode::Oculus,
        OutputMode::OpenVr,
        OutputMode::Osvr,
        OutputMode::GoogleVr,
    ];

    /// Number of views rendered per frame (1 or 2).
    pub fn view_count(self) -> usize {
        match self {
            OutputMode::Center | OutputMode::Left | OutputMode::Right => 1,
            _ => 2,
        }
    }

    pub fn is_stereo(self) -> bool {
        self.view_count() == 2
    }

    /// Eye rendered into view `i`.
    ///
    /// Monoscopic modes map view 0 to their single eye; stereo modes
    /// map view 0 to the left and view 1 to the right eye.
    pub fn eye(self, view: usize) -> Eye {
        match self {
            OutputMode::Center => Eye::Center,
            OutputMode::Left => Eye::Left,
            OutputMode::Right => Eye::Right,
            _ if view == 0 => Eye::Left,
            _ => Eye::Right,
        }
    }

    /// Runtime family required by this mode, if any.
    pub fn hmd_kind(self) -> Option<HmdKind> {
        match self {
            OutputMode::Oculus => Some(HmdKind::Oculus),
            OutputMode::OpenVr => Some(HmdKind::OpenVr),
            OutputMode::Osvr => Some(HmdKind::Osvr),
            OutputMode::GoogleVr => Some(HmdKind::GoogleVr),
            _ => None,
        }
    }

    /// Whether the frustum comes from a physical screen wall rather than a runtime.
    pub fn uses_screen_wall(self) -> bool {
        self.hmd_kind().is_none()
    }

    /// Modes whose output pass maps texels 1:1 to window pixels.
    pub fn is_pixel_exact(self) -> bool {
        matches!(
            self,
            OutputMode::Center
                | OutputMode::Left
                | OutputMode::Right
                | OutputMode::Stereo
                | OutputMode::RedCyan
                | OutputMode::GreenMagenta
                | OutputMode::AmberBlue
                | OutputMode::GoogleVr
        )
    }

    /// Whether a desktop surface for this mode should be double buffered.
    ///
    /// Mirror windows of swap-chain and compositor runtimes are single
    /// buffered so presentation is paced by the headset, not the monitor.
    pub fn wants_double_buffer(self) -> bool {
        !matches!(self, OutputMode::Oculus | OutputMode::OpenVr)
    }

    pub fn wants_quad_buffer_stereo(self) -> bool {
        self == OutputMode::Stereo
    }

    /// Render targets use sRGB storage except for the OpenVR-like compositor,
    /// which does not composite sRGB input correctly.
    pub fn wants_srgb(self) -> bool {
        self != OutputMode::OpenVr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::center(OutputMode::Center, 1)]
    #[case::left(OutputMode::Left, 1)]
    #[case::right(OutputMode::Right, 1)]
    #[case::stereo(OutputMode::Stereo, 2)]
    #[case::red_cyan(OutputMode::RedCyan, 2)]
    #[case::green_magenta(OutputMode::GreenMagenta, 2)]
    #[case::amber_blue(OutputMode::AmberBlue, 2)]
    #[case::oculus(OutputMode::Oculus, 2)]
    #[case::openvr(OutputMode::OpenVr, 2)]
    #[case::osvr(OutputMode::Osvr, 2)]
    #[case::googlevr(OutputMode::GoogleVr, 2)]
    fn view_count_per_mode(#[case] mode: OutputMode, #[case] expected: usize) {
        assert_eq!(mode.view_count(), expected);
    }

    #[test]
    fn stereo_eyes_are_left_then_right() {
        for mode in OutputMode::ALL.iter().filter(|m| m.is_stereo()) {
            assert_eq!(mode.eye(0), Eye::Left);
            assert_eq!(mode.eye(1), Eye::Right);
        }
        assert_eq!(OutputMode::Right.eye(0), Eye::Right);
    }

    #[test]
    fn only_openvr_is_linear() {
        for mode in OutputMode::ALL {
            assert_eq!(mode.wants_srgb(), mode != OutputMode::OpenVr);
        }
    }

    #[test]
    fn parses_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: OutputMode,
        }
        let w: Wrapper = toml::from_str("mode = \"red-cyan\"").unwrap();
        assert_eq!(w.mode, OutputMode::RedCyan);
        let w: Wrapper = toml::from_str("mode = \"openvr\"").unwrap();
        assert_eq!(w.mode, OutputMode::OpenVr);
    }
}

//! Caption style catalog.
//!
//! A fixed, closed set of presentation styles. One style is drawn per render
//! job and applied to every overlay in that job.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Font color treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Fixed color (`fontcolor=`)
    Solid(&'static str),
    /// Per-frame color expression (`fontcolor_expr=`), unescaped
    Expression(&'static str),
}

/// Text decoration drawn behind the glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    None,
    Shadow {
        x: u32,
        y: u32,
        color: &'static str,
    },
    Border {
        width: u32,
        color: &'static str,
    },
}

/// Immutable presentation parameters for one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpec {
    pub name: &'static str,
    pub font_size: u32,
    pub kerning: u32,
    /// Horizontal position expression
    pub x: &'static str,
    /// Vertical position expression
    pub y: &'static str,
    pub color: ColorMode,
    pub decoration: Decoration,
}

const CENTER_X: &str = "(w-text_w)/2";
const CENTER_Y: &str = "(h-text_h)/2";
const BELOW_CENTER_Y: &str = "(h-text_h)/2 + 50";
const DEFAULT_COLOR: ColorMode = ColorMode::Solid("white");

/// White on 92% of frames, gray otherwise. Evaluated by drawtext text
/// expansion once per frame and parsed as a hex color.
const FLICKER_COLOR_EXPR: &str = "0x%{eif:if(lt(random(0),0.92),16777215,8421504):x:6}";

const QUIET_CENTER_REVEAL: StyleSpec = StyleSpec {
    name: "quiet_center_reveal",
    font_size: 36,
    kerning: 2,
    x: CENTER_X,
    y: CENTER_Y,
    color: DEFAULT_COLOR,
    decoration: Decoration::Shadow { x: 2, y: 2, color: "black@0.4" },
};

const LOWER_THIRD_FACT: StyleSpec = StyleSpec {
    name: "lower_third_fact",
    font_size: 34,
    kerning: 1,
    x: CENTER_X,
    y: "h*0.72",
    color: DEFAULT_COLOR,
    decoration: Decoration::Border { width: 3, color: "black@0.8" },
};

const INTERNAL_SHIFT_UP: StyleSpec = StyleSpec {
    name: "internal_shift_up",
    font_size: 36,
    kerning: 2,
    x: CENTER_X,
    y: BELOW_CENTER_Y,
    color: DEFAULT_COLOR,
    decoration: Decoration::Shadow { x: 3, y: 3, color: "black@0.5" },
};

const FREEZE_RESPONSE: StyleSpec = StyleSpec {
    name: "freeze_response",
    font_size: 38,
    kerning: 1,
    x: CENTER_X,
    y: CENTER_Y,
    color: DEFAULT_COLOR,
    decoration: Decoration::Shadow { x: 4, y: 4, color: "black@0.6" },
};

const SPLIT_REALITY_TOP: StyleSpec = StyleSpec {
    name: "split_reality_top",
    font_size: 34,
    kerning: 1,
    x: CENTER_X,
    y: "h*0.25",
    color: DEFAULT_COLOR,
    decoration: Decoration::Border { width: 2, color: "black@0.7" },
};

const SPLIT_REALITY_BOTTOM: StyleSpec = StyleSpec {
    name: "split_reality_bottom",
    font_size: 36,
    kerning: 2,
    x: CENTER_X,
    y: "h*0.65",
    color: DEFAULT_COLOR,
    decoration: Decoration::Shadow { x: 3, y: 3, color: "black@0.5" },
};

const GASLIGHT_FLICKER: StyleSpec = StyleSpec {
    name: "gaslight_flicker",
    font_size: 36,
    kerning: 1,
    x: CENTER_X,
    y: CENTER_Y,
    color: ColorMode::Expression(FLICKER_COLOR_EXPR),
    decoration: Decoration::Shadow { x: 2, y: 2, color: "black@0.4" },
};

const SUBMISSION_SINK: StyleSpec = StyleSpec {
    name: "submission_sink",
    font_size: 34,
    kerning: 1,
    x: CENTER_X,
    y: BELOW_CENTER_Y,
    color: DEFAULT_COLOR,
    decoration: Decoration::Shadow { x: 3, y: 3, color: "black@0.6" },
};

const MEMORY_ECHO: StyleSpec = StyleSpec {
    name: "memory_echo",
    font_size: 36,
    kerning: 2,
    x: CENTER_X,
    y: CENTER_Y,
    color: ColorMode::Solid("white@0.6"),
    decoration: Decoration::Shadow { x: 4, y: 4, color: "black@0.7" },
};

const REALIZATION_SNAP: StyleSpec = StyleSpec {
    name: "realization_snap",
    font_size: 40,
    kerning: 3,
    x: CENTER_X,
    y: CENTER_Y,
    color: DEFAULT_COLOR,
    decoration: Decoration::Border { width: 4, color: "black@0.9" },
};

/// Available caption styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStyle {
    QuietCenterReveal,
    LowerThirdFact,
    InternalShiftUp,
    FreezeResponse,
    SplitRealityTop,
    SplitRealityBottom,
    /// Flickers between white and gray on random frames
    GaslightFlicker,
    SubmissionSink,
    /// Translucent text with a heavy shadow
    MemoryEcho,
    RealizationSnap,
}

impl CaptionStyle {
    /// The full catalog, in a stable order.
    pub const ALL: &'static [CaptionStyle] = &[
        CaptionStyle::QuietCenterReveal,
        CaptionStyle::LowerThirdFact,
        CaptionStyle::InternalShiftUp,
        CaptionStyle::FreezeResponse,
        CaptionStyle::SplitRealityTop,
        CaptionStyle::SplitRealityBottom,
        CaptionStyle::GaslightFlicker,
        CaptionStyle::SubmissionSink,
        CaptionStyle::MemoryEcho,
        CaptionStyle::RealizationSnap,
    ];

    /// Draw one style uniformly at random.
    pub fn pick_random() -> Self {
        use rand::prelude::IndexedRandom;

        let mut rng = rand::rng();
        // ALL is a non-empty constant
        *Self::ALL
            .choose(&mut rng)
            .unwrap_or(&CaptionStyle::QuietCenterReveal)
    }

    /// Presentation parameters for this style.
    pub fn spec(&self) -> &'static StyleSpec {
        match self {
            CaptionStyle::QuietCenterReveal => &QUIET_CENTER_REVEAL,
            CaptionStyle::LowerThirdFact => &LOWER_THIRD_FACT,
            CaptionStyle::InternalShiftUp => &INTERNAL_SHIFT_UP,
            CaptionStyle::FreezeResponse => &FREEZE_RESPONSE,
            CaptionStyle::SplitRealityTop => &SPLIT_REALITY_TOP,
            CaptionStyle::SplitRealityBottom => &SPLIT_REALITY_BOTTOM,
            CaptionStyle::GaslightFlicker => &GASLIGHT_FLICKER,
            CaptionStyle::SubmissionSink => &SUBMISSION_SINK,
            CaptionStyle::MemoryEcho => &MEMORY_ECHO,
            CaptionStyle::RealizationSnap => &REALIZATION_SNAP,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for CaptionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptionStyle {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.as_str() == lower)
            .ok_or_else(|| StyleParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown caption style: {0}")]
pub struct StyleParseError(String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_unique_names() {
        let names: HashSet<_> = CaptionStyle::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names.len(), CaptionStyle::ALL.len());
        assert_eq!(CaptionStyle::ALL.len(), 10);
    }

    #[test]
    fn test_parse_round_trips_names() {
        for style in CaptionStyle::ALL {
            assert_eq!(style.as_str().parse::<CaptionStyle>().unwrap(), *style);
        }
        assert!("neon_scream".parse::<CaptionStyle>().is_err());
    }

    #[test]
    fn test_serde_name_matches_catalog_name() {
        let json = serde_json::to_string(&CaptionStyle::GaslightFlicker).unwrap();
        assert_eq!(json, "\"gaslight_flicker\"");
    }

    #[test]
    fn test_pick_random_returns_catalog_member() {
        for _ in 0..50 {
            assert!(CaptionStyle::ALL.contains(&CaptionStyle::pick_random()));
        }
    }

    #[test]
    fn test_color_modes() {
        assert!(matches!(
            CaptionStyle::GaslightFlicker.spec().color,
            ColorMode::Expression(expr) if expr.contains("random(0)")
        ));
        assert_eq!(CaptionStyle::MemoryEcho.spec().color, ColorMode::Solid("white@0.6"));
        assert_eq!(CaptionStyle::LowerThirdFact.spec().color, ColorMode::Solid("white"));
    }

    #[test]
    fn test_realization_snap_values() {
        let spec = CaptionStyle::RealizationSnap.spec();
        assert_eq!(spec.font_size, 40);
        assert_eq!(spec.kerning, 3);
        assert_eq!(spec.decoration, Decoration::Border { width: 4, color: "black@0.9" });
    }
}

//! Season classification: a fixed threshold tree over the dominant HSV color.
//!
//! Hue splits cool / warm / neutral, then saturation and value pick the
//! season inside each branch. Every input maps to exactly one season.

use crate::types::Hsv;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hue below this is cool (red side of the wheel).
const COOL_HUE_BELOW: u8 = 15;
/// Hue above this is cool (magenta side of the wheel).
const COOL_HUE_ABOVE: u8 = 165;
/// Upper bound of the warm branch, inclusive.
const WARM_HUE_MAX: u8 = 45;

const BRIGHT_WINTER_MIN_SAT: u8 = 150;
const BRIGHT_WINTER_MIN_VAL: u8 = 180;
const TRUE_WINTER_MIN_VAL: u8 = 160;

const BRIGHT_SPRING_MIN_SAT: u8 = 140;
const BRIGHT_SPRING_MIN_VAL: u8 = 170;
const TRUE_SPRING_MIN_VAL: u8 = 150;

const NEUTRAL_SOFT_MAX_SAT: u8 = 100;

/// The color seasons this classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Season {
    BrightWinter,
    TrueWinter,
    DarkWinter,
    BrightSpring,
    TrueSpring,
    LightSpring,
}

impl Season {
    pub const ALL: [Season; 6] = [
        Season::BrightWinter,
        Season::TrueWinter,
        Season::DarkWinter,
        Season::BrightSpring,
        Season::TrueSpring,
        Season::LightSpring,
    ];

    /// Display name, also the knowledge base key.
    pub fn name(self) -> &'static str {
        match self {
            Season::BrightWinter => "Bright Winter",
            Season::TrueWinter => "True Winter",
            Season::DarkWinter => "Dark Winter",
            Season::BrightSpring => "Bright Spring",
            Season::TrueSpring => "True Spring",
            Season::LightSpring => "Light Spring",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown season: {0}")]
pub struct ParseSeasonError(String);

impl FromStr for Season {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::ALL
            .into_iter()
            .find(|season| season.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseSeasonError(s.to_string()))
    }
}

impl TryFrom<String> for Season {
    type Error = ParseSeasonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.name().to_string()
    }
}

/// Map a dominant color to its season.
pub fn classify(color: Hsv) -> Season {
    let Hsv { hue, saturation, value } = color;

    if hue < COOL_HUE_BELOW || hue > COOL_HUE_ABOVE {
        if saturation > BRIGHT_WINTER_MIN_SAT && value > BRIGHT_WINTER_MIN_VAL {
            Season::BrightWinter
        } else if value > TRUE_WINTER_MIN_VAL {
            Season::TrueWinter
        } else {
            Season::DarkWinter
        }
    } else if hue <= WARM_HUE_MAX {
        if saturation > BRIGHT_SPRING_MIN_SAT && value > BRIGHT_SPRING_MIN_VAL {
            Season::BrightSpring
        } else if value > TRUE_SPRING_MIN_VAL {
            Season::TrueSpring
        } else {
            Season::LightSpring
        }
    } else if saturation < NEUTRAL_SOFT_MAX_SAT {
        Season::LightSpring
    } else {
        Season::TrueSpring
    }
}

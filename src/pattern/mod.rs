//! Recoil Patterns
//!
//! A pattern is an ordered list of relative pointer movements, each followed
//! by a wait. Patterns are authored against a baseline configuration
//! (sensitivity 2.0, 1920x1080, 16:9) and scaled to the user's actual
//! configuration by [`scaling::scale`] before playback.
//!
//! # Timing
//!
//! `delay_ms` is the gap after a point is issued. The scheduler turns the
//! running sum of delays into absolute deadlines from a single start time:
//!
//! ```text
//! point:     p0        p1        p2
//! delay:     30        30        40
//! deadline:  t0+30     t0+60     t0+100
//! ```
//!
//! # Storage
//!
//! Patterns come from a [`PatternStore`]. The on-disk form is a JSON
//! [`PatternRecord`] per file:
//!
//! ```json
//! {
//!   "name": "ak47",
//!   "description": "Recoil pattern for ak47",
//!   "defaultHotkey": "F1",
//!   "baseSettings": {
//!     "sensitivity": 2.0,
//!     "resolution": { "width": 1920, "height": 1080 },
//!     "aspectRatio": "16:9"
//!   },
//!   "pattern": [ { "x": 0, "y": 4, "d": 30 }, { "x": -1, "y": 5, "d": 30 } ]
//! }
//! ```
//!
//! `defaultHotkey` is either a key name or a Windows virtual-key code. Code
//! `0` means no hotkey; other codes are translated to key names (`112` is
//! `"F1"`). Records are always written back with the key name.

mod error;
pub mod scaling;
pub mod store;

pub use error::{PatternError, Result};
pub use scaling::{scale, ScalingFactors};
pub use store::{DirectoryPatternStore, InMemoryPatternStore, PatternStore};

use serde::{Deserialize, Deserializer, Serialize};

/// One relative movement followed by a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternPoint {
    /// Horizontal movement in pointer units
    #[serde(rename = "x")]
    pub dx: i32,

    /// Vertical movement in pointer units
    #[serde(rename = "y")]
    pub dy: i32,

    /// Wait after this point before the next one is issued
    #[serde(rename = "d")]
    pub delay_ms: u32,
}

impl PatternPoint {
    /// Create a new pattern point
    pub const fn new(dx: i32, dy: i32, delay_ms: u32) -> Self {
        Self { dx, dy, delay_ms }
    }
}

/// Ordered sequence of pattern points
///
/// Order is playback order. A pattern is never mutated once built; the
/// engine hands out scaled copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    points: Vec<PatternPoint>,
}

impl Pattern {
    /// Create a pattern from its points
    pub fn new(points: Vec<PatternPoint>) -> Self {
        Self { points }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the pattern has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in playback order
    pub fn points(&self) -> &[PatternPoint] {
        &self.points
    }

    /// Iterate points in playback order
    pub fn iter(&self) -> std::slice::Iter<'_, PatternPoint> {
        self.points.iter()
    }

    /// Sum of all delays, i.e. the nominal playback duration in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.points.iter().map(|p| p.delay_ms as u64).sum()
    }

    /// Net pointer displacement after the whole pattern has been issued
    pub fn net_displacement(&self) -> (i64, i64) {
        self.points.iter().fold((0i64, 0i64), |(x, y), p| {
            (x + p.dx as i64, y + p.dy as i64)
        })
    }
}

impl From<Vec<PatternPoint>> for Pattern {
    fn from(points: Vec<PatternPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<PatternPoint> for Pattern {
    fn from_iter<I: IntoIterator<Item = PatternPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a PatternPoint;
    type IntoIter = std::slice::Iter<'a, PatternPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Resolution a pattern was recorded at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSpec {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Configuration a pattern was authored against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseSettings {
    /// In-game sensitivity used while recording
    pub sensitivity: f32,

    /// Screen resolution used while recording
    pub resolution: ResolutionSpec,

    /// Aspect ratio label, e.g. "16:9"
    pub aspect_ratio: String,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            sensitivity: 2.0,
            resolution: ResolutionSpec {
                width: 1920,
                height: 1080,
            },
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Named pattern as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    /// Lookup name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Suggested hotkey, if any
    #[serde(default, deserialize_with = "deserialize_hotkey")]
    pub default_hotkey: Option<String>,

    /// Authoring baseline
    #[serde(default)]
    pub base_settings: BaseSettings,

    /// The points themselves
    pub pattern: Pattern,
}

impl PatternRecord {
    /// Create a record with baseline settings and no description
    pub fn new(name: impl Into<String>, pattern: Pattern) -> Self {
        let name = name.into();
        Self {
            description: format!("Recoil pattern for {}", name),
            name,
            default_hotkey: None,
            base_settings: BaseSettings::default(),
            pattern,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HotkeyField {
    Code(i64),
    Name(String),
}

fn deserialize_hotkey<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<HotkeyField>::deserialize(deserializer)? {
        None => None,
        Some(HotkeyField::Code(code)) => virtual_key_name(code),
        Some(HotkeyField::Name(name)) => {
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        }
    })
}

/// Key name for a Windows virtual-key code; `0` and negatives mean unset
fn virtual_key_name(code: i64) -> Option<String> {
    let name = match code {
        i64::MIN..=0 => return None,
        0x30..=0x39 | 0x41..=0x5A => char::from(code as u8).to_string(),
        0x60..=0x69 => format!("NUMPAD{}", code - 0x60),
        0x70..=0x87 => format!("F{}", code - 0x6F),
        _ => format!("VK_{:02X}", code),
    };
    Some(name)
}

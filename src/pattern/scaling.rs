//! Pattern Scaling
//!
//! Maps a pattern authored at the baseline configuration onto the user's
//! sensitivity, resolution and aspect ratio.
//!
//! ```text
//! dx' = round(dx * sensitivity_scale * res_scale_x * aspect_scale)
//! dy' = round(dy * sensitivity_scale * res_scale_y * aspect_scale)
//! delay_ms' = delay_ms
//! ```
//!
//! Rounding is half away from zero, applied the same way to both signs, so
//! a pattern and its mirror image scale to mirror images.

use serde::{Deserialize, Serialize};

use super::{Pattern, PatternPoint};
use crate::config::EngineSettings;

/// Baseline resolution width patterns are authored at
pub const BASE_RESOLUTION_WIDTH: f32 = 1920.0;

/// Baseline resolution height patterns are authored at
pub const BASE_RESOLUTION_HEIGHT: f32 = 1080.0;

/// Baseline aspect ratio patterns are authored at
pub const BASE_ASPECT_RATIO: f32 = 16.0 / 9.0;

/// Baseline sensitivity numerator (`sensitivity_scale = 2.0 / sensitivity`)
pub const BASE_SENSITIVITY: f32 = 2.0;

/// Multiplicative corrections applied to every point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingFactors {
    /// `2.0 / sensitivity`
    pub sensitivity_scale: f32,
    /// `width / 1920`
    pub res_scale_x: f32,
    /// `height / 1080`
    pub res_scale_y: f32,
    /// `aspect_ratio / (16 / 9)`
    pub aspect_scale: f32,
}

impl ScalingFactors {
    /// Factors that leave a pattern unchanged
    pub const fn identity() -> Self {
        Self {
            sensitivity_scale: 1.0,
            res_scale_x: 1.0,
            res_scale_y: 1.0,
            aspect_scale: 1.0,
        }
    }

    /// Create factors from explicit components
    pub const fn new(
        sensitivity_scale: f32,
        res_scale_x: f32,
        res_scale_y: f32,
        aspect_scale: f32,
    ) -> Self {
        Self {
            sensitivity_scale,
            res_scale_x,
            res_scale_y,
            aspect_scale,
        }
    }

    /// Derive factors from engine settings
    ///
    /// Settings are expected to be validated (all values > 0).
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            sensitivity_scale: BASE_SENSITIVITY / settings.sensitivity,
            res_scale_x: settings.resolution_width as f32 / BASE_RESOLUTION_WIDTH,
            res_scale_y: settings.resolution_height as f32 / BASE_RESOLUTION_HEIGHT,
            aspect_scale: settings.aspect_ratio / BASE_ASPECT_RATIO,
        }
    }

    /// Combined horizontal multiplier
    pub fn x_multiplier(&self) -> f32 {
        self.sensitivity_scale * self.res_scale_x * self.aspect_scale
    }

    /// Combined vertical multiplier
    pub fn y_multiplier(&self) -> f32 {
        self.sensitivity_scale * self.res_scale_y * self.aspect_scale
    }

    /// Scale a single point
    pub fn apply(&self, point: &PatternPoint) -> PatternPoint {
        PatternPoint {
            dx: scale_component(point.dx, self.x_multiplier()),
            dy: scale_component(point.dy, self.y_multiplier()),
            delay_ms: point.delay_ms,
        }
    }
}

impl Default for ScalingFactors {
    fn default() -> Self {
        Self::identity()
    }
}

/// Produce a scaled copy of `pattern`
///
/// Pure and deterministic; length and delays are preserved.
pub fn scale(pattern: &Pattern, factors: &ScalingFactors) -> Pattern {
    pattern.iter().map(|p| factors.apply(p)).collect()
}

fn scale_component(value: i32, multiplier: f32) -> i32 {
    // `as` saturates on overflow and maps NaN to 0
    (value as f32 * multiplier).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings(sensitivity: f32, width: u32, height: u32, aspect_ratio: f32) -> EngineSettings {
        EngineSettings {
            sensitivity,
            resolution_width: width,
            resolution_height: height,
            aspect_ratio,
            return_to_original: true,
        }
    }

    #[test]
    fn test_baseline_settings_are_identity() {
        let factors = ScalingFactors::from_settings(&EngineSettings::default());
        assert!((factors.sensitivity_scale - 1.0).abs() < 1e-6);
        assert!((factors.res_scale_x - 1.0).abs() < 1e-6);
        assert!((factors.res_scale_y - 1.0).abs() < 1e-6);
        assert!((factors.aspect_scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_factors_from_settings() {
        let factors = ScalingFactors::from_settings(&settings(1.0, 2560, 1440, 4.0 / 3.0));
        assert!((factors.sensitivity_scale - 2.0).abs() < 1e-6);
        assert!((factors.res_scale_x - 2560.0 / 1920.0).abs() < 1e-6);
        assert!((factors.res_scale_y - 1440.0 / 1080.0).abs() < 1e-6);
        assert!((factors.aspect_scale - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_rounding_half_away_from_zero_both_signs() {
        let factors = ScalingFactors::new(1.5, 1.0, 1.0, 1.0);
        let pattern: Pattern = vec![PatternPoint::new(3, -3, 10)].into();

        let scaled = scale(&pattern, &factors);
        assert_eq!(scaled.points(), &[PatternPoint::new(5, -5, 10)]);
    }

    #[test]
    fn test_rounding_below_half() {
        let factors = ScalingFactors::new(1.2, 1.0, 1.0, 1.0);
        let pattern: Pattern = vec![PatternPoint::new(2, -2, 7)].into();

        // 2.4 -> 2, -2.4 -> -2
        let scaled = scale(&pattern, &factors);
        assert_eq!(scaled.points(), &[PatternPoint::new(2, -2, 7)]);
    }

    #[test]
    fn test_axes_scale_independently() {
        let factors = ScalingFactors::from_settings(&settings(2.0, 3840, 1080, 16.0 / 9.0));
        let pattern: Pattern = vec![PatternPoint::new(10, 10, 5)].into();

        let scaled = scale(&pattern, &factors);
        assert_eq!(scaled.points(), &[PatternPoint::new(20, 10, 5)]);
    }

    #[test]
    fn test_empty_pattern_scales_to_empty() {
        let scaled = scale(&Pattern::default(), &ScalingFactors::new(3.0, 2.0, 1.0, 0.5));
        assert!(scaled.is_empty());
    }

    fn arb_pattern() -> impl Strategy<Value = Pattern> {
        prop::collection::vec(
            (-500i32..500, -500i32..500, 0u32..200).prop_map(|(x, y, d)| PatternPoint::new(x, y, d)),
            0..64,
        )
        .prop_map(Pattern::new)
    }

    proptest! {
        #[test]
        fn prop_scale_preserves_length_and_delays(
            pattern in arb_pattern(),
            s in 0.1f32..4.0,
            rx in 0.25f32..3.0,
            ry in 0.25f32..3.0,
            a in 0.5f32..2.0,
        ) {
            let scaled = scale(&pattern, &ScalingFactors::new(s, rx, ry, a));
            prop_assert_eq!(scaled.len(), pattern.len());
            for (orig, new) in pattern.iter().zip(scaled.iter()) {
                prop_assert_eq!(orig.delay_ms, new.delay_ms);
            }
        }

        #[test]
        fn prop_identity_is_noop(pattern in arb_pattern()) {
            prop_assert_eq!(scale(&pattern, &ScalingFactors::identity()), pattern);
        }

        #[test]
        fn prop_mirrored_input_scales_to_mirrored_output(
            pattern in arb_pattern(),
            s in 0.1f32..4.0,
        ) {
            let factors = ScalingFactors::new(s, 1.0, 1.0, 1.0);
            let mirrored: Pattern = pattern
                .iter()
                .map(|p| PatternPoint::new(-p.dx, -p.dy, p.delay_ms))
                .collect();

            let a = scale(&pattern, &factors);
            let b = scale(&mirrored, &factors);
            for (p, q) in a.iter().zip(b.iter()) {
                prop_assert_eq!(p.dx, -q.dx);
                prop_assert_eq!(p.dy, -q.dy);
            }
        }
    }
}

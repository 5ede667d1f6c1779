use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Knobs for a layout run. Defaults reproduce the plain algorithm: no overlap buffer, random
/// displacements starting at max(room count, 50) and cooling down to 20, and no iteration caps.
///
/// Any field left out of a serialized form takes its default.
#[derive(Clone, Debug, Derivative, Eq, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct LayoutSettings {
    /// Buffer applied to every room's overlap test.
    pub overlap_adjust: i32,

    /// Lower bound of the first explode sweep's maximum displacement.
    #[derivative(Default(value = "50"))]
    pub initial_displacement_floor: i32,

    /// The maximum displacement cools by one per explode sweep until it reaches this value.
    #[derivative(Default(value = "20"))]
    pub displacement_floor: i32,

    pub max_explode_sweeps: Option<u64>,

    pub max_condense_iterations: Option<u64>,
}

impl LayoutSettings {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.overlap_adjust < 0 {
            return Err(LayoutError::InvalidSettings(format!(
                "overlap_adjust must not be negative, got {}",
                self.overlap_adjust
            )));
        }
        if self.displacement_floor < 0 {
            return Err(LayoutError::InvalidSettings(format!(
                "displacement_floor must not be negative, got {}",
                self.displacement_floor
            )));
        }
        if self.initial_displacement_floor < 0 {
            return Err(LayoutError::InvalidSettings(format!(
                "initial_displacement_floor must not be negative, got {}",
                self.initial_displacement_floor
            )));
        }
        if self.max_explode_sweeps == Some(0) {
            return Err(LayoutError::InvalidSettings("max_explode_sweeps must be at least 1".into()));
        }
        if self.max_condense_iterations == Some(0) {
            return Err(LayoutError::InvalidSettings(
                "max_condense_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod layout_settings_tests {
    use super::*;

    #[test]
    pub fn defaults_match_the_plain_algorithm() {
        let settings = LayoutSettings::default();
        assert_eq!(settings.overlap_adjust, 0);
        assert_eq!(settings.initial_displacement_floor, 50);
        assert_eq!(settings.displacement_floor, 20);
        assert_eq!(settings.max_explode_sweeps, None);
        assert_eq!(settings.max_condense_iterations, None);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    pub fn rejects_negative_buffers_and_zero_caps() {
        let negative_adjust = LayoutSettings {
            overlap_adjust: -1,
            ..LayoutSettings::default()
        };
        assert!(matches!(negative_adjust.validate(), Err(LayoutError::InvalidSettings(_))));

        let zero_cap = LayoutSettings {
            max_condense_iterations: Some(0),
            ..LayoutSettings::default()
        };
        assert!(matches!(zero_cap.validate(), Err(LayoutError::InvalidSettings(_))));

        let negative_floor = LayoutSettings {
            displacement_floor: -5,
            ..LayoutSettings::default()
        };
        assert!(matches!(negative_floor.validate(), Err(LayoutError::InvalidSettings(_))));
    }
}

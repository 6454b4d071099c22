//! Unit formatting for generated dimension text

use serde::{Deserialize, Serialize};

use crate::constants::{METERS_PER_FOOT, METERS_PER_INCH};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    #[default]
    Meters,
    Centimeters,
    Millimeters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImperialUnit {
    #[default]
    Feet,
    Inches,
}

/// Display units for lengths, areas and angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    pub system: UnitSystem,
    pub metric_unit: MetricUnit,
    pub imperial_unit: ImperialUnit,
    /// Decimal places for lengths and areas
    pub precision: usize,
    /// Decimal places for angles
    pub angle_precision: usize,
    /// Model units to meters
    pub scale_length: f32,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            system: UnitSystem::Metric,
            metric_unit: MetricUnit::Meters,
            imperial_unit: ImperialUnit::Feet,
            precision: 2,
            angle_precision: 1,
            scale_length: 1.0,
        }
    }
}

impl UnitSettings {
    /// (meters per display unit, suffix)
    fn length_unit(&self) -> (f32, &'static str) {
        match self.system {
            UnitSystem::Metric => match self.metric_unit {
                MetricUnit::Meters => (1.0, " m"),
                MetricUnit::Centimeters => (0.01, " cm"),
                MetricUnit::Millimeters => (0.001, " mm"),
            },
            UnitSystem::Imperial => match self.imperial_unit {
                ImperialUnit::Feet => (METERS_PER_FOOT, "'"),
                ImperialUnit::Inches => (METERS_PER_INCH, "\""),
            },
        }
    }

    /// Formats a model-space length.
    pub fn format_distance(&self, length: f32) -> String {
        let (per_unit, suffix) = self.length_unit();
        let value = length * self.scale_length / per_unit;
        format!("{:.*}{}", self.precision, value, suffix)
    }

    /// Formats a model-space area.
    pub fn format_area(&self, area: f32) -> String {
        let (per_unit, _) = self.length_unit();
        let value = area * self.scale_length * self.scale_length / (per_unit * per_unit);
        let suffix = match self.system {
            UnitSystem::Metric => match self.metric_unit {
                MetricUnit::Meters => " m²",
                MetricUnit::Centimeters => " cm²",
                MetricUnit::Millimeters => " mm²",
            },
            UnitSystem::Imperial => match self.imperial_unit {
                ImperialUnit::Feet => " sq ft",
                ImperialUnit::Inches => " sq in",
            },
        };
        format!("{:.*}{}", self.precision, value, suffix)
    }

    /// Formats an angle given in radians as degrees.
    pub fn format_angle(&self, radians: f32) -> String {
        format!("{:.*}°", self.angle_precision, radians.to_degrees())
    }
}

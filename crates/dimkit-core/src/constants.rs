//! Global constants for dimkit-core

/// Default colour for new styles (black, RGBA)
pub const DEFAULT_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Default colour for area fills (RGBA)
pub const DEFAULT_FILL_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Default dimension offset from the measured geometry (model units)
pub const DEFAULT_DIM_OFFSET: f32 = 0.5;

/// Default leader stand-off from the measured geometry (model units)
pub const DEFAULT_LEADER_OFFSET: f32 = 0.05;

/// Default endcap size (points)
pub const DEFAULT_ENDCAP_SIZE: f32 = 4.0;

/// Default endcap arrow half angle (radians)
pub const DEFAULT_ARROW_ANGLE: f32 = 0.4;

/// Default font size (points)
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Default line weight (pixels)
pub const DEFAULT_LINE_WEIGHT: f32 = 1.0;

/// Default crease threshold for dynamic linework (radians)
pub const DEFAULT_CREASE_ANGLE: f32 = 0.5236;

/// Default paper resolution (pixels per inch)
pub const DEFAULT_RESOLUTION: u32 = 150;

/// Default drawing scale when no paper view applies
pub const DEFAULT_SCALE: f32 = 1.0;

/// Meters per inch
pub const METERS_PER_INCH: f32 = 0.0254;

/// Meters per foot
pub const METERS_PER_FOOT: f32 = 0.3048;

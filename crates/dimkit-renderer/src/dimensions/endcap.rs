//! Endcap geometry
//!
//! Caps are built in the plane spanned by the dimension line and the offset
//! direction. Sizes are in points and scale with the drawing scale.

use glam::Vec3;

use dimkit_core::geometry::rotate_about;
use dimkit_core::style::EndcapType;

/// Points to model units for arrow caps.
const ARROW_SIZE_DIVISOR: f32 = 1574.804;

/// Tick half length per point of cap size.
const TICK_LENGTH: f32 = 0.007;

/// Tick square corner factors.
const SQUARE_A: f32 = 0.0035;
const SQUARE_B: f32 = 0.0045;

/// Segments and filled triangles of one cap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndcapGeometry {
    /// Segment list, consumed pairwise.
    pub lines: Vec<Vec3>,
    /// Triangle list.
    pub filled: Vec<Vec3>,
}

impl EndcapGeometry {
    /// Appends another cap's geometry.
    pub fn extend(&mut self, other: EndcapGeometry) {
        self.lines.extend(other.lines);
        self.filled.extend(other.filled);
    }
}

/// Where a cap sits and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapPlacement {
    /// Tip of the cap.
    pub position: Vec3,
    /// Point the cap's line runs towards (usually the line midpoint).
    pub midpoint: Vec3,
    /// Offset direction of the dimension.
    pub user_offset: Vec3,
    /// 0 for the first cap, 1 for the second.
    pub index: usize,
    /// Point the arrow outwards (text placed outside the line).
    pub flip: bool,
}

/// Cap size and angle from the style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapStyle {
    /// Size in points.
    pub size: f32,
    /// Arrow half angle, radians.
    pub arrow_angle: f32,
    /// Drawing scale.
    pub scale: f32,
}

/// Builds the geometry of one cap.
pub fn generate_end_caps(cap: EndcapType, style: &CapStyle, at: &CapPlacement) -> EndcapGeometry {
    let mut geometry = EndcapGeometry::default();
    let pos = at.position;
    let dist = (pos - at.midpoint).normalize_or_zero();
    let norm = dist
        .cross(at.user_offset)
        .try_normalize()
        .unwrap_or_else(|| dist.any_orthonormal_vector());

    match cap {
        EndcapType::None => {}
        EndcapType::Line | EndcapType::Triangle => {
            let size = style.size * style.scale / ARROW_SIZE_DIVISOR;
            let mut angle = style.arrow_angle;
            if at.flip {
                angle += std::f32::consts::PI;
            }
            let line = dist * size;
            let p1 = pos - rotate_about(line, norm, angle);
            let p2 = pos;
            let p3 = pos - rotate_about(line, norm, -angle);

            if cap == EndcapType::Triangle {
                geometry.filled.extend([p1, p2, p3]);
            } else {
                geometry.lines.extend([p1, p2, p3, p2]);
            }
        }
        EndcapType::Dot => {
            let tick_angle = -std::f32::consts::FRAC_PI_2;
            let tick = rotate_about(at.user_offset * TICK_LENGTH, norm, tick_angle);
            geometry.lines.extend([pos, tick * style.size + pos]);

            let x = dist * style.size;
            let y = at.user_offset.normalize_or_zero() * style.size;
            let square = [
                SQUARE_A * x + SQUARE_B * y,
                SQUARE_B * x + SQUARE_A * y,
                -SQUARE_A * x - SQUARE_B * y,
                -SQUARE_B * x - SQUARE_A * y,
            ]
            .map(|s| {
                let s = if at.index < 1 {
                    rotate_about(s, norm, tick_angle)
                } else {
                    s
                };
                s + pos
            });
            geometry
                .filled
                .extend([square[0], square[1], square[2], square[0], square[2], square[3]]);
        }
    }
    geometry
}

/// Caps for both ends of a dimension line.
pub fn cap_pair(
    caps: [EndcapType; 2],
    style: &CapStyle,
    positions: [Vec3; 2],
    midpoint: Vec3,
    user_offset: Vec3,
    flip: bool,
) -> EndcapGeometry {
    let mut geometry = EndcapGeometry::default();
    for (index, (cap, position)) in caps.into_iter().zip(positions).enumerate() {
        geometry.extend(generate_end_caps(
            cap,
            style,
            &CapPlacement {
                position,
                midpoint,
                user_offset,
                index,
                flip,
            },
        ));
    }
    geometry
}

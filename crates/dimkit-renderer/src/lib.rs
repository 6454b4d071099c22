//! dimkit renderer
//!
//! Turns the records of `dimkit-core` into drawable geometry: dimensions,
//! annotations, linework and material hatches.
//!
//! # Architecture
//!
//! Nothing here owns a GPU. Geometry goes out through two contracts:
//!
//! - [`batch::RenderBackend`] - raster draw calls, wrapped by
//!   [`batch::BatchLayer`] which owns the pass ordering and blending policy
//! - [`surface::DrawingSurface`] - vector nodes, mirrored from every raster
//!   emission in vector frames ([`surface::SvgSurface`] writes SVG)
//!
//! [`traversal::Engine`] drives a frame over a [`dimkit_core::Scene`].
//!
//! # Module Structure
//!
//! ```text
//! dimkit-renderer/
//! ├── batch.rs         # Backend contract and pass policy
//! ├── surface.rs       # Vector surface contract, SVG writer
//! ├── emit.rs          # Paired raster/vector output
//! ├── camera.rs        # Camera and projection
//! ├── frame.rs         # Per-frame context
//! ├── context.rs       # Per-item context and owner transforms
//! ├── color.rs         # Gamma and selection highlight
//! ├── text_layout.rs   # Text cards and font contract
//! ├── dimensions/      # One module per dimension kind
//! ├── annotation.rs    # Leaders, notes and custom shapes
//! ├── linework.rs      # Crease, silhouette and explicit edges
//! ├── hatch.rs         # Material hatches (vector only)
//! ├── zorder.rs        # Back-to-front ordering
//! ├── traversal.rs     # Frame entry point
//! └── testing.rs       # Recording doubles
//! ```

pub mod annotation;
pub mod batch;
pub mod camera;
pub mod color;
pub mod context;
pub mod dimensions;
pub mod emit;
pub mod frame;
pub mod hatch;
pub mod linework;
pub mod surface;
pub mod testing;
pub mod text_layout;
pub mod traversal;
pub mod zorder;

pub use annotation::{CustomShapeDraw, draw_annotation};
pub use batch::{BatchKey, BatchLayer, LineOptions, RenderBackend, Topology};
pub use camera::{Camera, CameraUniform, Projection};
pub use context::{DrawContext, DrawOutcome, Owner};
pub use emit::Output;
pub use frame::{FrameContext, FrameMode};
pub use linework::{draw_line_group, draw_line_groups};
pub use surface::{DrawingSurface, SvgSurface};
pub use text_layout::{FontId, FontRasterizer};
pub use traversal::{Engine, FrameReport};
pub use zorder::z_order;

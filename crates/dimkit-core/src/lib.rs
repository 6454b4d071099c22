//! dimkit core
//!
//! Data model for the dimkit annotation engine: scene objects and their
//! meshes, shared styles, text fields, dimension/annotation/line-group
//! records, views, plus the geometric primitives every drawing algorithm
//! builds on.
//!
//! Nothing in this crate issues draw calls; see `dimkit-renderer` for the
//! algorithms that turn these records into geometry.

pub mod annotation;
pub mod config;
pub mod constants;
pub mod dimension;
pub mod error;
pub mod geometry;
pub mod linework;
pub mod mesh;
pub mod scene;
pub mod style;
pub mod text;
pub mod units;
pub mod view;

pub use annotation::{Annotation, AnnotationGenerator, CustomShapeLocation};
pub use config::{DebugConfig, EngineConfig, ThemeConfig};
pub use dimension::{
    AlignedDimension, AngleDimension, AnchorRef, ArcDimension, AreaDimension, AxisDimension,
    BoundsCache, BoundsDimension, DimWrapper, DimensionCommon, DimensionGenerator, DimensionKind,
    GizmoState, MeasureAxis, PruneRequest, PruneTarget,
};
pub use error::{ConfigError, GeometryError};
pub use geometry::BoundingBox;
pub use linework::{BatchHandle, LineGenerator, LineGroup, LineSource, LineworkCache};
pub use mesh::{Face, GeometryProvider, Mesh, ModifierKind};
pub use scene::{
    Hatch, Instance, InteractionMode, Material, ObjectKind, ObjectVisibility, Scene, SceneObject,
};
pub use style::{
    EndcapType, Style, StyleBinding, StyleCategory, StyleLibrary, StyleRef, TextAlignment,
    TextPosition, ViewPlane,
};
pub use text::{
    ObjectProperty, RasterKey, TextCard, TextField, TextSource, TextSourceContext, TextTexture,
};
pub use units::{UnitSettings, UnitSystem};
pub use view::{ResolutionType, View};

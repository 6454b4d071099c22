//! End-to-end frames through `Engine::draw_frame`

use approx::assert_relative_eq;
use glam::{Mat4, Quat, Vec3};

use dimkit_core::annotation::Annotation;
use dimkit_core::dimension::{
    AlignedDimension, AnchorRef, AngleDimension, ArcDimension, AreaDimension, AxisDimension,
    BoundsCache, BoundsDimension, DimensionCommon, MeasureAxis,
};
use dimkit_core::linework::{LineGroup, LineSource};
use dimkit_core::mesh::{Face, Mesh};
use dimkit_core::scene::{Scene, SceneObject};
use dimkit_core::style::{EndcapType, Style, StyleBinding};
use dimkit_core::text::TextField;
use dimkit_renderer::dimensions::angle_segment_count;
use dimkit_renderer::testing::{DrawCall, MonospaceRasterizer, RecordingBackend, RecordingSurface};
use dimkit_renderer::{Camera, Engine, FrameMode, FrameReport, SvgSurface};

fn mesh_object(name: &str, vertices: Vec<Vec3>) -> SceneObject {
    let mut mesh = Mesh::new();
    mesh.vertices = vertices;
    SceneObject::with_mesh(name, mesh)
}

fn run(engine: &Engine, scene: &mut Scene, backend: &mut RecordingBackend) -> FrameReport {
    let frame = engine.frame_context(FrameMode::Viewport, Camera::default(), scene);
    let mut fonts = MonospaceRasterizer::new();
    engine.draw_frame(scene, &frame, backend, None, &mut fonts)
}

#[test]
fn aligned_dimension_offsets_along_view_perpendicular() {
    let mut scene = Scene::new();
    let mut object = mesh_object("bar", vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]);
    let id = object.id;
    let style = Style {
        dim_offset: 2.0,
        ..Style::default()
    };
    object.dimensions.add_aligned(AlignedDimension {
        common: DimensionCommon {
            binding: StyleBinding::inline(style),
            ..DimensionCommon::named("span")
        },
        anchor_a: AnchorRef::vertex(id, 0),
        anchor_b: AnchorRef::vertex(id, 1),
    });
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.items_drawn, 1);

    let (_, lines) = backend.line_calls().next().expect("dimension lines");
    // Leaders start at the measured points, sorted larger X first.
    assert_relative_eq!(lines[0].x, 10.0, epsilon = 1e-5);
    assert_relative_eq!(lines[2].x, 0.0, epsilon = 1e-5);
    // Dimension line sits two units up +Y.
    for p in &lines[4..6] {
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }
    assert!(lines[4].x >= 10.0 - 1e-5);
    assert!(lines[5].x <= 1e-5);

    let gizmo = scene.objects[0].dimensions.aligned[0].common.gizmo.location;
    assert_relative_eq!(gizmo.x, 5.0, epsilon = 1e-5);
    assert_relative_eq!(gizmo.y, 2.0, epsilon = 1e-5);
    assert_relative_eq!(gizmo.z, 0.0, epsilon = 1e-5);
}

fn span_scene() -> Scene {
    let mut scene = Scene::new();
    let mut object = mesh_object("bar", vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]);
    let id = object.id;
    object.dimensions.add_aligned(AlignedDimension {
        common: DimensionCommon::named("span"),
        anchor_a: AnchorRef::vertex(id, 0),
        anchor_b: AnchorRef::vertex(id, 1),
    });
    scene.add_object(object);
    scene
}

fn label_size(scene: &Scene) -> (u32, f32) {
    let field = &scene.objects[0].dimensions.aligned[0].common.text_fields[0];
    let texture = field.texture.as_ref().expect("label texture");
    let card = field.card.expect("label card");
    (texture.width, card.x_axis().length())
}

#[test]
fn label_keeps_its_size_across_resolutions() {
    let mut scene = span_scene();
    let mut engine = Engine::default();
    let mut backend = RecordingBackend::new();

    engine.config.default_resolution = 72;
    run(&engine, &mut scene, &mut backend);
    let (width_72, card_72) = label_size(&scene);

    engine.config.default_resolution = 300;
    run(&engine, &mut scene, &mut backend);
    let (width_300, card_300) = label_size(&scene);

    assert!(width_300 > width_72 * 4);
    assert_relative_eq!(card_300, card_72, max_relative = 0.02);
}

#[test]
fn invalidate_rerasterizes_labels() {
    let mut scene = span_scene();
    let mut engine = Engine::default();
    let mut backend = RecordingBackend::new();
    run(&engine, &mut scene, &mut backend);

    let field = &mut scene.objects[0].dimensions.aligned[0].common.text_fields[0];
    field.texture_updated = false;
    engine.invalidate(&mut scene);
    assert!(scene.objects[0].dimensions.aligned[0].common.text_fields[0].text_updated);

    run(&engine, &mut scene, &mut backend);
    let field = &scene.objects[0].dimensions.aligned[0].common.text_fields[0];
    assert!(!field.text_updated);
    assert!(field.texture.is_some());
}

fn bounds_dim() -> BoundsDimension {
    BoundsDimension {
        common: DimensionCommon::named("box"),
        collection: None,
        calc_axis_aligned: true,
        draw_axis: [true, true, true],
        cache: BoundsCache::default(),
    }
}

fn cube(name: &str) -> SceneObject {
    mesh_object(
        name,
        vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
        ],
    )
}

#[test]
fn bounds_of_unrotated_object_leave_cache_empty() {
    let mut scene = Scene::new();
    let mut object = cube("crate");
    object.dimensions.add_bounds(bounds_dim());
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    run(&Engine::default(), &mut scene, &mut backend);
    assert!(scene.objects[0].dimensions.bounds[0].cache.is_empty());
    assert!(backend.line_calls().count() > 0);
}

#[test]
fn bounds_of_rotated_object_are_cached() {
    let mut scene = Scene::new();
    let mut object = cube("crate").with_transform(Mat4::from_quat(Quat::from_rotation_z(0.3)));
    object.dimensions.add_bounds(bounds_dim());
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    run(&Engine::default(), &mut scene, &mut backend);
    assert!(scene.objects[0].dimensions.bounds[0].cache.single.is_some());
}

#[test]
fn right_angle_tessellation() {
    let mut scene = Scene::new();
    let mut object = mesh_object("corner", vec![Vec3::X, Vec3::ZERO, Vec3::Y]);
    object.dimensions.add_angle(AngleDimension {
        common: DimensionCommon::named("corner"),
        points: [0, 1, 2],
        radius: 1.0,
        reflex: false,
    });
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    run(&Engine::default(), &mut scene, &mut backend);

    let segments = angle_segment_count(1.0, std::f32::consts::FRAC_PI_2);
    assert_eq!(segments, 5 + 45);
    // Point pass: both arc ends plus every swept vertex.
    let point_counts: Vec<usize> = backend
        .calls
        .iter()
        .filter_map(|c| match c {
            DrawCall::Points { vertices, .. } => Some(vertices.len()),
            _ => None,
        })
        .collect();
    assert_eq!(point_counts, vec![segments + 3]);

    let text = &scene.objects[0].dimensions.angle[0].common.text_fields[0].text;
    assert!(text.starts_with("90"), "unexpected angle text {text}");
}

#[test]
fn stale_vertex_reference_prunes_one_dimension() {
    let mut scene = Scene::new();
    let vertices = (0..10).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
    let mut object = mesh_object("rail", vertices);
    let id = object.id;
    for (name, b) in [("ok", 9), ("stale", 9999)] {
        object.dimensions.add_aligned(AlignedDimension {
            common: DimensionCommon::named(name),
            anchor_a: AnchorRef::vertex(id, 0),
            anchor_b: AnchorRef::vertex(id, b),
        });
    }
    scene.add_object(object);
    let wrappers_before = scene.objects[0].dimensions.wrappers.len();

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);

    let dims = &scene.objects[0].dimensions;
    assert_eq!(report.pruned, 1);
    assert_eq!(dims.wrappers.len(), wrappers_before - 1);
    assert_eq!(dims.aligned.len(), 1);
    assert_eq!(dims.aligned[0].common.name, "ok");

    // The survivor keeps drawing on the next frame.
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.pruned, 0);
    assert_eq!(report.items_drawn, 1);
}

fn line_object(group: &str, z: f32) -> SceneObject {
    let mut object = mesh_object(group, vec![Vec3::ZERO, Vec3::X])
        .with_transform(Mat4::from_translation(Vec3::Z * z));
    object
        .line_groups
        .add(LineGroup::new(group, LineSource::Explicit(vec![0, 1])));
    object
}

#[test]
fn vector_frames_paint_far_objects_first() {
    let mut scene = Scene::new();
    // Default camera sits at z = 10: depths 5, -2 and 10.
    scene.add_object(line_object("near", 5.0));
    scene.add_object(line_object("behind", 12.0));
    scene.add_object(line_object("far", 0.0));

    let engine = Engine::default();
    let frame = engine.frame_context(FrameMode::Vector, Camera::default(), &scene);
    let mut backend = RecordingBackend::new();
    let mut surface = RecordingSurface::new();
    let mut fonts = MonospaceRasterizer::new();
    let report = engine.draw_frame(
        &mut scene,
        &frame,
        &mut backend,
        Some(&mut surface),
        &mut fonts,
    );

    assert_eq!(report.objects_drawn, 2);
    assert_eq!(surface.groups(), vec!["far", "near"]);
}

#[test]
fn svg_export_contains_linework_groups() {
    let mut scene = Scene::new();
    scene.add_object(line_object("outline", 0.0));

    let engine = Engine::default();
    let camera = Camera::default().orthographic(20.0);
    let frame = engine.frame_context(FrameMode::Vector, camera, &scene);
    let mut backend = RecordingBackend::new();
    let mut svg = SvgSurface::new(camera, 800.0, 600.0);
    let mut fonts = MonospaceRasterizer::new();
    engine.draw_frame(&mut scene, &frame, &mut backend, Some(&mut svg), &mut fonts);

    let document = svg.finish();
    assert!(document.starts_with("<svg"));
    assert!(document.contains("<g id=\"outline\">"));
}

#[test]
fn arc_through_three_points() {
    let mut scene = Scene::new();
    let mut object = mesh_object("arch", vec![Vec3::X, Vec3::Y, -Vec3::X]);
    object.dimensions.add_arc(ArcDimension {
        common: DimensionCommon::named("arch"),
        points: [0, 1, 2],
        show_radius: true,
        display_as_angle: false,
        endcap_c: EndcapType::None,
        center: None,
    });
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.items_drawn, 1);

    let dim = &scene.objects[0].dimensions.arc[0];
    let center = dim.center.expect("arc centre");
    assert!(center.length() < 1e-5);
    assert_eq!(dim.common.text_fields[0].text, "r 1.00 m");
    assert!(dim.common.text_fields[1].text.starts_with("3.14"));

    // Centre dot at five times the line weight.
    let centre_dots = backend
        .calls
        .iter()
        .filter(|c| matches!(c, DrawCall::Points { vertices, .. } if vertices.len() == 1))
        .count();
    assert_eq!(centre_dots, 1);
}

#[test]
fn collinear_arc_is_skipped_but_kept() {
    let mut scene = Scene::new();
    let mut object = mesh_object("rail", vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0]);
    object.dimensions.add_arc(ArcDimension {
        common: DimensionCommon::named("flat"),
        points: [0, 1, 2],
        show_radius: false,
        display_as_angle: false,
        endcap_c: EndcapType::None,
        center: None,
    });
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.items_drawn, 0);
    assert_eq!(report.pruned, 0);
    assert_eq!(scene.objects[0].dimensions.arc.len(), 1);
}

#[test]
fn axis_dimension_measures_projection() {
    let mut scene = Scene::new();
    let mut object = mesh_object("brace", vec![Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0)]);
    let id = object.id;
    object.dimensions.add_axis(AxisDimension {
        common: DimensionCommon::named("run"),
        anchor_a: AnchorRef::vertex(id, 0),
        anchor_b: AnchorRef::vertex(id, 1),
        axis: MeasureAxis::X,
        axis_object: None,
    });
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.items_drawn, 1);

    let dim = &scene.objects[0].dimensions.axis[0];
    assert_eq!(dim.common.text_fields[0].text, "3.00 m");

    // The dimension line runs along X only.
    let (_, lines) = backend.line_calls().next().expect("dimension lines");
    let (start, end) = (lines[4], lines[5]);
    assert!((start.x - end.x).abs() >= 3.0 - 1e-4);
    assert_relative_eq!(start.y, end.y, epsilon = 1e-5);
    assert_relative_eq!(start.z, end.z, epsilon = 1e-5);
}

#[test]
fn concave_area_label() {
    let outline = [(2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
        .map(|(x, y)| Vec3::new(x, y, 0.0))
        .to_vec();
    let mesh = Mesh::from_faces(outline, vec![Face::new(vec![0, 1, 2, 3, 4, 5])]);
    let mut object = SceneObject::with_mesh("floor", mesh);
    object.dimensions.add_area(AreaDimension {
        common: DimensionCommon::named("floor"),
        faces: vec![0],
        perimeter_edges: Vec::new(),
        origin_face: 0,
        text_offset: Vec3::ZERO,
        fill_color: [1.0, 1.0, 1.0, 1.0],
        fill_alpha: 0.5,
    });
    let mut scene = Scene::new();
    scene.add_object(object);

    let mut backend = RecordingBackend::new();
    run(&Engine::default(), &mut scene, &mut backend);
    let text = &scene.objects[0].dimensions.area[0].common.text_fields[0].text;
    assert_eq!(text, "3.00 m²");
}

/// A post with an annotation on its top vertex and a hidden marker object.
fn annotated_scene(shape_of_self: bool) -> Scene {
    let mut scene = Scene::new();
    let mut marker = mesh_object("marker", vec![Vec3::ZERO, Vec3::X]);
    marker.visibility.hidden = true;
    marker
        .line_groups
        .add(LineGroup::new("glyph", LineSource::Explicit(vec![0, 1])));
    let marker_id = marker.id;

    let mut post = mesh_object("post", vec![Vec3::ZERO, Vec3::Z]);
    let mut note = Annotation::new("tag", 1);
    note.offset = Vec3::new(1.0, 1.0, 0.0);
    note.text_fields.push(TextField::new("Check"));
    note.custom_shape = Some(vec![if shape_of_self { post.id } else { marker_id }]);
    post.annotations.add(note);

    scene.add_object(marker);
    scene.add_object(post);
    scene
}

#[test]
fn annotation_draws_leader_and_text() {
    let mut scene = annotated_scene(false);
    scene.objects[1].annotations.annotations[0].custom_shape = None;

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.items_drawn, 1);
    assert_eq!(report.shapes_drawn, 0);

    let bend = Vec3::new(1.0, 1.0, 1.0);
    let note = &scene.objects[1].annotations.annotations[0];
    let anchor = note.anchor_coord.expect("anchor");
    assert!(anchor.abs_diff_eq(Vec3::Z, 1e-5));
    assert!(note.gizmo_location.abs_diff_eq(bend, 1e-5));
    assert!(note.text_fields[0].card.is_some());
    assert_eq!(backend.text_quads(), 1);

    let (_, leader) = backend.line_calls().next().expect("leader");
    assert_eq!(leader.len(), 4);
    assert!(leader[1].abs_diff_eq(bend, 1e-5));
}

#[test]
fn annotation_redraws_custom_shape_at_anchor() {
    let mut scene = annotated_scene(false);

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.shapes_drawn, 1);

    // The hidden marker is only drawn through the annotation, at the anchor.
    let shape_passes: Vec<Vec3> = backend
        .line_calls()
        .filter(|(_, vertices)| vertices.as_slice() == [Vec3::ZERO, Vec3::X])
        .map(|(uniforms, _)| uniforms.object_transform.transform_point3(Vec3::ZERO))
        .collect();
    assert!(!shape_passes.is_empty());
    for origin in shape_passes {
        assert_relative_eq!(origin.z, 1.0, epsilon = 1e-5);
        assert_relative_eq!(origin.x, 0.0, epsilon = 1e-5);
    }
}

#[test]
fn annotation_containing_its_owner_keeps_its_shape() {
    let mut scene = annotated_scene(true);

    let mut backend = RecordingBackend::new();
    let report = run(&Engine::default(), &mut scene, &mut backend);
    assert_eq!(report.shapes_drawn, 0);
    assert_eq!(report.items_drawn, 1);

    let note = &scene.objects[1].annotations.annotations[0];
    assert_eq!(note.custom_shape, Some(vec![scene.objects[1].id]));
}

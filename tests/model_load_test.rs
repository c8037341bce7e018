use ascii_ngin::backend::{Aabb, RenderBackend};
use ascii_ngin::headless::{HeadlessBackend, HeadlessModel};
use ascii_ngin::scene::REFERENCE_SIZE;
use ascii_ngin::{InnerSpace, Point3, Vector3};

use crate::common::test_utils::{approx_eq, box_with_max_dim, test_config, unit_box, Rig};

mod common;

#[test]
fn load_requests_resolve_against_the_model_repository() {
    let rig = Rig::new(test_config());
    assert_eq!(
        rig.loader.next_url().as_deref(),
        Some("https://threejs.org/examples/models/gltf/Horse.glb")
    );
}

#[test]
fn models_normalize_to_the_reference_size() {
    for dim in [0.001_f32, 1.0, 1000.0] {
        let mut rig = Rig::new(test_config());
        rig.mount(640, 350);
        let (asset, model) = HeadlessModel::asset(box_with_max_dim(dim), 0);
        assert!(rig.loader.deliver(Ok(asset)));
        rig.scene.poll_load();

        let scaled = model.scale() * dim;
        assert!(
            approx_eq(scaled, REFERENCE_SIZE, 1e-4),
            "dim {dim} scaled to {scaled}"
        );
        assert!(model.materials_overridden());
        assert!(rig.scene.model_ready());
    }
}

#[test]
fn models_are_centered_at_the_origin() {
    let mut rig = Rig::new(test_config());
    rig.mount(640, 350);
    // center (1.5, 1.0, -2.0), largest extent 4.0 along x
    let bounds = Aabb::new(Point3::new(-0.5, 0.0, -3.0), Point3::new(3.5, 2.0, -1.0));
    let (asset, model) = HeadlessModel::asset(bounds, 0);
    assert!(rig.loader.deliver(Ok(asset)));
    rig.scene.poll_load();

    let scale = model.scale();
    assert!(approx_eq(scale, REFERENCE_SIZE / 4.0, 1e-6));
    let expected = Vector3::new(-1.5, -1.0, 2.0) * scale;
    assert!((model.position() - expected).magnitude() < 1e-5);
}

#[test]
fn load_completion_reveals_the_cell() {
    let mut rig = Rig::new(test_config());
    let mount = rig.mount(640, 350);
    assert_eq!(mount.reveals(), 0);

    let (asset, _model) = HeadlessModel::asset(unit_box(), 0);
    assert!(rig.loader.deliver(Ok(asset)));
    assert_eq!(mount.reveals(), 0, "nothing applies until a poll point");

    assert!(rig.tick(0));
    assert_eq!(mount.reveals(), 1);
    assert!(rig.scene.model_ready());
    assert!(rig.stack.model_attached());
}

#[test]
fn load_arriving_before_mount_reveals_at_mount() {
    let mut rig = Rig::new(test_config());
    let (asset, _model) = HeadlessModel::asset(unit_box(), 0);
    assert!(rig.loader.deliver(Ok(asset)));
    rig.scene.poll_load();
    assert!(rig.scene.model_ready());

    let mount = rig.mount(640, 350);
    assert_eq!(mount.reveals(), 1);
}

#[test]
fn failed_load_keeps_the_scene_running() {
    let mut rig = Rig::new(test_config());
    let mount = rig.mount(640, 350);
    assert!(rig
        .loader
        .deliver(Err(anyhow::anyhow!("fetch returned 404"))));

    assert!(rig.tick(0));
    assert!(rig.tick(40));

    assert!(!rig.scene.model_ready());
    assert_eq!(mount.reveals(), 0);
    assert_eq!(rig.stack.renders(), 2, "the loop renders the empty scene");
}

#[test]
fn an_abandoned_load_is_absorbed() {
    let mut rig = Rig::new(test_config());
    rig.mount(640, 350);
    assert!(rig.loader.abandon());

    assert!(rig.tick(0));
    assert!(rig.tick(40));
    assert!(!rig.scene.model_ready());
}

#[test]
fn degenerate_bounding_box_is_rejected() {
    let mut rig = Rig::new(test_config());
    let mount = rig.mount(640, 350);
    let point = Point3::new(1.0, 1.0, 1.0);
    let (asset, model) = HeadlessModel::asset(Aabb::new(point, point), 2);
    assert!(rig.loader.deliver(Ok(asset)));

    assert!(rig.tick(0));
    assert!(!rig.scene.model_ready());
    assert!(!rig.stack.model_attached());
    assert_eq!(mount.reveals(), 0);
    assert_eq!(model.started_clip(), None);
    // rejection happens after the material pass and before any transform
    assert!(model.materials_overridden());
    assert_eq!(model.scale(), 1.0);
}

#[test]
fn late_load_after_unmount_is_discarded() {
    let mut rig = Rig::new(test_config());
    let mount = rig.mount(640, 350);
    rig.scene.unmount();

    let (asset, model) = HeadlessModel::asset(unit_box(), 1);
    assert!(rig.loader.deliver(Ok(asset)), "the channel stays alive");
    rig.scene.poll_load();

    assert!(!rig.scene.model_ready());
    assert!(!rig.stack.model_attached());
    assert_eq!(mount.reveals(), 0);
    assert_eq!(model.started_clip(), None);
    assert!(!model.materials_overridden());
    assert!(rig.stack.disposed());
}

#[test]
fn first_clip_plays_when_present() {
    let mut rig = Rig::new(test_config());
    rig.mount(640, 350);
    let (asset, model) = HeadlessModel::asset(unit_box(), 3);
    assert!(rig.loader.deliver(Ok(asset)));
    rig.scene.poll_load();

    assert_eq!(model.started_clip(), Some(0));
}

#[test]
fn static_models_get_no_mixer() {
    let mut rig = Rig::new(test_config());
    rig.mount(640, 350);
    let (asset, model) = HeadlessModel::asset(unit_box(), 0);
    assert!(rig.loader.deliver(Ok(asset)));

    for i in 0..5 {
        assert!(rig.tick(i * 40));
    }
    assert_eq!(model.started_clip(), None);
    assert_eq!(model.mixer_seconds(), 0.0);
}

#[test]
fn scene_graph_hands_back_the_attached_model() {
    let (backend, _stack) = HeadlessBackend::new();
    let mut scene = backend
        .create_stack(&test_config())
        .expect("stack construction")
        .scene;
    assert!(scene.model().is_none());

    let (raw, model) = HeadlessModel::new(unit_box(), 0);
    scene.attach_model(Box::new(raw));
    let attached = scene.model_mut().expect("attached model");
    attached.rotate_y(0.25);
    assert!(approx_eq(model.rotation_y(), 0.25, 1e-6));
}

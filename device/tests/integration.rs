use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use vrplex_core::hmd::mock::MockHmd;
use vrplex_core::math::{Quat, Vec3};
use vrplex_core::{Config, EntityPose, Eye, HmdEntity, HmdInput, HmdKind, ManualClock, Timestamp};
use vrplex_device::{
    ButtonsBackend, DummyGamepads, DummyInterfaces, GamepadProvider, GamepadState, Observer,
    RuntimeContext, TrackedDevice, TrackedObserver, TrackingBackend,
};

const SESSION: &str = r#"
[[device]]
id = "head"
tracking = { type = "oculus", parameters = "head" }

[[device]]
id = "pad"
buttons = { type = "gamepad", parameters = "0" }
analogs = { type = "gamepad", parameters = "0" }

[[device]]
id = "remote"
process = 1
tracking = { type = "vrpn", parameters = "Remote@tracker 2" }

[[observer]]
id = "viewer"
head_device = "head"

[[process]]
id = "master"

[[process]]
id = "slave"
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Runtime-driven session
// ---------------------------------------------------------------------------

#[test]
fn head_tracking_feeds_observer() {
    init_logging();
    let config = Config::from_toml_str(SESSION).unwrap();
    let hmd = Arc::new(MockHmd::new(HmdKind::Oculus));
    let clock = Arc::new(ManualClock::new(Timestamp::from_nanos(0)));
    let ctx = RuntimeContext::new(0)
        .with_clock(clock.clone())
        .with_hmd(hmd.clone());

    let mut devices = TrackedDevice::from_config(&config, &ctx);
    let mut observer = TrackedObserver::from_config(&config).remove(0);

    // Seated runtime pose, lifted to standing height.
    hmd.set_pose(
        HmdEntity::Head,
        EntityPose::new(Vec3::new(0.0, 0.0, 0.5), Quat::identity()),
    );
    for device in &mut devices {
        device.update(&ctx);
    }
    observer.update(&devices);
    let center = observer.tracking_position(Eye::Center);
    assert!((center - Vec3::new(0.0, 1.76, 0.5)).norm() < 1e-6);

    // A dropped pose keeps the previous one.
    hmd.clear_pose(HmdEntity::Head);
    clock.advance(Duration::from_millis(10));
    devices[0].update(&ctx);
    assert!((devices[0].position() - Vec3::new(0.0, 1.76, 0.5)).norm() < 1e-6);
}

#[test]
fn runtime_velocity_is_used() {
    let hmd = Arc::new(MockHmd::new(HmdKind::Oculus));
    let ctx = RuntimeContext::new(0).with_hmd(hmd.clone());
    let config = Config::from_toml_str(SESSION).unwrap();
    let mut head = TrackedDevice::new(0, &config.devices[0], &ctx);

    hmd.set_pose(
        HmdEntity::Head,
        EntityPose::new(Vec3::zeros(), Quat::identity())
            .with_velocities(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.2, 0.0)),
    );
    head.update(&ctx);
    assert_eq!(head.velocity(), Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(head.angular_velocity(), Vec3::new(0.0, 0.2, 0.0));
}

// ---------------------------------------------------------------------------
// Gamepad shared by two channels
// ---------------------------------------------------------------------------

#[test]
fn gamepad_feeds_both_channels_and_is_released_once() {
    init_logging();
    let pads = Arc::new(DummyGamepads::new());
    pads.connect(17);
    let mut state = GamepadState::default();
    state.buttons[13] = true;
    state.axes = [0.1, 0.2, 0.3, 0.4];
    pads.set_state(17, state);

    let ctx = RuntimeContext::new(0).with_gamepads(pads.clone() as Arc<dyn GamepadProvider>);
    let config = Config::from_toml_str(SESSION).unwrap();
    let mut pad = TrackedDevice::new(1, &config.devices[1], &ctx);

    let buttons = pad.buttons_backend().and_then(ButtonsBackend::gamepad).unwrap();
    let analogs = pad
        .analogs_backend()
        .and_then(|b| b.gamepad())
        .unwrap();
    assert!(Arc::ptr_eq(buttons, analogs));

    pad.update(&ctx);
    assert_eq!(pad.buttons().len(), 18);
    assert!(pad.button(13));
    assert_eq!(pad.analogs(), &[0.1, 0.2, 0.3, 0.4]);

    assert_eq!(pads.opened(), vec![17]);
    drop(pad);
    assert_eq!(pads.released(), vec![17]);
}

// ---------------------------------------------------------------------------
// Runtime input matrix
// ---------------------------------------------------------------------------

#[rstest]
#[case::oculus_remote(HmdKind::Oculus, "oculus", "xbox", HmdInput::Remote, 12)]
#[case::oculus_touch(HmdKind::Oculus, "oculus", "controller-right", HmdInput::Controller(1), 8)]
#[case::openvr_wand(HmdKind::OpenVr, "openvr", "controller-0", HmdInput::Controller(0), 6)]
fn runtime_buttons(
    #[case] kind: HmdKind,
    #[case] backend: &str,
    #[case] parameters: &str,
    #[case] input: HmdInput,
    #[case] count: usize,
) {
    let text = format!(
        "[[device]]\nid = \"c\"\nbuttons = {{ type = \"{backend}\", parameters = \"{parameters}\" }}\n\n[[process]]\nid = \"p\"\n"
    );
    let config = Config::from_toml_str(&text).unwrap();
    let hmd = Arc::new(MockHmd::new(kind));
    let ctx = RuntimeContext::new(0).with_hmd(hmd.clone());
    let mut device = TrackedDevice::new(0, &config.devices[0], &ctx);
    assert_eq!(device.buttons().len(), count);

    hmd.set_buttons(input, &[true, true]);
    device.update(&ctx);
    assert!(device.button(0) && device.button(1));
    assert!(!device.button(2));
}

// ---------------------------------------------------------------------------
// Path interfaces
// ---------------------------------------------------------------------------

#[test]
fn interface_paths() {
    let tree = Arc::new(DummyInterfaces::new());
    let hand = tree.add("/me/hands/left");
    let trigger = tree.add("/controller/left/trigger");
    let text = r#"
[[device]]
id = "hand"
tracking = { type = "osvr", parameters = "/me/hands/left" }
buttons = { type = "osvr", parameters = "/controller/left/1 /controller/left/2" }
analogs = { type = "osvr", parameters = "/controller/left/trigger" }

[[process]]
id = "p"
"#;
    let config = Config::from_toml_str(text).unwrap();
    let ctx = RuntimeContext::new(0).with_interfaces(tree.clone());
    let mut device = TrackedDevice::new(0, &config.devices[0], &ctx);
    assert_eq!(device.buttons().len(), 2);

    tree.set_pose(hand, Vec3::new(0.2, 1.0, -0.3), Quat::identity());
    tree.set_analog(trigger, 0.75);
    device.update(&ctx);
    assert_eq!(device.position(), Vec3::new(0.2, 1.0, -0.3));
    assert_eq!(device.analogs(), &[0.75]);
    assert_eq!(device.buttons(), &[false, false]);
}

#[test]
fn seated_eye_from_path_runtime() {
    let hmd = Arc::new(MockHmd::new(HmdKind::Osvr));
    let ctx = RuntimeContext::new(0).with_hmd(hmd.clone());
    let text = r#"
[[device]]
id = "eye"
tracking = { type = "osvr", parameters = "eye-left" }

[[process]]
id = "p"
"#;
    let config = Config::from_toml_str(text).unwrap();
    let mut eye = TrackedDevice::new(0, &config.devices[0], &ctx);
    assert!(matches!(eye.tracking_backend(), Some(TrackingBackend::Hmd { .. })));

    hmd.set_pose(
        HmdEntity::Eye(Eye::Left),
        EntityPose::new(Vec3::new(0.0, 0.5, 0.0), Quat::identity()),
    );
    eye.update(&ctx);
    assert!((eye.position().y - 2.26).abs() < 1e-5);

    hmd.set_pose(
        HmdEntity::Eye(Eye::Left),
        EntityPose::new(Vec3::new(0.0, 1.6, 0.0), Quat::identity()),
    );
    eye.update(&ctx);
    assert!((eye.position().y - 1.6).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Replication between processes
// ---------------------------------------------------------------------------

#[test]
fn state_replicates_from_owner() {
    let config = Config::from_toml_str(SESSION).unwrap();

    let owner_ctx = RuntimeContext::new(1);
    let mut owner = TrackedDevice::from_config(&config, &owner_ctx);
    let master_ctx = RuntimeContext::new(0);
    let mut master = TrackedDevice::from_config(&config, &master_ctx);
    assert!(owner[2].is_owned());
    assert!(!master[2].is_owned());

    owner_ctx
        .callbacks()
        .source("Remote@tracker")
        .publish_pose(2, Vec3::new(3.0, 1.0, 0.0), Quat::identity());
    owner[2].update(&owner_ctx);

    let bytes = owner[2].encode_state().unwrap();
    master[2].apply_state(&bytes).unwrap();
    assert_eq!(master[2].position(), Vec3::new(3.0, 1.0, 0.0));
}

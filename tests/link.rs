mod common;

use common::{dev_dir, device, ScriptedBackend};
use serial_input::link::{joybus, FrameError};
use serial_input::transport::TransportError;
use serial_input::{
    ControllerConfig, LinkError, PluginConfig, SerialInput, SessionSettings, TransportConfig,
};
use tempfile::TempDir;

fn input(devices: usize) -> (TempDir, ScriptedBackend, SerialInput) {
    let names: Vec<String> = (0..devices).map(device).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let dir = dev_dir(&refs);
    let backend = ScriptedBackend::default();

    let config = PluginConfig {
        transport: TransportConfig {
            read_timeout_ms: None,
            dev_dir: Some(dir.path().to_path_buf()),
        },
        ..PluginConfig::default()
    };
    let mut input = SerialInput::from_config(backend.clone(), &config);
    input.initialize_ports();
    (dir, backend, input)
}

fn bound_input() -> (TempDir, ScriptedBackend, SerialInput) {
    let (dir, backend, mut input) = input(1);
    input.bind(0, &device(0), 115200).unwrap();
    (dir, backend, input)
}

#[test]
fn exchange_writes_request_and_fills_response() {
    let (_dir, backend, mut input) = bound_input();
    backend.queue_read(&[0x10, 0x20, 0x30, 0x40, 0x50]);

    let mut frame = [0x02, 0x05, 0xAA, 0xBB, 0, 0, 0, 0, 0, 0xEE];
    input.exchange(0, Some(&mut frame[..])).unwrap();

    assert_eq!(backend.written(), [0x02, 0x05, 0xAA, 0xBB]);
    assert_eq!(frame, [0x02, 0x05, 0xAA, 0xBB, 0x10, 0x20, 0x30, 0x40, 0x50, 0xEE]);
}

#[test]
fn exchange_with_empty_response_only_writes() {
    let (_dir, backend, mut input) = bound_input();

    let mut frame = [0x01, 0x00, 0xFE, 0x11, 0x22];
    input.exchange(0, Some(&mut frame[..])).unwrap();

    assert_eq!(backend.written(), [0x01, 0x00, 0xFE]);
    assert_eq!(frame, [0x01, 0x00, 0xFE, 0x11, 0x22]);
    assert_eq!(backend.state().read_calls, 0);
}

#[test]
fn exchange_with_empty_payload_writes_headers() {
    let (_dir, backend, mut input) = bound_input();
    backend.queue_read(&[0x05]);

    let mut frame = [0x00, 0x01, 0x00];
    input.exchange(0, Some(&mut frame[..])).unwrap();

    assert_eq!(backend.written(), [0x00, 0x01]);
    assert_eq!(frame, [0x00, 0x01, 0x05]);
}

#[test]
fn header_flag_bits_are_relayed_verbatim() {
    let (_dir, backend, mut input) = bound_input();
    backend.queue_read(&[0x05, 0x00, 0x02]);

    let mut frame = [0xC1, 0x43, 0x00, 0xFF, 0xFF, 0xFF];
    input.exchange(0, Some(&mut frame[..])).unwrap();

    assert_eq!(backend.written(), [0xC1, 0x43, 0x00]);
    assert_eq!(frame, [0xC1, 0x43, 0x00, 0x05, 0x00, 0x02]);
}

#[test]
fn unbound_slot_is_inert() {
    let (_dir, backend, mut input) = input(1);

    let mut frame = joybus::info_request();
    let before = frame.clone();
    for slot in 0..4 {
        input.exchange(slot, Some(&mut frame[..])).unwrap();
    }
    input.exchange(9, Some(&mut frame[..])).unwrap();

    assert_eq!(frame, before);
    assert!(backend.state().writes.is_empty());
    assert_eq!(backend.state().read_calls, 0);
}

#[test]
fn missing_buffer_is_a_no_op() {
    let (_dir, backend, mut input) = bound_input();
    input.exchange(0, None).unwrap();
    assert!(backend.state().writes.is_empty());
}

#[test]
fn frame_larger_than_buffer_is_rejected_before_io() {
    let (_dir, backend, mut input) = bound_input();

    let mut frame = [0x01, 0x04, 0x01, 0xFF];
    assert!(matches!(
        input.exchange(0, Some(&mut frame[..])),
        Err(LinkError::Frame(FrameError::Overflow { needed: 7, capacity: 4 }))
    ));
    assert!(backend.state().writes.is_empty());
}

#[test]
fn short_write_skips_the_response() {
    let (_dir, backend, mut input) = bound_input();
    backend.state().write_limit = Some(1);
    backend.queue_read(&[1, 2, 3]);

    let mut frame = joybus::info_request();
    assert!(matches!(
        input.exchange(0, Some(&mut frame[..])),
        Err(LinkError::ShortWrite { expected: 3, written: 1 })
    ));
    assert_eq!(frame, joybus::info_request());
    assert_eq!(backend.state().read_calls, 0);
}

#[test]
fn transport_failures_propagate() {
    let (_dir, backend, mut input) = bound_input();
    backend.queue_read(&[0x05]);

    let mut frame = joybus::info_request();
    assert!(matches!(
        input.exchange(0, Some(&mut frame[..])),
        Err(LinkError::Transport(TransportError::ReadError { index: 0, .. }))
    ));
    assert_eq!(frame, joybus::info_request());
}

#[test]
fn bind_reports_unknown_devices_and_slots() {
    let (_dir, _backend, mut input) = input(1);

    assert!(matches!(
        input.bind(0, &device(3), 115200),
        Err(LinkError::DeviceNotFound(name)) if name == device(3)
    ));
    assert!(matches!(
        input.bind(4, &device(0), 115200),
        Err(LinkError::SlotOutOfRange(4))
    ));
    assert!(matches!(
        input.bind(0, &device(0), 12345),
        Err(LinkError::Transport(TransportError::UnsupportedBaudRate(12345)))
    ));
    assert!(!input.is_present(0));
}

#[test]
fn initiate_controllers_binds_active_slots_only() {
    let (_dir, backend, mut input) = input(2);

    let mut config = PluginConfig::default();
    config.controllers[0] = ControllerConfig {
        enabled: true,
        serial: device(1),
        baud: 9600,
    };
    config.controllers[1].serial = device(0);
    config.controllers[2] = ControllerConfig {
        enabled: true,
        serial: device(5),
        baud: 115200,
    };

    let outcomes = input.initiate_controllers(&config);

    assert!(outcomes[0].is_bound());
    assert!(!outcomes[1].is_bound());
    assert!(!outcomes[2].is_bound());
    assert!(!outcomes[3].is_bound());
    assert!(input.is_present(0));
    assert!((1..4).all(|slot| !input.is_present(slot)));

    let binding = input.binding(0).unwrap();
    assert_eq!(binding.index, 1);
    assert_eq!(binding.baud.bps(), 9600);
    assert_eq!(backend.state().opens.len(), 1);
}

#[test]
fn rebinding_a_slot_releases_its_old_port() {
    let (_dir, backend, mut input) = input(2);
    input.bind(0, &device(0), 115200).unwrap();
    input.bind(0, &device(1), 115200).unwrap();

    assert!(!input.registry().is_open(0));
    assert!(input.registry().is_open(1));
    assert_eq!(backend.state().live_handles, 1);
}

#[test]
fn reinitializing_ports_unbinds_every_slot() {
    let (_dir, backend, mut input) = bound_input();
    input.initialize_ports();

    assert!(!input.is_present(0));
    assert_eq!(backend.state().live_handles, 0);

    let mut frame = joybus::info_request();
    input.exchange(0, Some(&mut frame[..])).unwrap();
    assert!(backend.state().writes.is_empty());
}

#[test]
fn shutdown_is_idempotent() {
    let (_dir, backend, mut input) = input(2);
    input.bind(0, &device(0), 115200).unwrap();
    input.bind(1, &device(1), 115200).unwrap();

    input.shutdown();
    input.shutdown();

    assert!(!input.is_present(0));
    assert_eq!(input.registry().count(), 0);
    assert_eq!(backend.state().live_handles, 0);
    assert_eq!(backend.state().drains, 2);
}

#[test]
fn shutdown_on_an_empty_subsystem() {
    let mut input =
        SerialInput::with_backend(ScriptedBackend::default(), SessionSettings::default());
    input.shutdown();
    assert!(input.registry().is_empty());
}

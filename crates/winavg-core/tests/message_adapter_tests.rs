mod common;

use common::{RecordingTransport, device_config};
use winavg_core::{ChannelIndex, Device, DeviceId, Publication};

fn linked_device(transport: &mut RecordingTransport, inputs: &str, sizes: &str) -> Device {
    let mut device = Device::new(DeviceId::new("device-1"));
    let status = device.on_link(transport, &device_config(inputs, None, Some(sizes)));
    assert!(status.is_success());
    device
}

#[test]
fn test_publishes_formatted_average() {
    let mut transport = RecordingTransport::new();
    let mut device = linked_device(&mut transport, "temp", "3");

    for payload in ["10", "20", "30", "40"] {
        device.on_message(&mut transport, ChannelIndex(0), payload.as_bytes());
    }

    assert_eq!(
        transport.payloads(),
        vec!["10.0000000000", "15.0000000000", "20.0000000000", "30.0000000000"]
    );
    assert!(transport.published.iter().all(|(topic, _)| topic == "temp_avg"));
}

#[test]
fn test_returns_publication() {
    let mut transport = RecordingTransport::new();
    let mut device = linked_device(&mut transport, "a,b", "2,2");

    let publication = device.on_message(&mut transport, ChannelIndex(1), b"2.5");
    assert_eq!(
        publication,
        Some(Publication {
            topic: "b_avg".to_string(),
            payload: "2.5000000000".to_string(),
        })
    );
}

#[test]
fn test_malformed_payload_is_dropped() {
    let mut transport = RecordingTransport::new();
    let mut device = linked_device(&mut transport, "temp", "3");

    device.on_message(&mut transport, ChannelIndex(0), b"10");
    let before = device.channels().unwrap().clone();

    let publication = device.on_message(&mut transport, ChannelIndex(0), b"notanumber");
    assert!(publication.is_none());
    assert_eq!(transport.published.len(), 1);
    assert_eq!(device.channels().unwrap(), &before);

    // The next good sample behaves as if the bad one never arrived.
    device.on_message(&mut transport, ChannelIndex(0), b"20");
    assert_eq!(transport.payloads(), vec!["10.0000000000", "15.0000000000"]);
}

#[test]
fn test_payload_whitespace_tolerated() {
    let mut transport = RecordingTransport::new();
    let mut device = linked_device(&mut transport, "temp", "2");

    device.on_message(&mut transport, ChannelIndex(0), b" 7.25\n");
    assert_eq!(transport.payloads(), vec!["7.2500000000"]);
}

#[test]
fn test_non_terminating_fraction() {
    let mut transport = RecordingTransport::new();
    let mut device = linked_device(&mut transport, "temp", "3");

    device.on_message(&mut transport, ChannelIndex(0), b"1");
    device.on_message(&mut transport, ChannelIndex(0), b"1");
    device.on_message(&mut transport, ChannelIndex(0), b"0");
    assert_eq!(transport.payloads().last(), Some(&"0.6666666667"));
}

#[test]
#[should_panic(expected = "out of range")]
fn test_out_of_range_index_panics() {
    let mut transport = RecordingTransport::new();
    let mut device = linked_device(&mut transport, "temp", "3");

    device.on_message(&mut transport, ChannelIndex(5), b"1");
}

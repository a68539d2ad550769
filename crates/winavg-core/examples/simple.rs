use winavg_core::{ChannelIndex, Device, DeviceConfig, DeviceId, Transport};

// A framework that prints what would be published.
struct Stdout;

impl Transport for Stdout {
    fn subscribe(&mut self, topic: &str, index: ChannelIndex) -> eyre::Result<()> {
        println!("subscribe {topic} as channel {index}");
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) {
        println!("unsubscribe {topic}");
    }

    fn publish(&mut self, topic: &str, payload: String) {
        println!("{topic} {payload}");
    }
}

fn main() {
    let mut config = DeviceConfig::new();
    config.insert("InputTopics".into(), "temp, freq".into());
    config.insert("OutputTopics".into(), "t2".into());
    config.insert("WindowSizes".into(), "3, 5".into());

    let mut transport = Stdout;
    let mut device = Device::new(DeviceId::new("sensor-1"));
    let status = device.on_link(&mut transport, &config);
    println!("link: {status}");

    let temp = [10.0, 20.0, 30.0, 40.0];
    let freq = [50.1, 49.9, 50.0, 50.2, 49.8, 50.0];

    for sample in temp {
        device.on_message(&mut transport, ChannelIndex(0), sample.to_string().as_bytes());
    }
    for sample in freq {
        device.on_message(&mut transport, ChannelIndex(1), sample.to_string().as_bytes());
    }

    device.on_unlink(&mut transport);
}

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
This crate provides a single-connection, single-threaded client engine for communicating
with a message broker using the MQTT5 protocol.

MQTT is a publish/subscribe protocol commonly used in IoT use cases.  This crate implements
the client side of the protocol as a pure state machine: the binary codec for control
packets, per-packet construction and validation, correlation of requests with responses
through a bounded table of in-flight packet ids, and the QoS 1 / QoS 2 acknowledgement
flows.  The network itself stays behind the [`NetworkAdapter`](transport::NetworkAdapter)
trait, so the engine runs equally well over the bundled TCP adapter, an embedded IP stack,
or a test harness feeding canned bytes.

# Usage

To use this crate, you'll first need to add it to your project's Cargo.toml:

```toml
[dependencies]
basalt-mqtt = "0.1"
```

# Example: Connect to a local Mosquitto server

Assuming a default Mosquitto installation, you can connect locally by plaintext on port 1883:

```no_run
use basalt_mqtt::{ConnectOptions, MqttClient, PublishMessage, QualityOfService, TcpNetworkAdapter};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transport = TcpNetworkAdapter::new(Duration::from_millis(500));
    let mut client = MqttClient::new("127.0.0.1", transport);

    client.connect(ConnectOptions::builder().with_client_id("basalt-example").build())?;

    // drive the connection until the CONNACK arrives
    while !client.is_connected() {
        client.poll()?;
    }

    let mut message = PublishMessage::new("hello/world", b"hi", QualityOfService::AtLeastOnce);
    client.publish(&mut message)?;

    // keep polling to process the acknowledgement
    client.poll()?;

    client.disconnect(0)?;
    Ok(())
}
```

Notifications (inbound publishes, acknowledgement completions, broker disconnects) are
delivered through the [`ClientEventSink`](events::ClientEventSink) trait; implement the
methods you care about and hand the sink to
[`MqttClient::with_sink`](client::MqttClient::with_sink).
*/

#![warn(missing_docs)]

pub mod alias;
pub mod client;
pub mod config;
mod decode;
mod encode;
pub mod error;
pub mod events;
mod logging;
pub mod mqtt;
mod pending;
pub mod transport;
mod utf8;

#[cfg(test)]
pub(crate) mod testing;

/* Re-export the main types at the root level */
pub use client::{ConnectionStatus, MqttClient};
pub use config::{ClientConfig, ConnectOptions, ConnectOptionsBuilder, SubscribeOptions, WillMessage};
pub use error::{MqttError, MqttResult};
pub use events::{ClientEventSink, NullEventSink};
pub use mqtt::{
    reason_code, DisconnectPacket, NegotiatedSettings, PacketType, PayloadFormatIndicator,
    PublishMessage, QualityOfService, ReceivedPublish, RetainHandlingType, Subscription,
    UserProperty,
};
pub use transport::{NetworkAdapter, RecvOutcome, SendOutcome, TcpNetworkAdapter};

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing the notification interface a client fires protocol events through.
 */

use crate::mqtt::{DisconnectPacket, NegotiatedSettings, PacketType, QualityOfService, ReceivedPublish};

/// Sink for client notifications.  Every method has a no-op default, so implementors only
/// override the events they care about.
///
/// Callbacks run synchronously inside packet processing on the thread that called into the
/// client.  Protocol-mandated responses (acknowledgements, the ping answer) are already sent
/// by the time a callback fires.
pub trait ClientEventSink {
    /// Fired when a successful CONNACK establishes the connection.
    fn connected(&mut self, _settings: &NegotiatedSettings) {}

    /// Fired for every inbound application message.  The payload borrow ends with the
    /// callback; copy it out to keep it.
    fn publish_received(&mut self, _publish: &ReceivedPublish<'_>) {}

    /// Fired when a QoS 1 publish completes with a PUBACK.
    fn publish_acknowledged(&mut self, _packet_id: u16, _reason_code: u8) {}

    /// Fired when a QoS 2 publish completes with a PUBCOMP.
    fn publish_completed(&mut self, _packet_id: u16, _reason_code: u8) {}

    /// Fired once per granted subscription entry of a SUBACK.
    fn subscription_granted(&mut self, _packet_id: u16, _index: usize, _granted_qos: QualityOfService) {}

    /// Fired once per declined subscription entry of a SUBACK.
    fn subscription_declined(&mut self, _packet_id: u16, _index: usize, _reason_code: u8) {}

    /// Fired when an UNSUBACK arrives, with one reason code per requested filter.
    fn unsubscribe_completed(&mut self, _packet_id: u16, _reason_codes: &[u8]) {}

    /// Fired when the broker closes the session with a DISCONNECT packet.
    fn received_disconnect(&mut self, _disconnect: &DisconnectPacket) {}

    /// Fired when a PINGRESP arrives.
    fn ping_received(&mut self) {}

    /// Fired for each user property carried by an inbound packet.
    fn user_property(&mut self, _origin: PacketType, _name: &str, _value: &str) {}
}

/// Sink that ignores every notification.
#[derive(Default)]
pub struct NullEventSink {}

impl ClientEventSink for NullEventSink {}

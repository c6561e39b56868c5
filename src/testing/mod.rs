/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

// Test-only plumbing: codec round-trip helpers, a scripted transport adapter and a
// recording event sink for driving the client against canned broker traffic.

use crate::decode::Reader;
use crate::encode::{measure, EncodeCursor};
use crate::error::{MqttError, MqttResult};
use crate::events::ClientEventSink;
use crate::mqtt::{DisconnectPacket, NegotiatedSettings, PacketType, QualityOfService, ReceivedPublish};
use crate::transport::{NetworkAdapter, RecvOutcome, SendOutcome};

use std::collections::VecDeque;

/// Runs a packet writer through both passes and returns the encoded bytes.
pub(crate) fn encode_packet<F>(writer: F) -> Vec<u8>
where
    F: Fn(&mut EncodeCursor) -> MqttResult<()>,
{
    let total = measure(&writer).unwrap();
    let mut dest = vec![0u8; total];
    let mut cursor = EncodeCursor::write(&mut dest);
    writer(&mut cursor).unwrap();
    assert_eq!(total, cursor.bytes_written());
    dest
}

/// Splits an encoded packet into its first byte and a reader over the body, asserting that
/// the remaining length field matches the actual body size.
pub(crate) fn split_fixed_header(bytes: &[u8]) -> (u8, Reader) {
    let mut reader = Reader::new(bytes);
    let first_byte = reader.read_u8().unwrap();
    let remaining_length = reader.read_vli().unwrap() as usize;
    assert_eq!(remaining_length, reader.remaining());
    (first_byte, reader)
}

/// Transport double that records outbound packets and replays scripted inbound frames.
pub(crate) struct ScriptedNetworkAdapter {
    pub(crate) connect_synchronously: bool,
    pub(crate) connected: bool,
    pub(crate) sent: Vec<Vec<u8>>,
    pub(crate) inbound: VecDeque<Vec<u8>>,
    pub(crate) send_failure: Option<MqttError>,
    pub(crate) open_failure: Option<MqttError>,
    pub(crate) outstanding_send_buffers: usize,
    pub(crate) closed_count: usize,
}

impl ScriptedNetworkAdapter {
    pub(crate) fn new() -> ScriptedNetworkAdapter {
        ScriptedNetworkAdapter {
            connect_synchronously: true,
            connected: false,
            sent: Vec::new(),
            inbound: VecDeque::new(),
            send_failure: None,
            open_failure: None,
            outstanding_send_buffers: 0,
            closed_count: 0,
        }
    }

    pub(crate) fn deferred() -> ScriptedNetworkAdapter {
        ScriptedNetworkAdapter {
            connect_synchronously: false,
            ..ScriptedNetworkAdapter::new()
        }
    }
}

impl NetworkAdapter for ScriptedNetworkAdapter {
    fn open_conn(&mut self, _address: &str) -> MqttResult<()> {
        if let Some(error) = self.open_failure {
            return Err(error);
        }
        if self.connect_synchronously {
            self.connected = true;
        }
        Ok(())
    }

    fn close_conn(&mut self) -> MqttResult<()> {
        self.connected = false;
        self.closed_count += 1;
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected
    }

    fn alloc_send_buf(&mut self, length: usize) -> MqttResult<Vec<u8>> {
        self.outstanding_send_buffers += 1;
        Ok(vec![0u8; length])
    }

    fn free_send_buf(&mut self, _buffer: Vec<u8>) {
        self.outstanding_send_buffers -= 1;
    }

    fn send(&mut self, buffer: &[u8]) -> MqttResult<SendOutcome> {
        if let Some(error) = self.send_failure {
            return Err(error);
        }
        self.sent.push(buffer.to_vec());
        Ok(SendOutcome::Sent)
    }

    fn recv(&mut self, buffer: &mut [u8]) -> MqttResult<RecvOutcome> {
        match self.inbound.pop_front() {
            None => Ok(RecvOutcome::Idle),
            Some(frame) => {
                if frame.is_empty() {
                    return Err(MqttError::HostUnavailable);
                }
                buffer[..frame.len()].copy_from_slice(&frame);
                Ok(RecvOutcome::Data(frame.len()))
            }
        }
    }
}

/// Owned copy of a notification fired through the event sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RecordedEvent {
    Connected(NegotiatedSettings),
    PublishReceived {
        topic: String,
        payload: Vec<u8>,
        qos: QualityOfService,
        packet_id: u16,
    },
    PublishAcknowledged(u16, u8),
    PublishCompleted(u16, u8),
    SubscriptionGranted(u16, usize, QualityOfService),
    SubscriptionDeclined(u16, usize, u8),
    UnsubscribeCompleted(u16, Vec<u8>),
    ReceivedDisconnect(DisconnectPacket),
    PingReceived,
    UserProperty(PacketType, String, String),
}

#[derive(Default)]
pub(crate) struct RecordingEventSink {
    pub(crate) events: Vec<RecordedEvent>,
}

impl ClientEventSink for RecordingEventSink {
    fn connected(&mut self, settings: &NegotiatedSettings) {
        self.events.push(RecordedEvent::Connected(settings.clone()));
    }

    fn publish_received(&mut self, publish: &ReceivedPublish<'_>) {
        self.events.push(RecordedEvent::PublishReceived {
            topic: publish.topic.clone(),
            payload: publish.payload.to_vec(),
            qos: publish.qos,
            packet_id: publish.packet_id,
        });
    }

    fn publish_acknowledged(&mut self, packet_id: u16, reason_code: u8) {
        self.events.push(RecordedEvent::PublishAcknowledged(packet_id, reason_code));
    }

    fn publish_completed(&mut self, packet_id: u16, reason_code: u8) {
        self.events.push(RecordedEvent::PublishCompleted(packet_id, reason_code));
    }

    fn subscription_granted(&mut self, packet_id: u16, index: usize, granted_qos: QualityOfService) {
        self.events.push(RecordedEvent::SubscriptionGranted(packet_id, index, granted_qos));
    }

    fn subscription_declined(&mut self, packet_id: u16, index: usize, reason_code: u8) {
        self.events.push(RecordedEvent::SubscriptionDeclined(packet_id, index, reason_code));
    }

    fn unsubscribe_completed(&mut self, packet_id: u16, reason_codes: &[u8]) {
        self.events.push(RecordedEvent::UnsubscribeCompleted(packet_id, reason_codes.to_vec()));
    }

    fn received_disconnect(&mut self, disconnect: &DisconnectPacket) {
        self.events.push(RecordedEvent::ReceivedDisconnect(disconnect.clone()));
    }

    fn ping_received(&mut self) {
        self.events.push(RecordedEvent::PingReceived);
    }

    fn user_property(&mut self, origin: PacketType, name: &str, value: &str) {
        self.events.push(RecordedEvent::UserProperty(origin, name.to_string(), value.to_string()));
    }
}

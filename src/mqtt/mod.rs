/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing a set of structured data types that model the MQTT5 specification.
 */

use crate::decode::{collect_user_property, decode_properties, PropertyValue, Reader};
use crate::encode::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::*;

use log::error;

pub(crate) mod connack;
pub(crate) mod connect;
pub(crate) mod disconnect;
pub(crate) mod pingreq;
pub(crate) mod pingresp;
pub(crate) mod puback;
pub(crate) mod pubcomp;
pub(crate) mod publish;
pub(crate) mod pubrec;
pub(crate) mod pubrel;
pub(crate) mod suback;
pub(crate) mod subscribe;
pub(crate) mod unsuback;
pub(crate) mod unsubscribe;
pub(crate) mod utils;

/// MQTT message delivery quality of service.
///
/// Enum values match [MQTT5 spec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901234) encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub enum QualityOfService {

    /// The message is delivered according to the capabilities of the underlying network. No response is sent by the
    /// receiver and no retry is performed by the sender. The message arrives at the receiver either once or not at all.
    #[default]
    AtMostOnce = 0,

    /// A level of service that ensures that the message arrives at the receiver at least once.
    AtLeastOnce = 1,

    /// A level of service that ensures that the message arrives at the receiver exactly once.
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QualityOfService {
    type Error = MqttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        convert_u8_to_quality_of_service(value)
    }
}

/// Optional property describing a PUBLISH payload's format.
///
/// Enum values match [MQTT5 spec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901111) encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PayloadFormatIndicator {

    /// The payload is arbitrary binary data
    #[default]
    Bytes = 0,

    /// The payload is a well-formed utf-8 string value.
    Utf8 = 1,
}

/// Configures how retained messages should be handled when subscribing with a topic filter that matches topics with
/// associated retained messages.
///
/// Enum values match [MQTT5 spec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901169) encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RetainHandlingType {

    /// The server should always send all retained messages on topics that match a subscription's filter.
    #[default]
    SendOnSubscribe = 0,

    /// The server should send retained messages on topics that match the subscription's filter, but only for the
    /// first matching subscription, per session.
    SendOnSubscribeIfNew = 1,

    /// Subscriptions must not trigger any retained message publishes from the server.
    DontSend = 2,
}

/// An enum indicating the kind of MQTT packet.  Discriminants match the control packet type
/// values of the fixed header; `Unknown` marks the absence of an expectation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// No packet / no expectation
    #[default]
    Unknown = 0,

    /// A [Connect](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901033) packet
    Connect = 1,

    /// A [Connack](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901074) packet
    Connack = 2,

    /// A [Publish](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901100) packet
    Publish = 3,

    /// A [Puback](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901121) packet
    Puback = 4,

    /// A [Pubrec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901131) packet
    Pubrec = 5,

    /// A [Pubrel](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901141) packet
    Pubrel = 6,

    /// A [Pubcomp](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901151) packet
    Pubcomp = 7,

    /// A [Subscribe](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901161) packet
    Subscribe = 8,

    /// A [Suback](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901171) packet
    Suback = 9,

    /// An [Unsubscribe](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901179) packet
    Unsubscribe = 10,

    /// An [Unsuback](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901187) packet
    Unsuback = 11,

    /// A [Pingreq](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901195) packet
    Pingreq = 12,

    /// A [Pingresp](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901200) packet
    Pingresp = 13,

    /// A [Disconnect](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901205) packet
    Disconnect = 14,

    /// An [Auth](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901217) packet
    Auth = 15,
}

impl PacketType {
    pub(crate) fn from_u8(value: u8) -> PacketType {
        match value {
            PACKET_TYPE_CONNECT => PacketType::Connect,
            PACKET_TYPE_CONNACK => PacketType::Connack,
            PACKET_TYPE_PUBLISH => PacketType::Publish,
            PACKET_TYPE_PUBACK => PacketType::Puback,
            PACKET_TYPE_PUBREC => PacketType::Pubrec,
            PACKET_TYPE_PUBREL => PacketType::Pubrel,
            PACKET_TYPE_PUBCOMP => PacketType::Pubcomp,
            PACKET_TYPE_SUBSCRIBE => PacketType::Subscribe,
            PACKET_TYPE_SUBACK => PacketType::Suback,
            PACKET_TYPE_UNSUBSCRIBE => PacketType::Unsubscribe,
            PACKET_TYPE_UNSUBACK => PacketType::Unsuback,
            PACKET_TYPE_PINGREQ => PacketType::Pingreq,
            PACKET_TYPE_PINGRESP => PacketType::Pingresp,
            PACKET_TYPE_DISCONNECT => PacketType::Disconnect,
            PACKET_TYPE_AUTH => PacketType::Auth,
            _ => PacketType::Unknown,
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", packet_type_to_str(*self as u8))
    }
}

/// Bitmask of packet types the client will currently accept from the broker, keyed by the
/// control packet type value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PacketTypeMask(u16);

impl PacketTypeMask {
    /// The mask a fresh or torn-down session holds.  PINGREQ stays expected in every state.
    pub(crate) fn initial() -> PacketTypeMask {
        let mut mask = PacketTypeMask(0);
        mask.insert(PacketType::Pingreq);
        mask
    }

    pub(crate) fn insert(&mut self, packet_type: PacketType) {
        self.0 |= 1u16 << (packet_type as u16);
    }

    pub(crate) fn remove(&mut self, packet_type: PacketType) {
        self.0 &= !(1u16 << (packet_type as u16));
    }

    pub(crate) fn contains(&self, packet_type: PacketType) -> bool {
        (self.0 & (1u16 << (packet_type as u16))) != 0
    }
}

/// MQTT5 reason code values shared by the ack-family packets, CONNACK, SUBACK and DISCONNECT.
/// Values at or above 0x80 indicate failure.
pub mod reason_code {
    /// Generic success, also granted QoS 0 on SUBACK and normal disconnection on DISCONNECT
    pub const SUCCESS: u8 = 0x00;
    /// Subscription granted with maximum QoS 1
    pub const GRANTED_QOS_1: u8 = 0x01;
    /// Subscription granted with maximum QoS 2
    pub const GRANTED_QOS_2: u8 = 0x02;
    /// Client disconnects but wants the will message published
    pub const DISCONNECT_WITH_WILL_MESSAGE: u8 = 0x04;
    /// Publish accepted with no matching subscribers
    pub const NO_MATCHING_SUBSCRIBERS: u8 = 0x10;
    /// Failure without a more specific reason
    pub const UNSPECIFIED_ERROR: u8 = 0x80;
    /// Packet did not conform to the MQTT specification
    pub const MALFORMED_PACKET: u8 = 0x81;
    /// Unexpected or out-of-order packet
    pub const PROTOCOL_ERROR: u8 = 0x82;
    /// Valid packet that the receiver will not process
    pub const IMPLEMENTATION_SPECIFIC_ERROR: u8 = 0x83;
    /// Sender is not authorized for the operation
    pub const NOT_AUTHORIZED: u8 = 0x87;
    /// Topic filter is well formed but not accepted
    pub const TOPIC_FILTER_INVALID: u8 = 0x8F;
    /// Topic name is well formed but not accepted
    pub const TOPIC_NAME_INVALID: u8 = 0x90;
    /// Packet id is already in use for another flow
    pub const PACKET_IDENTIFIER_IN_USE: u8 = 0x91;
    /// Packet id does not match a known in-progress flow
    pub const PACKET_IDENTIFIER_NOT_FOUND: u8 = 0x92;
    /// A quota on the receiver was exceeded
    pub const QUOTA_EXCEEDED: u8 = 0x97;
    /// Payload does not match its declared format indicator
    pub const PAYLOAD_FORMAT_INVALID: u8 = 0x99;
}

/// Data model of an [MQTT5 User Property](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901054).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserProperty {
    /// The name of the property
    pub name: String,

    /// The value of the property
    pub value: String,
}

/// An outbound application message.
///
/// The engine assigns `packet_id` during [`publish`](crate::client::MqttClient::publish) when
/// the quality of service is greater than zero.
#[derive(Clone, Debug, Default)]
pub struct PublishMessage {

    /// The topic this message is published to.  May not contain wildcards.
    pub topic: String,

    /// The raw message payload.
    pub payload: Vec<u8>,

    /// Delivery quality of service for this message.
    pub qos: QualityOfService,

    /// If true, the server retains the message for delivery to future subscribers.
    pub retain: bool,

    /// True when this packet is a redelivery of an earlier attempt.
    pub dup: bool,

    /// Packet id correlating the acknowledgement flow.  Assigned by the engine; zero for QoS 0.
    pub packet_id: u16,

    /// Declares whether the payload is binary data or a utf-8 string.
    pub payload_format_indicator: Option<PayloadFormatIndicator>,

    /// Interval, in seconds, after which the server discards an undelivered copy.
    pub message_expiry_interval: Option<u32>,

    /// MIME-style description of the payload content.
    pub content_type: Option<String>,

    /// Topic a responder should reply on.
    pub response_topic: Option<String>,

    /// Opaque binary data used to correlate requests with responses.
    pub correlation_data: Option<Vec<u8>>,

    /// Requested topic alias.  Resolution against the server's advertised maximum happens
    /// during publish orchestration.
    pub topic_alias: Option<u16>,

    /// Subscription identifier; only ever set by the server on inbound publishes.
    pub subscription_identifier: Option<u32>,

    /// Set of MQTT5 user properties included with the message.
    pub user_properties: Option<Vec<UserProperty>>,
}

impl PublishMessage {
    /// Convenience constructor for the common topic/payload/qos case.
    pub fn new(topic: &str, payload: &[u8], qos: QualityOfService) -> PublishMessage {
        PublishMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            ..Default::default()
        }
    }
}

/// An inbound application message.
///
/// Topic and property strings are owned copies; the payload borrows the receive buffer and is
/// only reachable inside the [`publish_received`](crate::events::ClientEventSink::publish_received)
/// notification, which ends before the buffer is released.
#[derive(Debug)]
pub struct ReceivedPublish<'a> {
    /// The topic the message was published to.
    pub topic: String,

    /// The raw message payload, borrowed from the receive buffer.
    pub payload: &'a [u8],

    /// Delivery quality of service the broker used.
    pub qos: QualityOfService,

    /// True if this message was retained by the server.
    pub retain: bool,

    /// True when this packet is a redelivery.
    pub dup: bool,

    /// Packet id of the acknowledgement flow; zero for QoS 0.
    pub packet_id: u16,

    /// Declared payload format.  A utf-8 declaration is enforced against the payload bytes.
    pub payload_format_indicator: u8,

    /// Message expiry interval forwarded by the server, if any.
    pub message_expiry_interval: Option<u32>,

    /// Topic a response should be published to.
    pub response_topic: Option<String>,

    /// MIME-style payload description.
    pub content_type: Option<String>,

    /// Correlation data, copied up to the configured maximum.  Oversized values are dropped
    /// whole.
    pub correlation_data: Option<Vec<u8>>,

    /// Topic alias the server attached to this message, if any.
    pub topic_alias: Option<u16>,

    /// Identifier of the subscription this message matched.
    pub subscription_identifier: Option<u32>,

    /// Set of MQTT5 user properties included with the message.
    pub user_properties: Option<Vec<UserProperty>>,
}

/// A single entry of a SUBSCRIBE request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Subscription {
    /// Topic filter to subscribe to.  May contain wildcards and a `$share/` prefix.
    pub topic_filter: String,

    /// Maximum quality of service the client wants on this subscription.
    pub qos: QualityOfService,

    /// If true, the server does not forward publishes that originate from this client.
    pub no_local: bool,

    /// If true, forwarded messages keep their original retain flag.
    pub retain_as_published: bool,

    /// How retained messages on matching topics are replayed on subscribe.
    pub retain_handling: RetainHandlingType,
}

impl Subscription {
    /// Convenience constructor for the common filter/qos case.
    pub fn new(topic_filter: &str, qos: QualityOfService) -> Subscription {
        Subscription {
            topic_filter: topic_filter.to_string(),
            qos,
            ..Default::default()
        }
    }
}

/// Shared shape of the PUBACK, PUBREC, PUBREL and PUBCOMP packets.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct AckPacket {
    pub(crate) packet_id: u16,
    pub(crate) reason_code: u8,
    pub(crate) reason_string: Option<String>,
    pub(crate) user_properties: Option<Vec<UserProperty>>,
}

impl AckPacket {
    pub(crate) fn new(packet_id: u16, reason_code: u8) -> AckPacket {
        AckPacket {
            packet_id,
            reason_code,
            ..Default::default()
        }
    }
}

/// Decoded form of an MQTT5 CONNACK packet.  Absent properties stay `None`; defaults are
/// applied when the negotiated settings are built.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ConnackPacket {
    pub(crate) session_present: bool,
    pub(crate) reason_code: u8,
    pub(crate) session_expiry_interval: Option<u32>,
    pub(crate) receive_maximum: Option<u16>,
    pub(crate) maximum_qos: Option<u8>,
    pub(crate) retain_available: Option<bool>,
    pub(crate) maximum_packet_size: Option<u32>,
    pub(crate) assigned_client_identifier: Option<String>,
    pub(crate) topic_alias_maximum: Option<u16>,
    pub(crate) reason_string: Option<String>,
    pub(crate) wildcard_subscriptions_available: Option<bool>,
    pub(crate) subscription_identifiers_available: Option<bool>,
    pub(crate) shared_subscriptions_available: Option<bool>,
    pub(crate) server_keep_alive: Option<u16>,
    pub(crate) response_information: Option<String>,
    pub(crate) server_reference: Option<String>,
    pub(crate) user_properties: Option<Vec<UserProperty>>,
}

/// Data model of an [MQTT5 DISCONNECT](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901205)
/// packet, used for both the outbound and inbound directions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DisconnectPacket {
    /// Reason the connection is being closed.
    pub reason_code: u8,

    /// Client-requested override of the session expiry negotiated at connect time.
    pub session_expiry_interval_seconds: Option<u32>,

    /// Additional diagnostic information.
    pub reason_string: Option<String>,

    /// Alternate server the client may use instead.  Only meaningful inbound.
    pub server_reference: Option<String>,

    /// Set of MQTT5 user properties included with the packet.
    pub user_properties: Option<Vec<UserProperty>>,
}

/// Decoded form of an MQTT5 SUBACK packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct SubackPacket {
    pub(crate) packet_id: u16,
    pub(crate) reason_codes: Vec<u8>,
    pub(crate) reason_string: Option<String>,
    pub(crate) user_properties: Option<Vec<UserProperty>>,
}

/// Decoded form of an MQTT5 UNSUBACK packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct UnsubackPacket {
    pub(crate) packet_id: u16,
    pub(crate) reason_codes: Vec<u8>,
    pub(crate) reason_string: Option<String>,
    pub(crate) user_properties: Option<Vec<UserProperty>>,
}

/// Server-advertised limits and capabilities captured from a successful CONNACK, with the
/// MQTT-specified defaults applied for any property the server omitted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NegotiatedSettings {

    /// True if the client rejoined an existing session on the server.
    pub session_present: bool,

    /// Maximum quality of service the server will accept, 2 if unspecified.
    pub maximum_qos: u8,

    /// Whether the server supports retained messages.  Defaults to true.
    pub retain_available: bool,

    /// Whether the server supports wildcard topic filters.  Defaults to true.
    pub wildcard_subscriptions_available: bool,

    /// Whether the server supports shared subscriptions.  Defaults to true.
    pub shared_subscriptions_available: bool,

    /// Whether the server supports subscription identifiers.  Defaults to true.
    pub subscription_identifiers_available: bool,

    /// Keep alive interval, in seconds, the connection operates under.  The server override
    /// wins; otherwise this is the value the client proposed on CONNECT.
    pub server_keep_alive: u16,

    /// Maximum packet size, in bytes, the server will accept.  Defaults to the maximum the
    /// client advertised, zero when neither side set one.
    pub maximum_packet_size: u32,

    /// Largest topic alias the client may send to the server.  Zero disables outbound aliasing.
    pub topic_alias_maximum: u16,

    /// Maximum count of in-flight QoS 1 and 2 publishes the server allows.
    pub receive_maximum: u16,

    /// Session expiry interval, in seconds, in effect for this connection.
    pub session_expiry_interval: u32,

    /// Client identifier the server assigned when the CONNECT left it empty.
    pub assigned_client_identifier: Option<String>,

    /// Request-response routing information supplied by the server.
    pub response_information: Option<String>,

    /// Alternate server reference supplied by the server.
    pub server_reference: Option<String>,

    /// Additional diagnostic information from the CONNACK.
    pub reason_string: Option<String>,
}

/*****************************************************/
/* Shared ack-family codec.  PUBACK, PUBREC, PUBREL and PUBCOMP differ only in their first */
/* byte; the per-packet modules bind names to these two functions.                         */

fn write_ack_properties(cursor: &mut EncodeCursor, packet: &AckPacket) -> MqttResult<()> {
    put_string_property(cursor, PROPERTY_KEY_REASON_STRING, packet.reason_string.as_deref());
    put_user_properties(cursor, packet.user_properties.as_deref());
    Ok(())
}

pub(crate) fn write_ack_packet(cursor: &mut EncodeCursor, first_byte: u8, packet: &AckPacket) -> MqttResult<()> {
    let body = |cursor: &mut EncodeCursor| -> MqttResult<()> {
        cursor.put_u16(packet.packet_id);

        let property_length = measure(|cursor| write_ack_properties(cursor, packet))?;

        /* per spec: empty properties + success = allowed to drop the reason code */
        if packet.reason_code == reason_code::SUCCESS && property_length == 0 {
            return Ok(());
        }

        cursor.put_u8(packet.reason_code);

        /* empty properties = allowed to drop the property length vli */
        if property_length == 0 {
            return Ok(());
        }

        cursor.put_vli(property_length as u32)?;
        write_ack_properties(cursor, packet)
    };

    let remaining_length = measure(&body)?;
    cursor.put_u8(first_byte);
    cursor.put_vli(remaining_length as u32)?;
    body(cursor)
}

pub(crate) fn read_ack_packet(
    first_byte: u8,
    expected_first_byte: u8,
    context: &str,
    reader: &mut Reader,
) -> MqttResult<AckPacket> {
    if first_byte != expected_first_byte {
        error!("{} - invalid first byte", context);
        return Err(MqttError::MalformedPacket);
    }

    let mut packet = AckPacket {
        packet_id: reader.read_u16()?,
        ..Default::default()
    };

    if reader.is_empty() {
        /* Success is the default, so nothing to do */
        return Ok(packet);
    }

    packet.reason_code = reader.read_u8()?;
    if reader.is_empty() {
        return Ok(packet);
    }

    decode_properties(reader, context, |property_key, value| {
        match (property_key, value) {
            (PROPERTY_KEY_REASON_STRING, PropertyValue::Utf8(reason_string)) => {
                packet.reason_string = Some(reason_string);
            }
            (PROPERTY_KEY_USER_PROPERTY, PropertyValue::Pair(name, value)) => {
                collect_user_property(&mut packet.user_properties, name, value);
            }
            _ => {
                return Err(MqttError::UnknownIdentifier);
            }
        }
        Ok(())
    })?;

    if !reader.is_empty() {
        error!("{} - property length does not match remaining packet length", context);
        return Err(MqttError::MalformedPacket);
    }

    Ok(packet)
}

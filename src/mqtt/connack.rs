/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::{collect_user_property, decode_properties, PropertyValue, Reader};
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::*;
use crate::mqtt::ConnackPacket;

use log::error;

pub(crate) fn decode_connack(first_byte: u8, reader: &mut Reader) -> MqttResult<ConnackPacket> {
    if first_byte != (PACKET_TYPE_CONNACK << 4) {
        error!("decode_connack - invalid first byte");
        return Err(MqttError::MalformedPacket);
    }

    let acknowledge_flags = reader.read_u8()?;
    let mut packet = ConnackPacket {
        session_present: (acknowledge_flags & 0x01) != 0,
        reason_code: reader.read_u8()?,
        ..Default::default()
    };

    // A failing reason code ends the session; the caller surfaces the decline without
    // needing the rest of the property section.
    if packet.reason_code >= 0x80 {
        return Ok(packet);
    }

    decode_properties(reader, "decode_connack", |property_key, value| {
        match (property_key, value) {
            (PROPERTY_KEY_SESSION_EXPIRY_INTERVAL, PropertyValue::FourByte(interval)) => {
                packet.session_expiry_interval = Some(interval);
            }
            (PROPERTY_KEY_RECEIVE_MAXIMUM, PropertyValue::TwoByte(maximum)) => {
                packet.receive_maximum = Some(maximum);
            }
            (PROPERTY_KEY_MAXIMUM_QOS, PropertyValue::Byte(qos)) => {
                packet.maximum_qos = Some(qos);
            }
            (PROPERTY_KEY_RETAIN_AVAILABLE, PropertyValue::Byte(available)) => {
                packet.retain_available = Some(available != 0);
            }
            (PROPERTY_KEY_MAXIMUM_PACKET_SIZE, PropertyValue::FourByte(size)) => {
                packet.maximum_packet_size = Some(size);
            }
            (PROPERTY_KEY_ASSIGNED_CLIENT_IDENTIFIER, PropertyValue::Utf8(client_id)) => {
                packet.assigned_client_identifier = Some(client_id);
            }
            (PROPERTY_KEY_TOPIC_ALIAS_MAXIMUM, PropertyValue::TwoByte(maximum)) => {
                packet.topic_alias_maximum = Some(maximum);
            }
            (PROPERTY_KEY_REASON_STRING, PropertyValue::Utf8(reason_string)) => {
                packet.reason_string = Some(reason_string);
            }
            (PROPERTY_KEY_WILDCARD_SUBSCRIPTIONS_AVAILABLE, PropertyValue::Byte(available)) => {
                packet.wildcard_subscriptions_available = Some(available != 0);
            }
            (PROPERTY_KEY_SUBSCRIPTION_IDENTIFIERS_AVAILABLE, PropertyValue::Byte(available)) => {
                packet.subscription_identifiers_available = Some(available != 0);
            }
            (PROPERTY_KEY_SHARED_SUBSCRIPTIONS_AVAILABLE, PropertyValue::Byte(available)) => {
                packet.shared_subscriptions_available = Some(available != 0);
            }
            (PROPERTY_KEY_SERVER_KEEP_ALIVE, PropertyValue::TwoByte(keep_alive)) => {
                packet.server_keep_alive = Some(keep_alive);
            }
            (PROPERTY_KEY_RESPONSE_INFORMATION, PropertyValue::Utf8(information)) => {
                packet.response_information = Some(information);
            }
            (PROPERTY_KEY_SERVER_REFERENCE, PropertyValue::Utf8(reference)) => {
                packet.server_reference = Some(reference);
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
        error!("decode_connack - property length does not match remaining packet length");
        return Err(MqttError::MalformedPacket);
    }

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn connack_minimal_success() {
        // no session, success, empty properties
        let body = [0x00, 0x00, 0x00];
        let mut reader = Reader::new(&body);
        let packet = decode_connack(0x20, &mut reader).unwrap();

        assert!(!packet.session_present);
        assert_eq!(0, packet.reason_code);
        assert_eq!(None, packet.maximum_qos);
        assert_eq!(None, packet.assigned_client_identifier);
    }

    #[test]
    fn connack_walks_every_advertised_limit() {
        // session present, success, then a full property section.  Multiple properties in
        // one section pins the length accounting of the property walk.
        let body = [
            0x01, 0x00, 0x1D, // flags, reason, property length 29
            0x24, 0x01, // maximum qos 1
            0x25, 0x00, // retain available false
            0x27, 0x00, 0x00, 0x01, 0x00, // maximum packet size 256
            0x22, 0x00, 0x0A, // topic alias maximum 10
            0x21, 0x00, 0x14, // receive maximum 20
            0x13, 0x00, 0x78, // server keep alive 120
            0x12, 0x00, 0x06, b'b', b'r', b'-', b'0', b'0', b'1', // assigned client id
            0x2A, 0x00, // shared subscriptions unavailable
        ];
        let mut reader = Reader::new(&body);
        let packet = decode_connack(0x20, &mut reader).unwrap();

        assert!(packet.session_present);
        assert_eq!(Some(1), packet.maximum_qos);
        assert_eq!(Some(false), packet.retain_available);
        assert_eq!(Some(256), packet.maximum_packet_size);
        assert_eq!(Some(10), packet.topic_alias_maximum);
        assert_eq!(Some(20), packet.receive_maximum);
        assert_eq!(Some(120), packet.server_keep_alive);
        assert_eq!(Some("br-001".to_string()), packet.assigned_client_identifier);
        assert_eq!(Some(false), packet.shared_subscriptions_available);
        assert_eq!(None, packet.wildcard_subscriptions_available);
    }

    #[test]
    fn connack_failing_reason_short_circuits() {
        let body = [0x00, 0x87];
        let mut reader = Reader::new(&body);
        let packet = decode_connack(0x20, &mut reader).unwrap();
        assert_eq!(0x87, packet.reason_code);
    }

    #[test]
    fn connack_rejects_unknown_property() {
        // subscription identifier is not a CONNACK property in this engine's registry context
        let body = [0x00, 0x00, 0x02, 0x0B, 0x05];
        let mut reader = Reader::new(&body);
        assert_matches!(decode_connack(0x20, &mut reader), Err(MqttError::UnknownIdentifier));
    }

    #[test]
    fn connack_rejects_property_length_overrun() {
        let body = [0x00, 0x00, 0x09, 0x24, 0x01];
        let mut reader = Reader::new(&body);
        assert_matches!(decode_connack(0x20, &mut reader), Err(MqttError::MalformedPacket));
    }

    #[test]
    fn connack_rejects_bad_first_byte() {
        let body = [0x00, 0x00, 0x00];
        let mut reader = Reader::new(&body);
        assert_matches!(decode_connack(0x21, &mut reader), Err(MqttError::MalformedPacket));
    }
}

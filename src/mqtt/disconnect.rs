/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::{collect_user_property, decode_properties, PropertyValue, Reader};
use crate::encode::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::*;
use crate::mqtt::{reason_code, DisconnectPacket};

use log::error;

fn write_disconnect_properties(cursor: &mut EncodeCursor, packet: &DisconnectPacket) -> MqttResult<()> {
    put_u32_property(cursor, PROPERTY_KEY_SESSION_EXPIRY_INTERVAL, packet.session_expiry_interval_seconds);
    put_string_property(cursor, PROPERTY_KEY_REASON_STRING, packet.reason_string.as_deref());
    put_string_property(cursor, PROPERTY_KEY_SERVER_REFERENCE, packet.server_reference.as_deref());
    put_user_properties(cursor, packet.user_properties.as_deref());
    Ok(())
}

pub(crate) fn write_disconnect(cursor: &mut EncodeCursor, packet: &DisconnectPacket) -> MqttResult<()> {
    let body = |cursor: &mut EncodeCursor| -> MqttResult<()> {
        let property_length = measure(|cursor| write_disconnect_properties(cursor, packet))?;

        /* normal disconnection with no properties is allowed to omit everything */
        if packet.reason_code == reason_code::SUCCESS && property_length == 0 {
            return Ok(());
        }

        cursor.put_u8(packet.reason_code);

        if property_length == 0 {
            return Ok(());
        }

        cursor.put_vli(property_length as u32)?;
        write_disconnect_properties(cursor, packet)
    };

    let remaining_length = measure(&body)?;
    cursor.put_u8(DISCONNECT_FIRST_BYTE);
    cursor.put_vli(remaining_length as u32)?;
    body(cursor)
}

pub(crate) fn decode_disconnect(first_byte: u8, reader: &mut Reader) -> MqttResult<DisconnectPacket> {
    if first_byte != DISCONNECT_FIRST_BYTE {
        error!("decode_disconnect - invalid first byte");
        return Err(MqttError::MalformedPacket);
    }

    let mut packet = DisconnectPacket::default();

    if reader.is_empty() {
        return Ok(packet);
    }

    packet.reason_code = reader.read_u8()?;
    if reader.is_empty() {
        return Ok(packet);
    }

    decode_properties(reader, "decode_disconnect", |property_key, value| {
        match (property_key, value) {
            (PROPERTY_KEY_SESSION_EXPIRY_INTERVAL, PropertyValue::FourByte(interval)) => {
                packet.session_expiry_interval_seconds = Some(interval);
            }
            (PROPERTY_KEY_REASON_STRING, PropertyValue::Utf8(reason_string)) => {
                packet.reason_string = Some(reason_string);
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
        error!("decode_disconnect - property length does not match remaining packet length");
        return Err(MqttError::MalformedPacket);
    }

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encode_packet, split_fixed_header};

    #[test]
    fn disconnect_normal_short_form() {
        let packet = DisconnectPacket::default();
        let bytes = encode_packet(|cursor| write_disconnect(cursor, &packet));
        assert_eq!(vec![0xE0, 0x00], bytes);
    }

    #[test]
    fn disconnect_with_reason_only() {
        let packet = DisconnectPacket {
            reason_code: reason_code::DISCONNECT_WITH_WILL_MESSAGE,
            ..Default::default()
        };
        let bytes = encode_packet(|cursor| write_disconnect(cursor, &packet));
        assert_eq!(vec![0xE0, 0x01, 0x04], bytes);
    }

    #[test]
    fn disconnect_round_trip_with_properties() {
        let packet = DisconnectPacket {
            reason_code: reason_code::QUOTA_EXCEEDED,
            session_expiry_interval_seconds: Some(0),
            reason_string: Some("too chatty".to_string()),
            server_reference: None,
            user_properties: None,
        };

        let bytes = encode_packet(|cursor| write_disconnect(cursor, &packet));
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        assert_eq!(packet, decode_disconnect(first_byte, &mut reader).unwrap());
    }

    #[test]
    fn disconnect_empty_body_decodes_as_normal() {
        let mut reader = Reader::new(&[]);
        let packet = decode_disconnect(0xE0, &mut reader).unwrap();
        assert_eq!(reason_code::SUCCESS, packet.reason_code);
        assert_eq!(None, packet.reason_string);
    }

    #[test]
    fn disconnect_decode_with_server_reference() {
        let body = [
            0x9C, 0x0C, 0x1C, 0x00, 0x09, b'e', b'l', b's', b'e', b'w', b'h', b'e', b'r', b'e',
        ];
        let mut reader = Reader::new(&body);
        let packet = decode_disconnect(0xE0, &mut reader).unwrap();

        assert_eq!(0x9C, packet.reason_code);
        assert_eq!(Some("elsewhere".to_string()), packet.server_reference);
    }
}

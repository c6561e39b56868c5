/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::{collect_user_property, decode_properties, PropertyValue, Reader};
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::*;
use crate::mqtt::SubackPacket;

use log::error;

pub(crate) fn decode_suback(first_byte: u8, reader: &mut Reader) -> MqttResult<SubackPacket> {
    if first_byte != (PACKET_TYPE_SUBACK << 4) {
        error!("decode_suback - invalid first byte");
        return Err(MqttError::MalformedPacket);
    }

    let mut packet = SubackPacket {
        packet_id: reader.read_u16()?,
        ..Default::default()
    };

    decode_properties(reader, "decode_suback", |property_key, value| {
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

    /* one reason code per remaining byte, one per requested subscription */
    if reader.is_empty() {
        error!("decode_suback - missing reason codes");
        return Err(MqttError::MalformedPacket);
    }

    while !reader.is_empty() {
        packet.reason_codes.push(reader.read_u8()?);
    }

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::reason_code;
    use crate::testing::split_fixed_header;
    use assert_matches::assert_matches;

    #[test]
    fn suback_single_grant() {
        let bytes = [0x90, 0x04, 0x00, 0x01, 0x00, 0x01];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let packet = decode_suback(first_byte, &mut reader).unwrap();

        assert_eq!(1, packet.packet_id);
        assert_eq!(vec![reason_code::GRANTED_QOS_1], packet.reason_codes);
    }

    #[test]
    fn suback_mixed_grant_and_decline() {
        let bytes = [0x90, 0x06, 0x00, 0x07, 0x00, 0x02, 0x87, 0x00];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let packet = decode_suback(first_byte, &mut reader).unwrap();

        assert_eq!(7, packet.packet_id);
        assert_eq!(
            vec![reason_code::GRANTED_QOS_2, reason_code::NOT_AUTHORIZED, reason_code::SUCCESS],
            packet.reason_codes
        );
    }

    #[test]
    fn suback_with_reason_string_property() {
        let bytes = [
            0x90, 0x09, 0x00, 0x02, 0x05, 0x1F, 0x00, 0x02, b'o', b'k', 0x01,
        ];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let packet = decode_suback(first_byte, &mut reader).unwrap();

        assert_eq!(Some("ok".to_string()), packet.reason_string);
        assert_eq!(vec![0x01], packet.reason_codes);
    }

    #[test]
    fn suback_requires_at_least_one_reason_code() {
        let bytes = [0x90, 0x03, 0x00, 0x01, 0x00];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        assert_matches!(decode_suback(first_byte, &mut reader), Err(MqttError::MalformedPacket));
    }
}

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::{collect_user_property, decode_properties, PropertyValue, Reader};
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::*;
use crate::mqtt::UnsubackPacket;

use log::error;

pub(crate) fn decode_unsuback(first_byte: u8, reader: &mut Reader) -> MqttResult<UnsubackPacket> {
    if first_byte != (PACKET_TYPE_UNSUBACK << 4) {
        error!("decode_unsuback - invalid first byte");
        return Err(MqttError::MalformedPacket);
    }

    let mut packet = UnsubackPacket {
        packet_id: reader.read_u16()?,
        ..Default::default()
    };

    decode_properties(reader, "decode_unsuback", |property_key, value| {
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

    while !reader.is_empty() {
        packet.reason_codes.push(reader.read_u8()?);
    }

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::split_fixed_header;
    use assert_matches::assert_matches;

    #[test]
    fn unsuback_single_entry() {
        let bytes = [0xB0, 0x04, 0x00, 0x09, 0x00, 0x00];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let packet = decode_unsuback(first_byte, &mut reader).unwrap();

        assert_eq!(9, packet.packet_id);
        assert_eq!(vec![0x00], packet.reason_codes);
    }

    #[test]
    fn unsuback_multiple_reason_codes() {
        let bytes = [0xB0, 0x05, 0x00, 0x01, 0x00, 0x00, 0x11];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let packet = decode_unsuback(first_byte, &mut reader).unwrap();

        assert_eq!(vec![0x00, 0x11], packet.reason_codes);
    }

    #[test]
    fn unsuback_rejects_flag_bits() {
        let mut reader = Reader::new(&[0x00, 0x01, 0x00]);
        assert_matches!(decode_unsuback(0xB2, &mut reader), Err(MqttError::MalformedPacket));
    }
}

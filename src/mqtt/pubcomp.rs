/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::define_ack_packet_decode_function;
use crate::encode::define_ack_packet_write_function;
use crate::mqtt::utils::PUBCOMP_FIRST_BYTE;

define_ack_packet_write_function!(write_pubcomp, PUBCOMP_FIRST_BYTE);
define_ack_packet_decode_function!(decode_pubcomp, PUBCOMP_FIRST_BYTE, "decode_pubcomp");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::{reason_code, AckPacket, UserProperty};
    use crate::testing::{encode_packet, split_fixed_header};

    #[test]
    fn pubcomp_success_short_form() {
        let packet = AckPacket::new(1, reason_code::SUCCESS);
        let bytes = encode_packet(|cursor| write_pubcomp(cursor, &packet));
        assert_eq!(vec![0x70, 0x02, 0x00, 0x01], bytes);
    }

    #[test]
    fn pubcomp_round_trip_with_properties() {
        let packet = AckPacket {
            packet_id: 512,
            reason_code: reason_code::PACKET_IDENTIFIER_NOT_FOUND,
            reason_string: None,
            user_properties: Some(vec![UserProperty {
                name: "origin".to_string(),
                value: "qos2".to_string(),
            }]),
        };

        let bytes = encode_packet(|cursor| write_pubcomp(cursor, &packet));
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        assert_eq!(packet, decode_pubcomp(first_byte, &mut reader).unwrap());
    }

    #[test]
    fn pubcomp_three_byte_form_decodes() {
        let (first_byte, mut reader) = split_fixed_header(&[0x70, 0x03, 0x00, 0x01, 0x00]);
        let decoded = decode_pubcomp(first_byte, &mut reader).unwrap();
        assert_eq!(1, decoded.packet_id);
        assert_eq!(reason_code::SUCCESS, decoded.reason_code);
    }
}

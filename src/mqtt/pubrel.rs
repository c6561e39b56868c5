/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::define_ack_packet_decode_function;
use crate::encode::define_ack_packet_write_function;
use crate::mqtt::utils::PUBREL_FIRST_BYTE;

define_ack_packet_write_function!(write_pubrel, PUBREL_FIRST_BYTE);
define_ack_packet_decode_function!(decode_pubrel, PUBREL_FIRST_BYTE, "decode_pubrel");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MqttError;
    use crate::mqtt::{reason_code, AckPacket};
    use crate::testing::{encode_packet, split_fixed_header};
    use assert_matches::assert_matches;

    #[test]
    fn pubrel_carries_reserved_flag_nibble() {
        let packet = AckPacket::new(1, reason_code::SUCCESS);
        let bytes = encode_packet(|cursor| write_pubrel(cursor, &packet));
        assert_eq!(vec![0x62, 0x02, 0x00, 0x01], bytes);
    }

    #[test]
    fn pubrel_round_trip() {
        let packet = AckPacket::new(77, reason_code::PACKET_IDENTIFIER_NOT_FOUND);
        let bytes = encode_packet(|cursor| write_pubrel(cursor, &packet));
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        assert_eq!(packet, decode_pubrel(first_byte, &mut reader).unwrap());
    }

    #[test]
    fn pubrel_decode_rejects_missing_reserved_flags() {
        let mut reader = crate::decode::Reader::new(&[0x00, 0x01]);
        assert_matches!(
            decode_pubrel(0x60, &mut reader),
            Err(MqttError::MalformedPacket)
        );
    }
}

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::encode::*;
use crate::error::MqttResult;
use crate::mqtt::utils::*;
use crate::mqtt::UserProperty;

pub(crate) fn write_unsubscribe(
    cursor: &mut EncodeCursor,
    packet_id: u16,
    topic_filters: &[&str],
    user_properties: Option<&[UserProperty]>,
) -> MqttResult<()> {
    let body = |cursor: &mut EncodeCursor| -> MqttResult<()> {
        cursor.put_u16(packet_id);
        put_property_section(cursor, |cursor| {
            put_user_properties(cursor, user_properties);
            Ok(())
        })?;

        for topic_filter in topic_filters {
            cursor.put_string(topic_filter);
        }

        Ok(())
    };

    let remaining_length = measure(&body)?;
    cursor.put_u8(UNSUBSCRIBE_FIRST_BYTE);
    cursor.put_vli(remaining_length as u32)?;
    body(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::encode_packet;

    #[test]
    fn unsubscribe_exact_bytes() {
        let bytes = encode_packet(|cursor| write_unsubscribe(cursor, 5, &["a/b"], None));

        let expected: Vec<u8> = vec![
            0xA2, 0x08, // UNSUBSCRIBE with reserved flag nibble 0b0010
            0x00, 0x05, // packet id
            0x00, // property length
            0x00, 0x03, b'a', b'/', b'b',
        ];
        assert_eq!(expected, bytes);
    }

    #[test]
    fn unsubscribe_multiple_filters() {
        let bytes = encode_packet(|cursor| {
            write_unsubscribe(cursor, 6, &["one", "two/#"], None)
        });

        assert_eq!(0xA2, bytes[0]);
        assert_eq!(&[0x00, 0x03], &bytes[5..7]);
        assert_eq!(b"one", &bytes[7..10]);
        assert_eq!(&[0x00, 0x05], &bytes[10..12]);
        assert_eq!(b"two/#", &bytes[12..17]);
    }
}

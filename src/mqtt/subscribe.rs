/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::config::SubscribeOptions;
use crate::encode::*;
use crate::error::MqttResult;
use crate::mqtt::utils::*;
use crate::mqtt::Subscription;

fn compute_subscription_options_byte(subscription: &Subscription) -> u8 {
    let mut options_byte = subscription.qos as u8;

    if subscription.no_local {
        options_byte |= SUBSCRIPTION_OPTIONS_NO_LOCAL_MASK;
    }
    if subscription.retain_as_published {
        options_byte |= SUBSCRIPTION_OPTIONS_RETAIN_AS_PUBLISHED_MASK;
    }
    options_byte |= (subscription.retain_handling as u8) << SUBSCRIPTION_OPTIONS_RETAIN_HANDLING_SHIFT;

    options_byte
}

fn write_subscribe_properties(cursor: &mut EncodeCursor, options: &SubscribeOptions) -> MqttResult<()> {
    put_vli_property(cursor, PROPERTY_KEY_SUBSCRIPTION_IDENTIFIER, options.subscription_identifier)?;
    put_user_properties(cursor, options.user_properties.as_deref());
    Ok(())
}

pub(crate) fn write_subscribe(
    cursor: &mut EncodeCursor,
    packet_id: u16,
    subscriptions: &[Subscription],
    options: &SubscribeOptions,
) -> MqttResult<()> {
    let body = |cursor: &mut EncodeCursor| -> MqttResult<()> {
        cursor.put_u16(packet_id);
        put_property_section(cursor, |cursor| write_subscribe_properties(cursor, options))?;

        for subscription in subscriptions {
            cursor.put_string(&subscription.topic_filter);
            cursor.put_u8(compute_subscription_options_byte(subscription));
        }

        Ok(())
    };

    let remaining_length = measure(&body)?;
    cursor.put_u8(SUBSCRIBE_FIRST_BYTE);
    cursor.put_vli(remaining_length as u32)?;
    body(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::{QualityOfService, RetainHandlingType};
    use crate::testing::encode_packet;

    #[test]
    fn subscribe_single_entry_exact_bytes() {
        let subscriptions = vec![Subscription::new("sensors/+", QualityOfService::AtLeastOnce)];
        let bytes = encode_packet(|cursor| {
            write_subscribe(cursor, 1, &subscriptions, &SubscribeOptions::default())
        });

        let expected: Vec<u8> = vec![
            0x82, 0x0F, // SUBSCRIBE with reserved flag nibble 0b0010, remaining length 15
            0x00, 0x01, // packet id
            0x00, // property length
            0x00, 0x09, b's', b'e', b'n', b's', b'o', b'r', b's', b'/', b'+',
            0x01, // options byte: qos 1
        ];
        assert_eq!(expected, bytes);
    }

    #[test]
    fn subscription_options_byte_packs_all_fields() {
        let subscription = Subscription {
            topic_filter: "a".to_string(),
            qos: QualityOfService::ExactlyOnce,
            no_local: true,
            retain_as_published: true,
            retain_handling: RetainHandlingType::DontSend,
        };

        assert_eq!(0x02 | 0x04 | 0x08 | 0x20, compute_subscription_options_byte(&subscription));
    }

    #[test]
    fn subscribe_carries_subscription_identifier_property() {
        let subscriptions = vec![Subscription::new("a/b", QualityOfService::AtMostOnce)];
        let options = SubscribeOptions {
            subscription_identifier: Some(5),
            ..Default::default()
        };

        let bytes = encode_packet(|cursor| write_subscribe(cursor, 2, &subscriptions, &options));

        // property length 2: identifier key + single-byte vli value
        assert_eq!(0x02, bytes[4]);
        assert_eq!(0x0B, bytes[5]);
        assert_eq!(0x05, bytes[6]);
    }

    #[test]
    fn subscribe_multiple_entries_in_order() {
        let subscriptions = vec![
            Subscription::new("first", QualityOfService::AtMostOnce),
            Subscription::new("second", QualityOfService::AtLeastOnce),
        ];

        let bytes = encode_packet(|cursor| {
            write_subscribe(cursor, 3, &subscriptions, &SubscribeOptions::default())
        });

        let first_start = 5;
        assert_eq!(&[0x00, 0x05], &bytes[first_start..first_start + 2]);
        assert_eq!(b"first", &bytes[first_start + 2..first_start + 7]);
        assert_eq!(0x00, bytes[first_start + 7]);
        assert_eq!(&[0x00, 0x06], &bytes[first_start + 8..first_start + 10]);
        assert_eq!(b"second", &bytes[first_start + 10..first_start + 16]);
        assert_eq!(0x01, bytes[first_start + 16]);
    }
}

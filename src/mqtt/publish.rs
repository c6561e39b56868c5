/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::alias::OutboundAliasResolution;
use crate::config::CORRELATION_DATA_MAXIMUM;
use crate::decode::{collect_user_property, decode_properties, PropertyValue, Reader};
use crate::encode::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::*;
use crate::mqtt::{PublishMessage, QualityOfService, ReceivedPublish};
use crate::utf8::is_valid_utf8;

use log::{debug, error};

fn write_publish_properties(
    cursor: &mut EncodeCursor,
    message: &PublishMessage,
    alias: Option<u16>,
) -> MqttResult<()> {
    put_u8_property(cursor, PROPERTY_KEY_PAYLOAD_FORMAT_INDICATOR, message.payload_format_indicator.map(|v| v as u8));
    put_u32_property(cursor, PROPERTY_KEY_MESSAGE_EXPIRY_INTERVAL, message.message_expiry_interval);
    put_string_property(cursor, PROPERTY_KEY_CONTENT_TYPE, message.content_type.as_deref());
    put_string_property(cursor, PROPERTY_KEY_RESPONSE_TOPIC, message.response_topic.as_deref());
    put_binary_property(cursor, PROPERTY_KEY_CORRELATION_DATA, message.correlation_data.as_deref());
    put_u16_property(cursor, PROPERTY_KEY_TOPIC_ALIAS, alias);
    put_vli_property(cursor, PROPERTY_KEY_SUBSCRIPTION_IDENTIFIER, message.subscription_identifier)?;
    put_user_properties(cursor, message.user_properties.as_deref());
    Ok(())
}

pub(crate) fn write_publish(
    cursor: &mut EncodeCursor,
    message: &PublishMessage,
    resolution: &OutboundAliasResolution,
) -> MqttResult<()> {
    let alias = resolution.alias.or(message.topic_alias);

    let body = |cursor: &mut EncodeCursor| -> MqttResult<()> {
        if resolution.skip_topic {
            cursor.put_string("");
        } else {
            cursor.put_string(&message.topic);
        }

        if message.qos != QualityOfService::AtMostOnce {
            cursor.put_u16(message.packet_id);
        }

        put_property_section(cursor, |cursor| write_publish_properties(cursor, message, alias))?;

        /* payload is raw bytes, no length prefix */
        cursor.put_slice(&message.payload);
        Ok(())
    };

    let mut flags: u8 = (message.qos as u8) << 1;
    if message.dup {
        flags |= PUBLISH_FIXED_HEADER_DUPLICATE_FLAG;
    }
    if message.retain {
        flags |= PUBLISH_FIXED_HEADER_RETAIN_FLAG;
    }

    let remaining_length = measure(&body)?;
    cursor.put_u8((PACKET_TYPE_PUBLISH << 4) | flags);
    cursor.put_vli(remaining_length as u32)?;
    body(cursor)
}

pub(crate) fn decode_publish<'a>(first_byte: u8, reader: &mut Reader<'a>) -> MqttResult<ReceivedPublish<'a>> {
    let flags = first_byte & 0x0F;
    let qos = convert_u8_to_quality_of_service((flags >> 1) & QOS_MASK)
        .map_err(|_| MqttError::MalformedPacket)?;

    let topic = reader.read_string()?;

    let packet_id = if qos != QualityOfService::AtMostOnce {
        reader.read_u16()?
    } else {
        0
    };

    let mut publish = ReceivedPublish {
        topic,
        payload: &[],
        qos,
        retain: (flags & PUBLISH_FIXED_HEADER_RETAIN_FLAG) != 0,
        dup: (flags & PUBLISH_FIXED_HEADER_DUPLICATE_FLAG) != 0,
        packet_id,
        payload_format_indicator: 0,
        message_expiry_interval: None,
        response_topic: None,
        content_type: None,
        correlation_data: None,
        topic_alias: None,
        subscription_identifier: None,
        user_properties: None,
    };

    decode_properties(reader, "decode_publish", |property_key, value| {
        match (property_key, value) {
            (PROPERTY_KEY_PAYLOAD_FORMAT_INDICATOR, PropertyValue::Byte(indicator)) => {
                publish.payload_format_indicator = indicator;
            }
            (PROPERTY_KEY_MESSAGE_EXPIRY_INTERVAL, PropertyValue::FourByte(interval)) => {
                publish.message_expiry_interval = Some(interval);
            }
            (PROPERTY_KEY_TOPIC_ALIAS, PropertyValue::TwoByte(alias)) => {
                publish.topic_alias = Some(alias);
            }
            (PROPERTY_KEY_RESPONSE_TOPIC, PropertyValue::Utf8(topic)) => {
                publish.response_topic = Some(topic);
            }
            (PROPERTY_KEY_CORRELATION_DATA, PropertyValue::Binary(data)) => {
                // oversized correlation data is dropped whole, never truncated
                if data.len() <= CORRELATION_DATA_MAXIMUM {
                    publish.correlation_data = Some(data);
                } else {
                    debug!("decode_publish - dropping correlation data of {} bytes", data.len());
                }
            }
            (PROPERTY_KEY_CONTENT_TYPE, PropertyValue::Utf8(content_type)) => {
                publish.content_type = Some(content_type);
            }
            (PROPERTY_KEY_SUBSCRIPTION_IDENTIFIER, PropertyValue::VarInt(identifier)) => {
                publish.subscription_identifier = Some(identifier);
            }
            (PROPERTY_KEY_USER_PROPERTY, PropertyValue::Pair(name, value)) => {
                collect_user_property(&mut publish.user_properties, name, value);
            }
            _ => {
                return Err(MqttError::UnknownIdentifier);
            }
        }
        Ok(())
    })?;

    publish.payload = reader.take_rest();

    if publish.payload_format_indicator == 1 && !is_valid_utf8(publish.payload) {
        error!("decode_publish - payload declared utf-8 but does not validate");
        return Err(MqttError::InvalidEncoding);
    }

    Ok(publish)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encode_packet, split_fixed_header};
    use assert_matches::assert_matches;

    #[test]
    fn publish_qos0_exact_bytes() {
        let message = PublishMessage::new("a/b", b"hi", QualityOfService::AtMostOnce);
        let bytes = encode_packet(|cursor| {
            write_publish(cursor, &message, &OutboundAliasResolution::default())
        });

        assert_eq!(
            vec![0x30, 0x08, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x68, 0x69],
            bytes
        );
    }

    #[test]
    fn publish_qos1_exact_bytes() {
        let mut message = PublishMessage::new("a/b", b"hi", QualityOfService::AtLeastOnce);
        message.packet_id = 1;

        let bytes = encode_packet(|cursor| {
            write_publish(cursor, &message, &OutboundAliasResolution::default())
        });

        assert_eq!(
            vec![0x32, 0x0A, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x01, 0x00, 0x68, 0x69],
            bytes
        );
    }

    #[test]
    fn publish_qos2_flags() {
        let mut message = PublishMessage::new("a/b", b"hi", QualityOfService::ExactlyOnce);
        message.packet_id = 1;
        message.retain = false;

        let bytes = encode_packet(|cursor| {
            write_publish(cursor, &message, &OutboundAliasResolution::default())
        });
        assert_eq!(0x34, bytes[0]);
    }

    #[test]
    fn publish_alias_resolution_can_elide_topic() {
        let mut message = PublishMessage::new("a/b", b"hi", QualityOfService::AtMostOnce);
        message.topic_alias = Some(4);

        let resolution = OutboundAliasResolution { skip_topic: true, alias: Some(4) };
        let bytes = encode_packet(|cursor| write_publish(cursor, &message, &resolution));

        // empty topic, then the topic alias property
        assert_eq!(
            vec![0x30, 0x08, 0x00, 0x00, 0x03, 0x23, 0x00, 0x04, 0x68, 0x69],
            bytes
        );
    }

    #[test]
    fn publish_round_trip_with_properties() {
        let mut message = PublishMessage::new("sensors/temp", b"23.5", QualityOfService::AtLeastOnce);
        message.packet_id = 9;
        message.payload_format_indicator = Some(crate::mqtt::PayloadFormatIndicator::Utf8);
        message.message_expiry_interval = Some(300);
        message.content_type = Some("text/plain".to_string());
        message.response_topic = Some("replies/temp".to_string());
        message.correlation_data = Some(vec![1, 2, 3]);
        message.user_properties = Some(vec![crate::mqtt::UserProperty {
            name: "unit".to_string(),
            value: "celsius".to_string(),
        }]);

        let bytes = encode_packet(|cursor| {
            write_publish(cursor, &message, &OutboundAliasResolution::default())
        });
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let decoded = decode_publish(first_byte, &mut reader).unwrap();

        assert_eq!("sensors/temp", decoded.topic);
        assert_eq!(b"23.5", decoded.payload);
        assert_eq!(QualityOfService::AtLeastOnce, decoded.qos);
        assert_eq!(9, decoded.packet_id);
        assert_eq!(1, decoded.payload_format_indicator);
        assert_eq!(Some(300), decoded.message_expiry_interval);
        assert_eq!(Some("text/plain".to_string()), decoded.content_type);
        assert_eq!(Some("replies/temp".to_string()), decoded.response_topic);
        assert_eq!(Some(vec![1, 2, 3]), decoded.correlation_data);
        assert_eq!(1, decoded.user_properties.unwrap().len());
    }

    #[test]
    fn publish_decode_literal_subscription_delivery() {
        let bytes = [
            0x32, 0x12, 0x00, 0x09, 0x73, 0x65, 0x6E, 0x73, 0x6F, 0x72, 0x73, 0x2F, 0x78, 0x00,
            0x2A, 0x00, 0x32, 0x33, 0x2E, 0x35,
        ];
        let (first_byte, mut reader) = split_fixed_header(&bytes);
        let decoded = decode_publish(first_byte, &mut reader).unwrap();

        assert_eq!("sensors/x", decoded.topic);
        assert_eq!(0x002A, decoded.packet_id);
        assert_eq!(QualityOfService::AtLeastOnce, decoded.qos);
        assert_eq!(b"23.5", decoded.payload);
    }

    #[test]
    fn publish_decode_rejects_surrogate_topic() {
        // topic bytes ED A0 80 encode the surrogate U+D800
        let body = [0x00, 0x03, 0xED, 0xA0, 0x80, 0x00];
        let mut reader = Reader::new(&body);
        assert_matches!(decode_publish(0x30, &mut reader), Err(MqttError::InvalidEncoding));
    }

    #[test]
    fn publish_decode_rejects_invalid_utf8_payload_when_declared() {
        // format indicator 1 with a single continuation byte as payload
        let body = [0x00, 0x01, 0x61, 0x02, 0x01, 0x01, 0x80];
        let mut reader = Reader::new(&body);
        assert_matches!(decode_publish(0x30, &mut reader), Err(MqttError::InvalidEncoding));
    }

    #[test]
    fn publish_decode_rejects_qos_three() {
        let body = [0x00, 0x01, 0x61, 0x00, 0x01, 0x00];
        let mut reader = Reader::new(&body);
        assert_matches!(decode_publish(0x36, &mut reader), Err(MqttError::MalformedPacket));
    }

    #[test]
    fn publish_decode_drops_oversized_correlation_data() {
        let mut body = vec![0x00, 0x01, 0x61]; // topic "a"
        let data_length = CORRELATION_DATA_MAXIMUM + 1;
        let property_length = 3 + data_length;
        body.push(0x80 | (property_length & 0x7F) as u8);
        body.push((property_length >> 7) as u8);
        body.push(PROPERTY_KEY_CORRELATION_DATA);
        body.push((data_length >> 8) as u8);
        body.push((data_length & 0xFF) as u8);
        body.extend(std::iter::repeat(0xAB).take(data_length));

        let mut reader = Reader::new(&body);
        let decoded = decode_publish(0x30, &mut reader).unwrap();
        assert_eq!(None, decoded.correlation_data);
    }
}

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing miscellaneous constants and conversion functions related to the MQTT
specification.
 */

use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

use log::error;

pub(crate) const PACKET_TYPE_CONNECT: u8 = 1;
pub(crate) const PACKET_TYPE_CONNACK: u8 = 2;
pub(crate) const PACKET_TYPE_PUBLISH: u8 = 3;
pub(crate) const PACKET_TYPE_PUBACK: u8 = 4;
pub(crate) const PACKET_TYPE_PUBREC: u8 = 5;
pub(crate) const PACKET_TYPE_PUBREL: u8 = 6;
pub(crate) const PACKET_TYPE_PUBCOMP: u8 = 7;
pub(crate) const PACKET_TYPE_SUBSCRIBE: u8 = 8;
pub(crate) const PACKET_TYPE_SUBACK: u8 = 9;
pub(crate) const PACKET_TYPE_UNSUBSCRIBE: u8 = 10;
pub(crate) const PACKET_TYPE_UNSUBACK: u8 = 11;
pub(crate) const PACKET_TYPE_PINGREQ: u8 = 12;
pub(crate) const PACKET_TYPE_PINGRESP: u8 = 13;
pub(crate) const PACKET_TYPE_DISCONNECT: u8 = 14;
pub(crate) const PACKET_TYPE_AUTH: u8 = 15;

pub(crate) const PROPERTY_KEY_PAYLOAD_FORMAT_INDICATOR: u8 = 1;
pub(crate) const PROPERTY_KEY_MESSAGE_EXPIRY_INTERVAL: u8 = 2;
pub(crate) const PROPERTY_KEY_CONTENT_TYPE: u8 = 3;
pub(crate) const PROPERTY_KEY_RESPONSE_TOPIC: u8 = 8;
pub(crate) const PROPERTY_KEY_CORRELATION_DATA: u8 = 9;
pub(crate) const PROPERTY_KEY_SUBSCRIPTION_IDENTIFIER: u8 = 11;
pub(crate) const PROPERTY_KEY_SESSION_EXPIRY_INTERVAL: u8 = 17;
pub(crate) const PROPERTY_KEY_ASSIGNED_CLIENT_IDENTIFIER: u8 = 18;
pub(crate) const PROPERTY_KEY_SERVER_KEEP_ALIVE: u8 = 19;
pub(crate) const PROPERTY_KEY_AUTHENTICATION_METHOD: u8 = 21;
pub(crate) const PROPERTY_KEY_AUTHENTICATION_DATA: u8 = 22;
pub(crate) const PROPERTY_KEY_REQUEST_PROBLEM_INFORMATION: u8 = 23;
pub(crate) const PROPERTY_KEY_WILL_DELAY_INTERVAL: u8 = 24;
pub(crate) const PROPERTY_KEY_REQUEST_RESPONSE_INFORMATION: u8 = 25;
pub(crate) const PROPERTY_KEY_RESPONSE_INFORMATION: u8 = 26;
pub(crate) const PROPERTY_KEY_SERVER_REFERENCE: u8 = 28;
pub(crate) const PROPERTY_KEY_REASON_STRING: u8 = 31;
pub(crate) const PROPERTY_KEY_RECEIVE_MAXIMUM: u8 = 33;
pub(crate) const PROPERTY_KEY_TOPIC_ALIAS_MAXIMUM: u8 = 34;
pub(crate) const PROPERTY_KEY_TOPIC_ALIAS: u8 = 35;
pub(crate) const PROPERTY_KEY_MAXIMUM_QOS: u8 = 36;
pub(crate) const PROPERTY_KEY_RETAIN_AVAILABLE: u8 = 37;
pub(crate) const PROPERTY_KEY_USER_PROPERTY: u8 = 38;
pub(crate) const PROPERTY_KEY_MAXIMUM_PACKET_SIZE: u8 = 39;
pub(crate) const PROPERTY_KEY_WILDCARD_SUBSCRIPTIONS_AVAILABLE: u8 = 40;
pub(crate) const PROPERTY_KEY_SUBSCRIPTION_IDENTIFIERS_AVAILABLE: u8 = 41;
pub(crate) const PROPERTY_KEY_SHARED_SUBSCRIPTIONS_AVAILABLE: u8 = 42;

pub(crate) const MQTT_PROTOCOL_VERSION: u8 = 5;

pub(crate) const PUBLISH_FIXED_HEADER_DUPLICATE_FLAG: u8 = 1 << 3;
pub(crate) const PUBLISH_FIXED_HEADER_RETAIN_FLAG: u8 = 1;
pub(crate) const QOS_MASK: u8 = 0x03;

pub(crate) const CONNECT_FLAGS_CLEAN_START_MASK: u8 = 1 << 1;
pub(crate) const CONNECT_FLAGS_HAS_WILL_MASK: u8 = 1 << 2;
pub(crate) const CONNECT_FLAGS_WILL_QOS_SHIFT: u8 = 3;
pub(crate) const CONNECT_FLAGS_WILL_RETAIN_MASK: u8 = 1 << 5;
pub(crate) const CONNECT_FLAGS_HAS_PASSWORD_MASK: u8 = 1 << 6;
pub(crate) const CONNECT_FLAGS_HAS_USERNAME_MASK: u8 = 1 << 7;

pub(crate) const SUBSCRIPTION_OPTIONS_NO_LOCAL_MASK: u8 = 1 << 2;
pub(crate) const SUBSCRIPTION_OPTIONS_RETAIN_AS_PUBLISHED_MASK: u8 = 1 << 3;
pub(crate) const SUBSCRIPTION_OPTIONS_RETAIN_HANDLING_SHIFT: u8 = 4;

pub(crate) const CONNECT_FIRST_BYTE: u8 = PACKET_TYPE_CONNECT << 4;
pub(crate) const PUBACK_FIRST_BYTE: u8 = PACKET_TYPE_PUBACK << 4;
pub(crate) const PUBREC_FIRST_BYTE: u8 = PACKET_TYPE_PUBREC << 4;
pub(crate) const PUBREL_FIRST_BYTE: u8 = (PACKET_TYPE_PUBREL << 4) | 0x02;
pub(crate) const PUBCOMP_FIRST_BYTE: u8 = PACKET_TYPE_PUBCOMP << 4;
pub(crate) const SUBSCRIBE_FIRST_BYTE: u8 = (PACKET_TYPE_SUBSCRIBE << 4) | 0x02;
pub(crate) const UNSUBSCRIBE_FIRST_BYTE: u8 = (PACKET_TYPE_UNSUBSCRIBE << 4) | 0x02;
pub(crate) const PINGREQ_FIRST_BYTE: u8 = PACKET_TYPE_PINGREQ << 4;
pub(crate) const PINGRESP_FIRST_BYTE: u8 = PACKET_TYPE_PINGRESP << 4;
pub(crate) const DISCONNECT_FIRST_BYTE: u8 = PACKET_TYPE_DISCONNECT << 4;

pub(crate) fn convert_u8_to_quality_of_service(value: u8) -> MqttResult<QualityOfService> {
    match value {
        0 => Ok(QualityOfService::AtMostOnce),
        1 => Ok(QualityOfService::AtLeastOnce),
        2 => Ok(QualityOfService::ExactlyOnce),
        _ => {
            error!("Invalid quality of service value ({})", value);
            Err(MqttError::InvalidQos)
        }
    }
}

pub(crate) fn packet_type_to_str(packet_type: u8) -> &'static str {
    match packet_type {
        PACKET_TYPE_CONNECT => "Connect",
        PACKET_TYPE_CONNACK => "Connack",
        PACKET_TYPE_PUBLISH => "Publish",
        PACKET_TYPE_PUBACK => "Puback",
        PACKET_TYPE_PUBREC => "Pubrec",
        PACKET_TYPE_PUBREL => "Pubrel",
        PACKET_TYPE_PUBCOMP => "Pubcomp",
        PACKET_TYPE_SUBSCRIBE => "Subscribe",
        PACKET_TYPE_SUBACK => "Suback",
        PACKET_TYPE_UNSUBSCRIBE => "Unsubscribe",
        PACKET_TYPE_UNSUBACK => "Unsuback",
        PACKET_TYPE_PINGREQ => "Pingreq",
        PACKET_TYPE_PINGRESP => "Pingresp",
        PACKET_TYPE_DISCONNECT => "Disconnect",
        PACKET_TYPE_AUTH => "Auth",
        _ => "Unknown",
    }
}

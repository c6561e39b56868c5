/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::config::{ConnectOptions, WillMessage};
use crate::encode::*;
use crate::error::MqttResult;
use crate::mqtt::utils::*;

fn compute_connect_flags(options: &ConnectOptions) -> u8 {
    let mut flags: u8 = 0;

    if options.clean_start {
        flags |= CONNECT_FLAGS_CLEAN_START_MASK;
    }

    if let Some(will) = &options.will {
        flags |= CONNECT_FLAGS_HAS_WILL_MASK;
        flags |= (will.qos as u8) << CONNECT_FLAGS_WILL_QOS_SHIFT;
        if will.retain {
            flags |= CONNECT_FLAGS_WILL_RETAIN_MASK;
        }
    }

    if options.username.is_some() {
        flags |= CONNECT_FLAGS_HAS_USERNAME_MASK;
    }

    if options.password.is_some() {
        flags |= CONNECT_FLAGS_HAS_PASSWORD_MASK;
    }

    flags
}

fn write_connect_properties(cursor: &mut EncodeCursor, options: &ConnectOptions) -> MqttResult<()> {
    put_u32_property(cursor, PROPERTY_KEY_SESSION_EXPIRY_INTERVAL, options.session_expiry_interval_seconds);
    put_u16_property(cursor, PROPERTY_KEY_RECEIVE_MAXIMUM, options.receive_maximum);
    put_u32_property(cursor, PROPERTY_KEY_MAXIMUM_PACKET_SIZE, options.maximum_packet_size_bytes);
    put_u16_property(cursor, PROPERTY_KEY_TOPIC_ALIAS_MAXIMUM, options.topic_alias_maximum);
    put_bool_property(cursor, PROPERTY_KEY_REQUEST_RESPONSE_INFORMATION, options.request_response_information);
    put_bool_property(cursor, PROPERTY_KEY_REQUEST_PROBLEM_INFORMATION, options.request_problem_information);
    put_string_property(cursor, PROPERTY_KEY_AUTHENTICATION_METHOD, options.authentication_method.as_deref());
    put_binary_property(cursor, PROPERTY_KEY_AUTHENTICATION_DATA, options.authentication_data.as_deref());
    put_user_properties(cursor, options.user_properties.as_deref());
    Ok(())
}

fn write_will_properties(cursor: &mut EncodeCursor, will: &WillMessage) -> MqttResult<()> {
    put_u32_property(cursor, PROPERTY_KEY_WILL_DELAY_INTERVAL, will.delay_interval);
    put_u8_property(cursor, PROPERTY_KEY_PAYLOAD_FORMAT_INDICATOR, will.payload_format_indicator.map(|v| v as u8));
    put_u32_property(cursor, PROPERTY_KEY_MESSAGE_EXPIRY_INTERVAL, will.message_expiry_interval);
    put_string_property(cursor, PROPERTY_KEY_CONTENT_TYPE, will.content_type.as_deref());
    put_string_property(cursor, PROPERTY_KEY_RESPONSE_TOPIC, will.response_topic.as_deref());
    put_binary_property(cursor, PROPERTY_KEY_CORRELATION_DATA, will.correlation_data.as_deref());
    Ok(())
}

pub(crate) fn write_connect(cursor: &mut EncodeCursor, options: &ConnectOptions) -> MqttResult<()> {
    let body = |cursor: &mut EncodeCursor| -> MqttResult<()> {
        cursor.put_string("MQTT");
        cursor.put_u8(MQTT_PROTOCOL_VERSION);
        cursor.put_u8(compute_connect_flags(options));
        cursor.put_u16(options.keep_alive_interval_seconds);

        put_property_section(cursor, |cursor| write_connect_properties(cursor, options))?;

        cursor.put_string(options.client_id.as_deref().unwrap_or(""));

        if let Some(will) = &options.will {
            put_property_section(cursor, |cursor| write_will_properties(cursor, will))?;
            cursor.put_string(&will.topic);
            cursor.put_binary(&will.payload);
        }

        if let Some(username) = &options.username {
            cursor.put_string(username);
        }

        if let Some(password) = &options.password {
            cursor.put_binary(password);
        }

        Ok(())
    };

    let remaining_length = measure(&body)?;
    cursor.put_u8(CONNECT_FIRST_BYTE);
    cursor.put_vli(remaining_length as u32)?;
    body(cursor)
}

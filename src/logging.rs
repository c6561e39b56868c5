/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

// Display implementations used by client-level debug logging.

use crate::config::ConnectOptions;
use crate::mqtt::*;

use std::fmt;
use std::fmt::Write;

impl fmt::Display for UserProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(\"{}\",\"{}\")", self.name, self.value)
    }
}

pub(crate) fn create_user_properties_log_string(properties: &Vec<UserProperty>) -> String {
    let mut val: String = "[".to_string();
    for property in properties {
        write!(&mut val, " (\"{}\",\"{}\")", property.name, property.value).ok();
    }
    write!(&mut val, " ]").ok();
    val
}

macro_rules! log_primitive_value {
    ($integral_value: expr, $formatter: expr, $log_field: expr) => {
        write!($formatter, " {}:{}", $log_field, $integral_value)?;
    };
}

macro_rules! log_optional_primitive_value {
    ($optional_integral_value: expr, $formatter: expr, $log_field: expr, $value: ident) => {
        if let Some($value) = &$optional_integral_value {
            write!($formatter, " {}:{}", $log_field, $value)?;
        }
    };
}

macro_rules! log_string {
    ($value: expr, $formatter: expr, $log_field: expr) => {
        write!($formatter, " {}:\"{}\"", $log_field, $value)?;
    };
}

macro_rules! log_optional_string {
    ($optional_string: expr, $formatter: expr, $log_field: expr, $value: ident) => {
        if let Some($value) = &$optional_string {
            write!($formatter, " {}:\"{}\"", $log_field, $value)?;
        }
    };
}

macro_rules! log_optional_string_sensitive {
    ($optional_string: expr, $formatter: expr, $log_field: expr) => {
        if $optional_string.is_some() {
            write!($formatter, " {}:<...redacted>", $log_field)?;
        }
    };
}

macro_rules! log_optional_binary_data {
    ($optional_data: expr, $formatter: expr, $log_field: expr, $value: ident) => {
        if let Some($value) = &$optional_data {
            write!($formatter, " {}:<{} Bytes>", $log_field, $value.len())?;
        }
    };
}

macro_rules! log_user_properties {
    ($user_properties: expr, $formatter: expr, $log_field: expr, $value: ident) => {
        if let Some($value) = &$user_properties {
            write!($formatter, " {}:{}", $log_field, create_user_properties_log_string($value))?;
        }
    };
}

impl fmt::Display for PublishMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PublishMessage {{")?;
        log_string!(self.topic, f, "topic");
        log_primitive_value!(self.qos as u8, f, "qos");
        log_primitive_value!(self.retain, f, "retain");
        log_primitive_value!(self.dup, f, "dup");
        log_primitive_value!(self.packet_id, f, "packet_id");
        write!(f, " payload:<{} Bytes>", self.payload.len())?;
        log_optional_primitive_value!(self.message_expiry_interval, f, "message_expiry_interval", value);
        log_optional_string!(self.content_type, f, "content_type", value);
        log_optional_string!(self.response_topic, f, "response_topic", value);
        log_optional_binary_data!(self.correlation_data, f, "correlation_data", value);
        log_optional_primitive_value!(self.topic_alias, f, "topic_alias", value);
        log_user_properties!(self.user_properties, f, "user_properties", value);
        write!(f, " }}")
    }
}

impl fmt::Display for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConnectOptions {{")?;
        log_primitive_value!(self.keep_alive_interval_seconds, f, "keep_alive_interval_seconds");
        log_primitive_value!(self.clean_start, f, "clean_start");
        log_optional_string!(self.client_id, f, "client_id", value);
        log_optional_string!(self.username, f, "username", value);
        log_optional_string_sensitive!(self.password, f, "password");
        log_optional_primitive_value!(self.session_expiry_interval_seconds, f, "session_expiry_interval_seconds", value);
        log_optional_primitive_value!(self.receive_maximum, f, "receive_maximum", value);
        log_optional_primitive_value!(self.maximum_packet_size_bytes, f, "maximum_packet_size_bytes", value);
        log_optional_primitive_value!(self.topic_alias_maximum, f, "topic_alias_maximum", value);
        log_optional_string!(self.authentication_method, f, "authentication_method", value);
        log_user_properties!(self.user_properties, f, "user_properties", value);
        write!(f, " }}")
    }
}

impl fmt::Display for DisconnectPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DisconnectPacket {{")?;
        log_primitive_value!(self.reason_code, f, "reason_code");
        log_optional_primitive_value!(self.session_expiry_interval_seconds, f, "session_expiry_interval_seconds", value);
        log_optional_string!(self.reason_string, f, "reason_string", value);
        log_optional_string!(self.server_reference, f, "server_reference", value);
        log_user_properties!(self.user_properties, f, "user_properties", value);
        write!(f, " }}")
    }
}

impl fmt::Display for NegotiatedSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NegotiatedSettings {{")?;
        log_primitive_value!(self.session_present, f, "session_present");
        log_primitive_value!(self.maximum_qos, f, "maximum_qos");
        log_primitive_value!(self.retain_available, f, "retain_available");
        log_primitive_value!(self.wildcard_subscriptions_available, f, "wildcard_subscriptions_available");
        log_primitive_value!(self.shared_subscriptions_available, f, "shared_subscriptions_available");
        log_primitive_value!(self.subscription_identifiers_available, f, "subscription_identifiers_available");
        log_primitive_value!(self.server_keep_alive, f, "server_keep_alive");
        log_primitive_value!(self.maximum_packet_size, f, "maximum_packet_size");
        log_primitive_value!(self.topic_alias_maximum, f, "topic_alias_maximum");
        log_primitive_value!(self.receive_maximum, f, "receive_maximum");
        log_primitive_value!(self.session_expiry_interval, f, "session_expiry_interval");
        log_optional_string!(self.assigned_client_identifier, f, "assigned_client_identifier", value);
        log_optional_string!(self.response_information, f, "response_information", value);
        log_optional_string!(self.server_reference, f, "server_reference", value);
        write!(f, " }}")
    }
}

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Internal utilities to decode MQTT5 packets, based on the MQTT5 spec.
 */

use crate::error::{MqttError, MqttResult};
use crate::mqtt::UserProperty;
use crate::mqtt::utils::*;
use crate::utf8::is_valid_utf8;

use log::*;

/// Bounded read cursor over the bytes of a single incoming packet.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub(crate) fn read_u8(&mut self) -> MqttResult<u8> {
        if self.is_empty() {
            error!("Packet Decode - insufficient packet bytes for u8 value");
            return Err(MqttError::MalformedPacket);
        }

        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub(crate) fn read_u16(&mut self) -> MqttResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub(crate) fn read_u32(&mut self) -> MqttResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub(crate) fn read_vli(&mut self) -> MqttResult<u32> {
        let mut value: u32 = 0;
        let mut shift: u32 = 0;

        for _ in 0..4 {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32) << shift;
            shift += 7;

            if (byte & 0x80) == 0 {
                return Ok(value);
            }
        }

        error!("Packet Decode - invalid variable length integer");
        Err(MqttError::MalformedPacket)
    }

    pub(crate) fn read_bytes(&mut self, count: usize) -> MqttResult<&'a [u8]> {
        if count > self.remaining() {
            error!("Packet Decode - field length larger than remaining packet bytes");
            return Err(MqttError::MalformedPacket);
        }

        let bytes = &self.buf[self.pos..(self.pos + count)];
        self.pos += count;
        Ok(bytes)
    }

    /// Reads a two-byte length prefix followed by that many UTF-8 validated bytes.
    pub(crate) fn read_string(&mut self) -> MqttResult<String> {
        let length = self.read_u16()? as usize;
        let bytes = self.read_bytes(length)?;

        if !is_valid_utf8(bytes) {
            error!("Packet Decode - string value is not valid utf-8");
            return Err(MqttError::InvalidEncoding);
        }

        // Safety net only; the strict validator accepts a subset of what the
        // standard library accepts.
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| MqttError::InvalidEncoding)
    }

    /// Reads a two-byte length prefix followed by that many raw bytes.
    pub(crate) fn read_binary(&mut self) -> MqttResult<Vec<u8>> {
        let length = self.read_u16()? as usize;
        Ok(Vec::from(self.read_bytes(length)?))
    }

    /// Splits off a bounded reader over the next `length` bytes.
    pub(crate) fn sub_reader(&mut self, length: usize) -> MqttResult<Reader<'a>> {
        Ok(Reader::new(self.read_bytes(length)?))
    }

    /// Consumes and returns all bytes left in the packet.
    pub(crate) fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}

/// A property value decoded according to the wire type its identifier fixes.
pub(crate) enum PropertyValue {
    Byte(u8),
    TwoByte(u16),
    FourByte(u32),
    VarInt(u32),
    Utf8(String),
    Binary(Vec<u8>),
    Pair(String, String),
}

fn decode_property_value<'a>(id: u8, reader: &mut Reader<'a>) -> MqttResult<PropertyValue> {
    match id {
        PROPERTY_KEY_PAYLOAD_FORMAT_INDICATOR
        | PROPERTY_KEY_REQUEST_PROBLEM_INFORMATION
        | PROPERTY_KEY_REQUEST_RESPONSE_INFORMATION
        | PROPERTY_KEY_MAXIMUM_QOS
        | PROPERTY_KEY_RETAIN_AVAILABLE
        | PROPERTY_KEY_WILDCARD_SUBSCRIPTIONS_AVAILABLE
        | PROPERTY_KEY_SUBSCRIPTION_IDENTIFIERS_AVAILABLE
        | PROPERTY_KEY_SHARED_SUBSCRIPTIONS_AVAILABLE => Ok(PropertyValue::Byte(reader.read_u8()?)),

        PROPERTY_KEY_SERVER_KEEP_ALIVE
        | PROPERTY_KEY_RECEIVE_MAXIMUM
        | PROPERTY_KEY_TOPIC_ALIAS_MAXIMUM
        | PROPERTY_KEY_TOPIC_ALIAS => Ok(PropertyValue::TwoByte(reader.read_u16()?)),

        PROPERTY_KEY_MESSAGE_EXPIRY_INTERVAL
        | PROPERTY_KEY_SESSION_EXPIRY_INTERVAL
        | PROPERTY_KEY_WILL_DELAY_INTERVAL
        | PROPERTY_KEY_MAXIMUM_PACKET_SIZE => Ok(PropertyValue::FourByte(reader.read_u32()?)),

        PROPERTY_KEY_SUBSCRIPTION_IDENTIFIER => Ok(PropertyValue::VarInt(reader.read_vli()?)),

        PROPERTY_KEY_CONTENT_TYPE
        | PROPERTY_KEY_RESPONSE_TOPIC
        | PROPERTY_KEY_ASSIGNED_CLIENT_IDENTIFIER
        | PROPERTY_KEY_AUTHENTICATION_METHOD
        | PROPERTY_KEY_RESPONSE_INFORMATION
        | PROPERTY_KEY_SERVER_REFERENCE
        | PROPERTY_KEY_REASON_STRING => Ok(PropertyValue::Utf8(reader.read_string()?)),

        PROPERTY_KEY_CORRELATION_DATA
        | PROPERTY_KEY_AUTHENTICATION_DATA => Ok(PropertyValue::Binary(reader.read_binary()?)),

        PROPERTY_KEY_USER_PROPERTY => {
            let name = reader.read_string()?;
            let value = reader.read_string()?;
            Ok(PropertyValue::Pair(name, value))
        }

        _ => {
            error!("Packet Decode - unrecognized property id ({})", id);
            Err(MqttError::UnknownIdentifier)
        }
    }
}

/// Decodes a property section: reads the property-length vli, bounds a reader
/// to it, and hands each `(id, value)` pair to the per-packet sink.  The sink
/// rejects ids that are not legal in its packet context.
pub(crate) fn decode_properties<'a, F>(reader: &mut Reader<'a>, context: &str, mut sink: F) -> MqttResult<()>
where
    F: FnMut(u8, PropertyValue) -> MqttResult<()>,
{
    let property_length = reader.read_vli()? as usize;
    let mut properties = reader.sub_reader(property_length).map_err(|_| {
        error!("{} - property length larger than remaining packet length", context);
        MqttError::MalformedPacket
    })?;

    while !properties.is_empty() {
        let property_key = properties.read_u8()?;
        let value = decode_property_value(property_key, &mut properties)?;
        sink(property_key, value).map_err(|err| {
            error!("{} - invalid property type ({})", context, property_key);
            err
        })?;
    }

    Ok(())
}

pub(crate) fn collect_user_property(
    properties: &mut Option<Vec<UserProperty>>,
    name: String,
    value: String,
) {
    properties
        .get_or_insert_with(Vec::new)
        .push(UserProperty { name, value });
}

/*****************************************************/

macro_rules! define_ack_packet_decode_function {
    ($function_name: ident, $first_byte: expr, $context: expr) => {
        pub(crate) fn $function_name(
            first_byte: u8,
            reader: &mut crate::decode::Reader,
        ) -> crate::error::MqttResult<crate::mqtt::AckPacket> {
            crate::mqtt::read_ack_packet(first_byte, $first_byte, $context, reader)
        }
    };
}

pub(crate) use define_ack_packet_decode_function;

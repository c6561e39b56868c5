/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::Reader;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::utils::PINGRESP_FIRST_BYTE;

use log::error;

pub(crate) fn decode_pingresp(first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
    if first_byte != PINGRESP_FIRST_BYTE || !reader.is_empty() {
        error!("decode_pingresp - invalid first byte or non-empty body");
        return Err(MqttError::MalformedPacket);
    }

    Ok(())
}

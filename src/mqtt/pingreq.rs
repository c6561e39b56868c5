/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::encode::EncodeCursor;
use crate::error::MqttResult;
use crate::mqtt::utils::PINGREQ_FIRST_BYTE;

pub(crate) fn write_pingreq(cursor: &mut EncodeCursor) -> MqttResult<()> {
    cursor.put_u8(PINGREQ_FIRST_BYTE);
    cursor.put_vli(0)
}

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::define_ack_packet_decode_function;
use crate::encode::define_ack_packet_write_function;
use crate::mqtt::utils::PUBACK_FIRST_BYTE;

define_ack_packet_write_function!(write_puback, PUBACK_FIRST_BYTE);
define_ack_packet_decode_function!(decode_puback, PUBACK_FIRST_BYTE, "decode_puback");

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::define_ack_packet_decode_function;
use crate::encode::define_ack_packet_write_function;
use crate::mqtt::utils::PUBREC_FIRST_BYTE;

define_ack_packet_write_function!(write_pubrec, PUBREC_FIRST_BYTE);
define_ack_packet_decode_function!(decode_pubrec, PUBREC_FIRST_BYTE, "decode_pubrec");

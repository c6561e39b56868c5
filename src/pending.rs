/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Fixed-capacity table of in-flight packet ids and the response packet type each one awaits.
 */

use crate::config::RECEIVE_MAXIMUM;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::PacketType;

#[derive(Clone, Copy, Debug, Default)]
struct PendingSlot {
    // zero marks the slot free
    packet_id: u16,
    awaited: PacketType,
}

/// Table of outstanding packet ids.  Holds exactly `RECEIVE_MAXIMUM` slots; every operation
/// is a linear scan.  Invariants: at most one live entry per packet id, and packet id zero is
/// never assigned to a live flow.
pub(crate) struct PendingTable {
    slots: [PendingSlot; RECEIVE_MAXIMUM],

    // last minted id; wraps 65535 -> 1, skipping zero
    packet_id_counter: u16,
}

impl PendingTable {
    pub(crate) fn new() -> PendingTable {
        PendingTable {
            slots: [PendingSlot::default(); RECEIVE_MAXIMUM],
            packet_id_counter: 0,
        }
    }

    /// Mints a fresh packet id for an outbound request and stores the response type the
    /// broker must answer with.
    pub(crate) fn reserve_for_outbound(&mut self, awaited: PacketType) -> MqttResult<u16> {
        for slot in self.slots.iter_mut() {
            if slot.packet_id == 0 {
                self.packet_id_counter = self.packet_id_counter.wrapping_add(1);
                if self.packet_id_counter == 0 {
                    self.packet_id_counter = 1;
                }
                slot.packet_id = self.packet_id_counter;
                slot.awaited = awaited;
                return Ok(slot.packet_id);
            }
        }

        Err(MqttError::OutOfResource)
    }

    /// Tracks an inbound request (a QoS 2 publish) whose follow-up the broker will send
    /// under the same packet id.
    pub(crate) fn reserve_for_inbound(&mut self, packet_id: u16, awaited: PacketType) -> MqttResult<()> {
        if packet_id == 0 {
            return Err(MqttError::InvalidPacketId);
        }

        for slot in self.slots.iter_mut() {
            if slot.packet_id == 0 {
                slot.packet_id = packet_id;
                slot.awaited = awaited;
                return Ok(());
            }
        }

        Err(MqttError::OutOfResource)
    }

    /// Rewrites the awaited response type of a live flow.  No-op when the id is absent.
    pub(crate) fn advance(&mut self, packet_id: u16, awaited: PacketType) {
        for slot in self.slots.iter_mut() {
            if slot.packet_id == packet_id {
                slot.awaited = awaited;
                return;
            }
        }
    }

    pub(crate) fn release(&mut self, packet_id: u16) -> MqttResult<()> {
        for slot in self.slots.iter_mut() {
            if slot.packet_id == packet_id {
                slot.packet_id = 0;
                slot.awaited = PacketType::Unknown;
                return Ok(());
            }
        }

        Err(MqttError::InvalidPacketId)
    }

    /// Response type the given id is waiting on, `Unknown` if the id has no live flow.
    pub(crate) fn expected_for(&self, packet_id: u16) -> PacketType {
        for slot in self.slots.iter() {
            if slot.packet_id == packet_id {
                return slot.awaited;
            }
        }

        PacketType::Unknown
    }

    /// Whether any live flow still awaits the given response type.
    pub(crate) fn any_awaits(&self, awaited: PacketType) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.packet_id != 0 && slot.awaited == awaited)
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.packet_id != 0).count()
    }

    /// Drops every flow.  In-flight QoS state does not survive a disconnect.
    pub(crate) fn clear(&mut self) {
        self.slots = [PendingSlot::default(); RECEIVE_MAXIMUM];
    }

    #[cfg(test)]
    pub(crate) fn seed_packet_id_counter(&mut self, value: u16) {
        self.packet_id_counter = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn outbound_reservation_mints_sequential_ids() {
        let mut table = PendingTable::new();
        assert_eq!(1, table.reserve_for_outbound(PacketType::Puback).unwrap());
        assert_eq!(2, table.reserve_for_outbound(PacketType::Pubrec).unwrap());
        assert_eq!(PacketType::Puback, table.expected_for(1));
        assert_eq!(PacketType::Pubrec, table.expected_for(2));
        assert_eq!(2, table.live_count());
    }

    #[test]
    fn packet_id_counter_wraps_past_zero() {
        let mut table = PendingTable::new();
        table.seed_packet_id_counter(65535);
        assert_eq!(1, table.reserve_for_outbound(PacketType::Puback).unwrap());
    }

    #[test]
    fn table_exhaustion_reports_out_of_resource() {
        let mut table = PendingTable::new();
        for _ in 0..RECEIVE_MAXIMUM {
            table.reserve_for_outbound(PacketType::Puback).unwrap();
        }
        assert_matches!(
            table.reserve_for_outbound(PacketType::Puback),
            Err(MqttError::OutOfResource)
        );

        // releasing one slot makes room again
        table.release(1).unwrap();
        assert!(table.reserve_for_outbound(PacketType::Suback).is_ok());
    }

    #[test]
    fn inbound_reservation_rejects_zero_id() {
        let mut table = PendingTable::new();
        assert_matches!(
            table.reserve_for_inbound(0, PacketType::Pubrel),
            Err(MqttError::InvalidPacketId)
        );
    }

    #[test]
    fn no_two_live_entries_share_an_id() {
        let mut table = PendingTable::new();
        let first = table.reserve_for_outbound(PacketType::Puback).unwrap();
        table.reserve_for_inbound(500, PacketType::Pubrel).unwrap();

        let live_ids: Vec<u16> = (0..RECEIVE_MAXIMUM as u16 + 600)
            .filter(|id| table.expected_for(*id) != PacketType::Unknown)
            .collect();
        assert_eq!(vec![first, 500], live_ids);
    }

    #[test]
    fn advance_rewrites_awaited_type() {
        let mut table = PendingTable::new();
        let id = table.reserve_for_outbound(PacketType::Pubrec).unwrap();
        table.advance(id, PacketType::Pubcomp);
        assert_eq!(PacketType::Pubcomp, table.expected_for(id));

        // advancing an absent id does nothing
        table.advance(4242, PacketType::Puback);
        assert_eq!(PacketType::Unknown, table.expected_for(4242));
    }

    #[test]
    fn release_unknown_id_fails() {
        let mut table = PendingTable::new();
        assert_matches!(table.release(3), Err(MqttError::InvalidPacketId));
    }

    #[test]
    fn full_qos2_round_trip_restores_size() {
        let mut table = PendingTable::new();
        let before = table.live_count();

        let id = table.reserve_for_outbound(PacketType::Pubrec).unwrap();
        table.advance(id, PacketType::Pubcomp);
        assert!(table.any_awaits(PacketType::Pubcomp));
        table.release(id).unwrap();

        assert_eq!(before, table.live_count());
        assert!(!table.any_awaits(PacketType::Pubcomp));
    }

    #[test]
    fn clear_zeroes_every_slot() {
        let mut table = PendingTable::new();
        table.reserve_for_outbound(PacketType::Puback).unwrap();
        table.reserve_for_inbound(9, PacketType::Pubrel).unwrap();
        table.clear();
        assert_eq!(0, table.live_count());
        assert!(!table.any_awaits(PacketType::Puback));
        assert!(!table.any_awaits(PacketType::Pubrel));
    }
}

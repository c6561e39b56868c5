/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing the client protocol engine: connection lifecycle, request/response
correlation and the QoS 1 / QoS 2 acknowledgement flows.
 */

use crate::alias::{NullOutboundAliasResolver, OutboundAliasResolution, OutboundAliasResolver};
use crate::config::{ClientConfig, ConnectOptions, SubscribeOptions, RECEIVE_MAXIMUM};
use crate::decode::Reader;
use crate::encode::{measure, EncodeCursor};
use crate::error::{MqttError, MqttResult};
use crate::events::{ClientEventSink, NullEventSink};
use crate::mqtt::connack::decode_connack;
use crate::mqtt::connect::write_connect;
use crate::mqtt::disconnect::{decode_disconnect, write_disconnect};
use crate::mqtt::pingreq::write_pingreq;
use crate::mqtt::pingresp::decode_pingresp;
use crate::mqtt::puback::{decode_puback, write_puback};
use crate::mqtt::pubcomp::{decode_pubcomp, write_pubcomp};
use crate::mqtt::publish::{decode_publish, write_publish};
use crate::mqtt::pubrec::{decode_pubrec, write_pubrec};
use crate::mqtt::pubrel::{decode_pubrel, write_pubrel};
use crate::mqtt::suback::decode_suback;
use crate::mqtt::subscribe::write_subscribe;
use crate::mqtt::unsuback::decode_unsuback;
use crate::mqtt::unsubscribe::write_unsubscribe;
use crate::mqtt::*;
use crate::pending::PendingTable;
use crate::transport::{NetworkAdapter, RecvOutcome};

use log::{debug, error, info};

/// Connection lifecycle as observable from outside the client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStatus {
    /// No connection exists or a previous one has been torn down.
    Disconnected,

    /// CONNECT is sent or parked; CONNACK has not arrived yet.
    Connecting,

    /// A successful CONNACK established the session.
    Connected,
}

// A parked buffer inside Connecting carries the encoded CONNECT of a transport that was
// still establishing when open_conn returned; connection_ready flushes it.
enum ConnectionState {
    Disconnected,
    Connecting { pending_connect: Option<Vec<u8>> },
    Connected,
}

/// A single-connection MQTT5 client protocol engine.
///
/// The client is owned by exactly one caller at a time; there is no interior locking.  All
/// packet processing happens inside [`process_packet`](MqttClient::process_packet) (or
/// [`poll`](MqttClient::poll), which wraps it), and notifications fire synchronously from
/// there through the configured [`ClientEventSink`].
pub struct MqttClient<N: NetworkAdapter, S: ClientEventSink = NullEventSink> {
    net: N,
    sink: S,
    config: ClientConfig,
    broker_address: String,
    connect_options: Option<ConnectOptions>,
    state: ConnectionState,
    expected_ptypes: PacketTypeMask,
    settings: NegotiatedSettings,
    pending: PendingTable,
    alias_resolver: Box<dyn OutboundAliasResolver>,
}

impl<N: NetworkAdapter> MqttClient<N, NullEventSink> {
    /// Creates a client that discards all notifications.
    pub fn new(broker_address: &str, net: N) -> MqttClient<N, NullEventSink> {
        MqttClient::with_sink(broker_address, net, NullEventSink::default())
    }
}

impl<N: NetworkAdapter, S: ClientEventSink> MqttClient<N, S> {
    /// Creates a client that fires notifications into the given sink.
    pub fn with_sink(broker_address: &str, net: N, sink: S) -> MqttClient<N, S> {
        MqttClient {
            net,
            sink,
            config: ClientConfig::default(),
            broker_address: broker_address.to_string(),
            connect_options: None,
            state: ConnectionState::Disconnected,
            expected_ptypes: PacketTypeMask::initial(),
            settings: NegotiatedSettings::default(),
            pending: PendingTable::new(),
            alias_resolver: Box::new(NullOutboundAliasResolver::new()),
        }
    }

    /// Replaces the engine configuration.  Only sensible before the first connect.
    pub fn with_config(mut self, config: ClientConfig) -> MqttClient<N, S> {
        self.config = config;
        self
    }

    /// Installs an outbound topic alias resolution strategy.
    pub fn set_outbound_alias_resolver(&mut self, resolver: Box<dyn OutboundAliasResolver>) {
        self.alias_resolver = resolver;
    }

    /// Current lifecycle state.
    pub fn connection_status(&self) -> ConnectionStatus {
        match &self.state {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting { .. } => ConnectionStatus::Connecting,
            ConnectionState::Connected => ConnectionStatus::Connected,
        }
    }

    /// Whether a successful CONNACK has established the session.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected)
    }

    /// Limits and capabilities the broker advertised on the last CONNACK.
    pub fn negotiated_settings(&self) -> &NegotiatedSettings {
        &self.settings
    }

    /// Borrows the notification sink.
    pub fn event_sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrows the notification sink.
    pub fn event_sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Opens the transport and sends a CONNECT packet.
    ///
    /// If the transport connects asynchronously, the encoded CONNECT is parked until the
    /// transport signals completion and the owner calls
    /// [`connection_ready`](MqttClient::connection_ready).
    pub fn connect(&mut self, options: ConnectOptions) -> MqttResult<()> {
        if !matches!(self.state, ConnectionState::Disconnected) {
            return Err(MqttError::InvalidArgument);
        }

        let mut options = options;
        if options.receive_maximum.is_none() {
            options.receive_maximum = Some(RECEIVE_MAXIMUM as u16);
        }

        let total_size = measure(|cursor| write_connect(cursor, &options))?;
        let mut buffer = self.net.alloc_send_buf(total_size)?;
        let write_result = {
            let mut cursor = EncodeCursor::write(&mut buffer);
            write_connect(&mut cursor, &options)
        };
        if let Err(err) = write_result {
            self.net.free_send_buf(buffer);
            return Err(err);
        }

        debug!("connect - {}", options);
        self.connect_options = Some(options);

        if let Err(err) = self.net.open_conn(&self.broker_address) {
            self.net.free_send_buf(buffer);
            return Err(err);
        }

        if !self.net.connected() {
            debug!("connect - transport still establishing, parking the CONNECT packet");
            self.state = ConnectionState::Connecting { pending_connect: Some(buffer) };
            return Ok(());
        }

        let send_result = self.net.send(&buffer).map(|_| ());
        self.net.free_send_buf(buffer);
        match send_result {
            Ok(()) => {
                self.state = ConnectionState::Connecting { pending_connect: None };
                self.expected_ptypes.insert(PacketType::Connack);
                info!("connect - CONNECT sent to {}", self.broker_address);
                Ok(())
            }
            Err(err) => {
                let _ = self.net.close_conn();
                self.state = ConnectionState::Disconnected;
                Err(err)
            }
        }
    }

    /// Completes a deferred connect: sends the parked CONNECT packet after the transport
    /// signalled that its connection attempt finished.  No-op when nothing is parked.
    pub fn connection_ready(&mut self) -> MqttResult<()> {
        let parked = match &mut self.state {
            ConnectionState::Connecting { pending_connect } => pending_connect.take(),
            _ => None,
        };

        let Some(buffer) = parked else {
            return Ok(());
        };

        let send_result = self.net.send(&buffer).map(|_| ());
        self.net.free_send_buf(buffer);
        match send_result {
            Ok(()) => {
                self.expected_ptypes.insert(PacketType::Connack);
                info!("connection_ready - deferred CONNECT sent to {}", self.broker_address);
                Ok(())
            }
            Err(err) => {
                let _ = self.net.close_conn();
                self.drop_connection();
                Err(err)
            }
        }
    }

    /// Publishes a message.  For QoS above zero a packet id is reserved and stamped onto the
    /// message before the packet is built.
    pub fn publish(&mut self, message: &mut PublishMessage) -> MqttResult<()> {
        self.ensure_connected()?;

        if (message.qos as u8) > self.settings.maximum_qos {
            return Err(MqttError::QosNotSupported);
        }
        if message.retain && !self.settings.retain_available {
            return Err(MqttError::RetainNotSupported);
        }
        if message.topic.is_empty() || message.topic.contains(['+', '#']) {
            return Err(MqttError::InvalidTopic);
        }

        if message.qos != QualityOfService::AtMostOnce {
            let awaited = if message.qos == QualityOfService::ExactlyOnce {
                PacketType::Pubrec
            } else {
                PacketType::Puback
            };
            message.packet_id = self.pending.reserve_for_outbound(awaited)?;
        }

        let resolution = if self.settings.topic_alias_maximum > 0 {
            self.alias_resolver
                .resolve_and_apply_topic_alias(message.topic_alias, &message.topic)
        } else {
            OutboundAliasResolution::default()
        };

        debug!("publish - {}", message);
        let message_ref: &PublishMessage = message;
        self.send_packet(|cursor| write_publish(cursor, message_ref, &resolution))?;

        match message.qos {
            QualityOfService::AtLeastOnce => self.expected_ptypes.insert(PacketType::Puback),
            QualityOfService::ExactlyOnce => self.expected_ptypes.insert(PacketType::Pubrec),
            QualityOfService::AtMostOnce => {}
        }

        Ok(())
    }

    /// Subscribes to one or more topic filters.  Returns the packet id correlating the
    /// SUBACK notifications.
    pub fn subscribe(&mut self, subscriptions: &[Subscription]) -> MqttResult<u16> {
        self.subscribe_with_options(subscriptions, &SubscribeOptions::default())
    }

    /// Subscribes with additional packet-level options.
    pub fn subscribe_with_options(
        &mut self,
        subscriptions: &[Subscription],
        options: &SubscribeOptions,
    ) -> MqttResult<u16> {
        if subscriptions.is_empty() {
            return Err(MqttError::InvalidArgument);
        }
        self.ensure_connected()?;

        for subscription in subscriptions {
            if subscription.topic_filter.is_empty() {
                return Err(MqttError::InvalidTopic);
            }
            if (subscription.qos as u8) > self.settings.maximum_qos {
                return Err(MqttError::QosNotSupported);
            }
            if subscription.topic_filter.contains(['+', '#'])
                && !self.settings.wildcard_subscriptions_available
            {
                return Err(MqttError::Unsupported);
            }
            if subscription.topic_filter.starts_with("$share/")
                && !self.settings.shared_subscriptions_available
            {
                return Err(MqttError::Unsupported);
            }
        }

        if options.subscription_identifier.is_some()
            && !self.settings.subscription_identifiers_available
        {
            return Err(MqttError::Unsupported);
        }

        let packet_id = self.pending.reserve_for_outbound(PacketType::Suback)?;

        debug!("subscribe - packet id {}, {} entries", packet_id, subscriptions.len());
        self.send_packet(|cursor| write_subscribe(cursor, packet_id, subscriptions, options))?;

        self.expected_ptypes.insert(PacketType::Suback);
        Ok(packet_id)
    }

    /// Unsubscribes from one or more topic filters.  Returns the packet id correlating the
    /// UNSUBACK notification.
    pub fn unsubscribe(&mut self, topic_filters: &[&str]) -> MqttResult<u16> {
        if topic_filters.is_empty() {
            return Err(MqttError::InvalidArgument);
        }
        self.ensure_connected()?;

        for topic_filter in topic_filters {
            if topic_filter.is_empty() {
                return Err(MqttError::InvalidTopic);
            }
        }

        let packet_id = self.pending.reserve_for_outbound(PacketType::Unsuback)?;

        debug!("unsubscribe - packet id {}, {} filters", packet_id, topic_filters.len());
        self.send_packet(|cursor| write_unsubscribe(cursor, packet_id, topic_filters, None))?;

        self.expected_ptypes.insert(PacketType::Unsuback);
        Ok(packet_id)
    }

    /// Sends a PINGREQ to keep the connection alive.
    pub fn ping(&mut self) -> MqttResult<()> {
        self.ensure_connected()?;

        self.send_packet(|cursor| write_pingreq(cursor))?;
        self.expected_ptypes.insert(PacketType::Pingresp);
        Ok(())
    }

    /// Sends a DISCONNECT with the given reason code and closes the transport.
    pub fn disconnect(&mut self, reason_code: u8) -> MqttResult<()> {
        self.disconnect_with_packet(&DisconnectPacket {
            reason_code,
            ..Default::default()
        })
    }

    /// Sends a fully specified DISCONNECT packet and closes the transport.
    pub fn disconnect_with_packet(&mut self, packet: &DisconnectPacket) -> MqttResult<()> {
        self.ensure_connected()?;

        debug!("disconnect - {}", packet);
        self.send_packet(|cursor| write_disconnect(cursor, packet))?;

        info!("disconnect - connection shut down with reason code {}", packet.reason_code);
        self.drop_connection();
        self.net.close_conn()
    }

    /// Parses and processes one complete inbound packet.
    ///
    /// The buffer must hold exactly one packet; its total size must match the remaining
    /// length declared in the fixed header.  Transports that receive data through callbacks
    /// call this directly; polling transports go through [`poll`](MqttClient::poll).
    pub fn process_packet(&mut self, data: &[u8]) -> MqttResult<()> {
        let mut reader = Reader::new(data);

        let first_byte = reader.read_u8()?;
        let packet_type = PacketType::from_u8(first_byte >> 4);
        let remaining_length = reader.read_vli()? as usize;

        if remaining_length != reader.remaining() {
            error!(
                "process_packet - remaining length {} does not match supplied {} bytes",
                remaining_length,
                reader.remaining()
            );
            return Err(MqttError::InvalidPacketSize);
        }

        if !self.expected_ptypes.contains(packet_type) {
            error!("process_packet - unexpected {} packet", packet_type);
            return Err(MqttError::UnexpectedPacketType);
        }

        debug!("process_packet - processing {} packet", packet_type);
        match packet_type {
            PacketType::Connack => self.process_connack(first_byte, &mut reader),
            PacketType::Publish => self.process_publish(first_byte, &mut reader),
            PacketType::Puback => self.process_puback(first_byte, &mut reader),
            PacketType::Pubrec => self.process_pubrec(first_byte, &mut reader),
            PacketType::Pubrel => self.process_pubrel(first_byte, &mut reader),
            PacketType::Pubcomp => self.process_pubcomp(first_byte, &mut reader),
            PacketType::Suback => self.process_suback(first_byte, &mut reader),
            PacketType::Unsuback => self.process_unsuback(first_byte, &mut reader),
            PacketType::Disconnect => self.process_disconnect(first_byte, &mut reader),
            PacketType::Pingreq => self.ping(),
            PacketType::Pingresp => self.process_pingresp(first_byte, &mut reader),
            _ => Ok(()),
        }
    }

    /// Polls the transport for one inbound packet and processes it.  Returns true when a
    /// packet was processed, false when nothing was ready.
    pub fn poll(&mut self) -> MqttResult<bool> {
        let buffer_size = std::cmp::max(
            self.settings.maximum_packet_size as usize,
            self.config.recv_buffer_minimum,
        );

        let mut buffer = self.net.alloc_recv_buf(buffer_size)?;
        let outcome = match self.net.recv(&mut buffer) {
            Ok(RecvOutcome::Data(count)) => self.process_packet(&buffer[..count]).map(|_| true),
            Ok(RecvOutcome::Idle) => Ok(false),
            Err(err) => Err(err),
        };
        self.net.free_recv_buf(buffer);

        outcome
    }

    /*****************************************************/

    fn ensure_connected(&self) -> MqttResult<()> {
        match &self.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Connecting { pending_connect: Some(_) } => Err(MqttError::Pending),
            ConnectionState::Connecting { .. } => Err(MqttError::NotConnected),
            ConnectionState::Disconnected => Err(MqttError::NotConnected),
        }
    }

    // Two-pass build into a transport buffer; the buffer is returned to the transport on
    // every exit path.
    fn send_packet<F>(&mut self, writer: F) -> MqttResult<()>
    where
        F: Fn(&mut EncodeCursor) -> MqttResult<()>,
    {
        let total_size = measure(&writer)?;
        let mut buffer = self.net.alloc_send_buf(total_size)?;

        let write_result = {
            let mut cursor = EncodeCursor::write(&mut buffer);
            writer(&mut cursor)
        };

        let send_result = match write_result {
            Ok(()) => self.net.send(&buffer).map(|_| ()),
            Err(err) => Err(err),
        };

        self.net.free_send_buf(buffer);
        send_result
    }

    fn drop_connection(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.expected_ptypes = PacketTypeMask::initial();
        self.pending.clear();
    }

    fn forward_user_properties(&mut self, origin: PacketType, properties: Option<&[UserProperty]>) {
        if let Some(properties) = properties {
            for property in properties {
                self.sink.user_property(origin, &property.name, &property.value);
            }
        }
    }

    fn build_negotiated_settings(&self, packet: &ConnackPacket) -> NegotiatedSettings {
        let options = self.connect_options.as_ref();
        let proposed_keep_alive = options.map(|o| o.keep_alive_interval_seconds).unwrap_or(0);
        let proposed_maximum_packet_size =
            options.and_then(|o| o.maximum_packet_size_bytes).unwrap_or(0);
        let proposed_session_expiry =
            options.and_then(|o| o.session_expiry_interval_seconds).unwrap_or(0);

        NegotiatedSettings {
            session_present: packet.session_present,
            maximum_qos: packet.maximum_qos.unwrap_or(2),
            retain_available: packet.retain_available.unwrap_or(true),
            wildcard_subscriptions_available: packet.wildcard_subscriptions_available.unwrap_or(true),
            shared_subscriptions_available: packet.shared_subscriptions_available.unwrap_or(true),
            subscription_identifiers_available: packet
                .subscription_identifiers_available
                .unwrap_or(true),
            server_keep_alive: packet.server_keep_alive.unwrap_or(proposed_keep_alive),
            maximum_packet_size: packet.maximum_packet_size.unwrap_or(proposed_maximum_packet_size),
            topic_alias_maximum: packet.topic_alias_maximum.unwrap_or(0),
            receive_maximum: packet.receive_maximum.unwrap_or(65535),
            session_expiry_interval: packet.session_expiry_interval.unwrap_or(proposed_session_expiry),
            assigned_client_identifier: packet.assigned_client_identifier.clone(),
            response_information: packet.response_information.clone(),
            server_reference: packet.server_reference.clone(),
            reason_string: packet.reason_string.clone(),
        }
    }

    fn process_connack(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let packet = decode_connack(first_byte, reader)?;

        if packet.reason_code >= 0x80 {
            error!(
                "process_connack - server declined the connection with reason code {}",
                packet.reason_code
            );
            self.drop_connection();
            return Err(MqttError::ServerDeclined(packet.reason_code));
        }

        self.settings = self.build_negotiated_settings(&packet);
        self.state = ConnectionState::Connected;
        self.expected_ptypes.insert(PacketType::Publish);
        self.expected_ptypes.insert(PacketType::Disconnect);
        self.alias_resolver
            .reset_for_new_connection(self.settings.topic_alias_maximum);

        info!("process_connack - connected, {}", self.settings);

        self.forward_user_properties(PacketType::Connack, packet.user_properties.as_deref());
        self.sink.connected(&self.settings);
        Ok(())
    }

    fn process_publish(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let publish = decode_publish(first_byte, reader)?;

        match publish.qos {
            QualityOfService::AtMostOnce => {}
            QualityOfService::AtLeastOnce => {
                self.send_puback(publish.packet_id)?;
            }
            QualityOfService::ExactlyOnce => {
                self.pending
                    .reserve_for_inbound(publish.packet_id, PacketType::Pubrel)?;
                self.send_pubrec(publish.packet_id)?;
                self.expected_ptypes.insert(PacketType::Pubrel);
            }
        }

        self.forward_user_properties(PacketType::Publish, publish.user_properties.as_deref());
        self.sink.publish_received(&publish);
        Ok(())
    }

    fn process_puback(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let ack = decode_puback(first_byte, reader)?;

        if self.pending.expected_for(ack.packet_id) != PacketType::Puback {
            error!("process_puback - packet id {} does not await a PUBACK", ack.packet_id);
            return Err(MqttError::UnexpectedPacketType);
        }

        self.pending.release(ack.packet_id)?;
        if !self.pending.any_awaits(PacketType::Puback) {
            self.expected_ptypes.remove(PacketType::Puback);
        }

        self.forward_user_properties(PacketType::Puback, ack.user_properties.as_deref());
        self.sink.publish_acknowledged(ack.packet_id, ack.reason_code);
        Ok(())
    }

    fn process_pubrec(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let ack = decode_pubrec(first_byte, reader)?;

        if self.pending.expected_for(ack.packet_id) != PacketType::Pubrec {
            error!("process_pubrec - packet id {} does not await a PUBREC", ack.packet_id);
            return Err(MqttError::UnexpectedPacketType);
        }

        self.pending.advance(ack.packet_id, PacketType::Pubcomp);
        if !self.pending.any_awaits(PacketType::Pubrec) {
            self.expected_ptypes.remove(PacketType::Pubrec);
        }
        self.expected_ptypes.insert(PacketType::Pubcomp);

        self.send_pubrel(ack.packet_id)?;

        self.forward_user_properties(PacketType::Pubrec, ack.user_properties.as_deref());
        Ok(())
    }

    fn process_pubrel(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let ack = decode_pubrel(first_byte, reader)?;

        if self.pending.expected_for(ack.packet_id) != PacketType::Pubrel {
            error!("process_pubrel - packet id {} does not await a PUBREL", ack.packet_id);
            return Err(MqttError::UnexpectedPacketType);
        }

        self.pending.release(ack.packet_id)?;
        if !self.pending.any_awaits(PacketType::Pubrel) {
            self.expected_ptypes.remove(PacketType::Pubrel);
        }

        self.send_pubcomp(ack.packet_id)?;

        self.forward_user_properties(PacketType::Pubrel, ack.user_properties.as_deref());
        Ok(())
    }

    fn process_pubcomp(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let ack = decode_pubcomp(first_byte, reader)?;

        if self.pending.expected_for(ack.packet_id) != PacketType::Pubcomp {
            error!("process_pubcomp - packet id {} does not await a PUBCOMP", ack.packet_id);
            return Err(MqttError::UnexpectedPacketType);
        }

        self.pending.release(ack.packet_id)?;
        if !self.pending.any_awaits(PacketType::Pubcomp) {
            self.expected_ptypes.remove(PacketType::Pubcomp);
        }

        self.forward_user_properties(PacketType::Pubcomp, ack.user_properties.as_deref());
        self.sink.publish_completed(ack.packet_id, ack.reason_code);
        Ok(())
    }

    fn process_suback(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let packet = decode_suback(first_byte, reader)?;

        if self.pending.expected_for(packet.packet_id) != PacketType::Suback {
            error!("process_suback - packet id {} does not await a SUBACK", packet.packet_id);
            return Err(MqttError::UnexpectedPacketType);
        }

        self.forward_user_properties(PacketType::Suback, packet.user_properties.as_deref());

        for (index, code) in packet.reason_codes.iter().enumerate() {
            if *code <= reason_code::GRANTED_QOS_2 {
                let granted_qos =
                    QualityOfService::try_from(*code).unwrap_or(QualityOfService::AtMostOnce);
                self.sink.subscription_granted(packet.packet_id, index, granted_qos);
            } else {
                self.sink.subscription_declined(packet.packet_id, index, *code);
            }
        }

        self.pending.release(packet.packet_id)?;
        if !self.pending.any_awaits(PacketType::Suback) {
            self.expected_ptypes.remove(PacketType::Suback);
        }

        Ok(())
    }

    fn process_unsuback(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let packet = decode_unsuback(first_byte, reader)?;

        if self.pending.expected_for(packet.packet_id) != PacketType::Unsuback {
            error!("process_unsuback - packet id {} does not await an UNSUBACK", packet.packet_id);
            return Err(MqttError::UnexpectedPacketType);
        }

        self.pending.release(packet.packet_id)?;
        if !self.pending.any_awaits(PacketType::Unsuback) {
            self.expected_ptypes.remove(PacketType::Unsuback);
        }

        self.forward_user_properties(PacketType::Unsuback, packet.user_properties.as_deref());
        self.sink
            .unsubscribe_completed(packet.packet_id, &packet.reason_codes);
        Ok(())
    }

    fn process_disconnect(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        let packet = decode_disconnect(first_byte, reader)?;

        info!(
            "process_disconnect - broker closed the session with reason code {}",
            packet.reason_code
        );

        self.drop_connection();
        let _ = self.net.close_conn();

        self.forward_user_properties(PacketType::Disconnect, packet.user_properties.as_deref());
        self.sink.received_disconnect(&packet);
        Ok(())
    }

    fn process_pingresp(&mut self, first_byte: u8, reader: &mut Reader) -> MqttResult<()> {
        decode_pingresp(first_byte, reader)?;
        self.sink.ping_received();
        Ok(())
    }

    fn send_puback(&mut self, packet_id: u16) -> MqttResult<()> {
        let packet = AckPacket::new(packet_id, reason_code::SUCCESS);
        self.send_packet(|cursor| write_puback(cursor, &packet))
    }

    fn send_pubrec(&mut self, packet_id: u16) -> MqttResult<()> {
        let packet = AckPacket::new(packet_id, reason_code::SUCCESS);
        self.send_packet(|cursor| write_pubrec(cursor, &packet))
    }

    fn send_pubrel(&mut self, packet_id: u16) -> MqttResult<()> {
        let packet = AckPacket::new(packet_id, reason_code::SUCCESS);
        self.send_packet(|cursor| write_pubrel(cursor, &packet))
    }

    fn send_pubcomp(&mut self, packet_id: u16) -> MqttResult<()> {
        let packet = AckPacket::new(packet_id, reason_code::SUCCESS);
        self.send_packet(|cursor| write_pubcomp(cursor, &packet))
    }
}

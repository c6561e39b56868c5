/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing client configuration types and engine constants.
 */

use crate::mqtt::{PayloadFormatIndicator, QualityOfService, UserProperty};

use std::time::Duration;

/// Capacity of the pending-operation table, and the receive maximum advertised to the broker.
pub const RECEIVE_MAXIMUM: usize = 32;

/// Upper bound on the correlation data accepted on an inbound publish.  Larger values are
/// dropped whole, not truncated.
pub const CORRELATION_DATA_MAXIMUM: usize = 256;

/// Default MQTT broker TCP port.
pub const MQTT_PORT: u16 = 1883;

/// Default transport poll wait.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

const DEFAULT_KEEP_ALIVE_SECONDS: u16 = 60;
const DEFAULT_RECV_BUFFER_MINIMUM: usize = 4096;

/// A message the broker publishes on the client's behalf if the client disconnects
/// ungracefully.
#[derive(Clone, Debug, Default)]
pub struct WillMessage {
    /// Topic the will is published to.
    pub topic: String,

    /// Will payload bytes.
    pub payload: Vec<u8>,

    /// Quality of service the broker should use for the will.
    pub qos: QualityOfService,

    /// If true, the will is retained.
    pub retain: bool,

    /// Seconds the broker waits for a session resumption before publishing the will.
    pub delay_interval: Option<u32>,

    /// Declares whether the will payload is binary data or a utf-8 string.
    pub payload_format_indicator: Option<PayloadFormatIndicator>,

    /// Seconds after which an undelivered will copy is discarded.
    pub message_expiry_interval: Option<u32>,

    /// MIME-style description of the will payload.
    pub content_type: Option<String>,

    /// Topic a responder should reply on.
    pub response_topic: Option<String>,

    /// Opaque binary request correlation data.
    pub correlation_data: Option<Vec<u8>>,
}

/// Configuration for the MQTT connect operation.  Construct with
/// [`ConnectOptionsBuilder`].
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub(crate) keep_alive_interval_seconds: u16,
    pub(crate) clean_start: bool,
    pub(crate) client_id: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<Vec<u8>>,
    pub(crate) session_expiry_interval_seconds: Option<u32>,
    pub(crate) receive_maximum: Option<u16>,
    pub(crate) maximum_packet_size_bytes: Option<u32>,
    pub(crate) topic_alias_maximum: Option<u16>,
    pub(crate) request_response_information: Option<bool>,
    pub(crate) request_problem_information: Option<bool>,
    pub(crate) authentication_method: Option<String>,
    pub(crate) authentication_data: Option<Vec<u8>>,
    pub(crate) will: Option<WillMessage>,
    pub(crate) user_properties: Option<Vec<UserProperty>>,
}

impl ConnectOptions {
    /// Creates a new builder with default connect behavior.
    pub fn builder() -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::new()
    }

    /// Returns the keep alive interval the client will propose, in seconds.
    pub fn keep_alive_interval_seconds(&self) -> u16 {
        self.keep_alive_interval_seconds
    }

    /// Returns the client identifier that will be sent, if one was configured.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            keep_alive_interval_seconds: DEFAULT_KEEP_ALIVE_SECONDS,
            clean_start: true,
            client_id: None,
            username: None,
            password: None,
            session_expiry_interval_seconds: None,
            receive_maximum: Some(RECEIVE_MAXIMUM as u16),
            maximum_packet_size_bytes: None,
            topic_alias_maximum: None,
            request_response_information: None,
            request_problem_information: None,
            authentication_method: None,
            authentication_data: None,
            will: None,
            user_properties: None,
        }
    }
}

/// Builder type for [`ConnectOptions`] instances.
pub struct ConnectOptionsBuilder {
    options: ConnectOptions,
}

impl ConnectOptionsBuilder {
    /// Creates a new builder with default connect behavior.
    pub fn new() -> ConnectOptionsBuilder {
        ConnectOptionsBuilder {
            options: ConnectOptions::default(),
        }
    }

    /// Sets the maximum interval, in seconds, between client packets.  Zero disables keep
    /// alive.
    pub fn with_keep_alive_interval_seconds(mut self, keep_alive: u16) -> Self {
        self.options.keep_alive_interval_seconds = keep_alive;
        self
    }

    /// Directs the broker to discard any prior session state.
    pub fn with_clean_start(mut self, clean_start: bool) -> Self {
        self.options.clean_start = clean_start;
        self
    }

    /// Sets the client identifier.  When unset, the broker assigns one and returns it on
    /// CONNACK.
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.options.client_id = Some(client_id.to_string());
        self
    }

    /// Sets username/password authentication credentials.
    pub fn with_basic_authentication(mut self, username: &str, password: &[u8]) -> Self {
        self.options.username = Some(username.to_string());
        self.options.password = Some(password.to_vec());
        self
    }

    /// Sets the session expiry interval requested from the broker, in seconds.
    pub fn with_session_expiry_interval_seconds(mut self, session_expiry: u32) -> Self {
        self.options.session_expiry_interval_seconds = Some(session_expiry);
        self
    }

    /// Overrides the receive maximum advertised to the broker.
    pub fn with_receive_maximum(mut self, receive_maximum: u16) -> Self {
        self.options.receive_maximum = Some(receive_maximum);
        self
    }

    /// Sets the maximum packet size, in bytes, the client is willing to accept.
    pub fn with_maximum_packet_size_bytes(mut self, maximum_packet_size: u32) -> Self {
        self.options.maximum_packet_size_bytes = Some(maximum_packet_size);
        self
    }

    /// Sets the maximum number of inbound topic aliases the client accepts.
    pub fn with_topic_alias_maximum(mut self, topic_alias_maximum: u16) -> Self {
        self.options.topic_alias_maximum = Some(topic_alias_maximum);
        self
    }

    /// Requests that the broker return response information on CONNACK.
    pub fn with_request_response_information(mut self, request: bool) -> Self {
        self.options.request_response_information = Some(request);
        self
    }

    /// Requests that the broker send reason strings and user properties on failures.
    pub fn with_request_problem_information(mut self, request: bool) -> Self {
        self.options.request_problem_information = Some(request);
        self
    }

    /// Sets the authentication method and optional method-specific data.
    pub fn with_authentication(mut self, method: &str, data: Option<&[u8]>) -> Self {
        self.options.authentication_method = Some(method.to_string());
        self.options.authentication_data = data.map(<[u8]>::to_vec);
        self
    }

    /// Attaches a will message to the connection.
    pub fn with_will(mut self, will: WillMessage) -> Self {
        self.options.will = Some(will);
        self
    }

    /// Adds a user property to the CONNECT packet.
    pub fn with_user_property(mut self, name: &str, value: &str) -> Self {
        self.options
            .user_properties
            .get_or_insert_with(Vec::new)
            .push(UserProperty {
                name: name.to_string(),
                value: value.to_string(),
            });
        self
    }

    /// Builds a new ConnectOptions.  Consumes the builder in the process.
    pub fn build(self) -> ConnectOptions {
        self.options
    }
}

impl Default for ConnectOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional extras for a SUBSCRIBE request.
#[derive(Clone, Debug, Default)]
pub struct SubscribeOptions {
    /// Identifier the broker echoes on publishes this subscription matches.  Requires server
    /// support.
    pub subscription_identifier: Option<u32>,

    /// Set of MQTT5 user properties included with the packet.
    pub user_properties: Option<Vec<UserProperty>>,
}

/// Engine knobs that are independent of any single connection.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Smallest receive buffer `poll` will allocate.  Used until the broker advertises a
    /// maximum packet size, and as a floor afterwards.
    pub recv_buffer_minimum: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            recv_buffer_minimum: DEFAULT_RECV_BUFFER_MINIMUM,
        }
    }
}

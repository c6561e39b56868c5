/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
A module containing the crate error enumeration and conversion definitions.
 */

use std::error::Error;
use std::fmt;

/// Basic error type for the entire basalt-mqtt crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MqttError {

    /// Error emitted when an API is invoked with arguments that violate its contract, like an
    /// empty subscription list or a zero-length topic.
    InvalidArgument,

    /// Error emitted when an operation requires an established connection and the client is
    /// either disconnected or still waiting on a CONNACK.
    NotConnected,

    /// Error emitted when the transport cannot supply a packet buffer.
    OutOfMemory,

    /// Error emitted when every pending-operation slot is occupied and a new packet id cannot
    /// be reserved.
    OutOfResource,

    /// Error emitted when a string region fails strict UTF-8 validation, or when a payload
    /// whose format indicator claims UTF-8 does not validate.
    InvalidEncoding,

    /// Error emitted when an invalid packet encoding is sent or received.  Examples include bad
    /// header flags, truncated fields, and invalid variable length integer encodings.
    MalformedPacket,

    /// Error emitted when the remaining length field of an incoming packet does not match the
    /// number of bytes actually supplied.
    InvalidPacketSize,

    /// Error emitted when a property id is not recognized in the context of the packet that
    /// carries it.
    UnknownIdentifier,

    /// Error emitted when a packet arrives whose type is not currently expected, or whose
    /// packet id does not match a pending operation.
    UnexpectedPacketType,

    /// Error emitted when a packet id of zero appears where the protocol forbids it.
    InvalidPacketId,

    /// Error emitted when a quality of service value is outside the valid range.
    InvalidQos,

    /// Error emitted when the requested quality of service exceeds the maximum the server
    /// advertised on CONNACK.
    QosNotSupported,

    /// Error emitted when a retained publish is requested but the server advertised that
    /// retained messages are unavailable.
    RetainNotSupported,

    /// Error emitted when a topic or topic filter violates the protocol rules for the
    /// operation, like a wildcard inside a publish topic.
    InvalidTopic,

    /// Error emitted when an operation relies on an optional server capability (wildcard or
    /// shared subscriptions, subscription identifiers) that the server does not support, or on
    /// an optional transport capability that the adapter does not implement.
    Unsupported,

    /// Error emitted when the server rejects a connection attempt with a CONNACK whose reason
    /// code indicates failure.  Carries the reason code.
    ServerDeclined(u8),

    /// Error emitted when the peer is unreachable or the connection was closed by the peer.
    HostUnavailable,

    /// Error emitted for unrecoverable transport failures.
    HardwareFailure,

    /// Error emitted when the engine reaches a state that should be impossible.  Always a bug.
    SoftwareFailure,

    /// Non-terminal status: the transport cannot take the operation right now, retry later.
    Busy,

    /// Non-terminal status: the operation is in flight and completion will be signalled
    /// out-of-band.
    Pending,
}

impl Error for MqttError {
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MqttError::InvalidArgument => { write!(f, "invalid argument - api invoked with arguments that violate its contract") }
            MqttError::NotConnected => { write!(f, "not connected - operation requires an established mqtt connection") }
            MqttError::OutOfMemory => { write!(f, "out of memory - transport could not supply a packet buffer") }
            MqttError::OutOfResource => { write!(f, "out of resource - no free pending-operation slot for a new packet id") }
            MqttError::InvalidEncoding => { write!(f, "invalid encoding - string or payload region is not valid utf-8") }
            MqttError::MalformedPacket => { write!(f, "malformed packet - packet encoding violates the mqtt spec") }
            MqttError::InvalidPacketSize => { write!(f, "invalid packet size - remaining length does not match the supplied bytes") }
            MqttError::UnknownIdentifier => { write!(f, "unknown identifier - unrecognized property id for this packet context") }
            MqttError::UnexpectedPacketType => { write!(f, "unexpected packet type - packet is not expected in the current session state") }
            MqttError::InvalidPacketId => { write!(f, "invalid packet id - packet id of zero is forbidden here") }
            MqttError::InvalidQos => { write!(f, "invalid qos - quality of service value outside the valid range") }
            MqttError::QosNotSupported => { write!(f, "qos not supported - requested qos exceeds the server maximum") }
            MqttError::RetainNotSupported => { write!(f, "retain not supported - server advertised retain as unavailable") }
            MqttError::InvalidTopic => { write!(f, "invalid topic - topic violates the protocol rules for this operation") }
            MqttError::Unsupported => { write!(f, "unsupported - operation relies on a capability the server or transport lacks") }
            MqttError::ServerDeclined(reason_code) => { write!(f, "server declined - connack rejected the connection with reason code {}", reason_code) }
            MqttError::HostUnavailable => { write!(f, "host unavailable - peer unreachable or connection closed by peer") }
            MqttError::HardwareFailure => { write!(f, "hardware failure - unrecoverable transport failure") }
            MqttError::SoftwareFailure => { write!(f, "software failure - engine reached an impossible state") }
            MqttError::Busy => { write!(f, "busy - transport cannot take the operation right now") }
            MqttError::Pending => { write!(f, "pending - operation is in flight, completion will be signalled") }
        }
    }
}

impl MqttError {
    /// Returns whether the error is a non-terminal status rather than a failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, MqttError::Busy | MqttError::Pending)
    }
}

impl From<std::io::Error> for MqttError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::ConnectionRefused
            | ErrorKind::UnexpectedEof => MqttError::HostUnavailable,
            ErrorKind::WouldBlock
            | ErrorKind::TimedOut
            | ErrorKind::Interrupted => MqttError::Busy,
            ErrorKind::OutOfMemory => MqttError::OutOfMemory,
            _ => MqttError::HardwareFailure,
        }
    }
}

/// Crate-wide result type for functions that can fail
pub type MqttResult<T> = Result<T, MqttError>;

/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing the transport contract the engine drives, plus a plain TCP adapter.

The engine never assumes TCP; any reliable in-order byte stream that can implement
[`NetworkAdapter`] works.  Adapters whose inbound data arrives through callbacks simply skip
`recv` and feed [`process_packet`](crate::client::MqttClient::process_packet) directly.
 */

use crate::config::MQTT_PORT;
use crate::error::{MqttError, MqttResult};

use log::{debug, error};

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// Result of handing a packet buffer to the transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendOutcome {
    /// The packet was written to the stream.
    Sent,

    /// The transport queued the packet; completion is signalled out-of-band.  The transport
    /// owns a copy, the borrow passed to `send` does not outlive the call.
    Pending,
}

/// Result of polling the transport for inbound data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecvOutcome {
    /// A frame of the given length was written into the buffer.
    Data(usize),

    /// Nothing was ready before the poll timeout.
    Idle,
}

/// Contract over which packets are handed to and from the network.
///
/// Send buffers are requested through `alloc_send_buf` immediately before a send and
/// returned through `free_send_buf` immediately after; the engine guarantees the pairing on
/// every exit path.
pub trait NetworkAdapter {
    /// Establishes a connection to the given address.  May return with the transport still
    /// connecting; in that case `connected` stays false until the transport completes the
    /// handshake out-of-band and the owner calls
    /// [`connection_ready`](crate::client::MqttClient::connection_ready).
    fn open_conn(&mut self, address: &str) -> MqttResult<()>;

    /// Closes the connection.  Idempotent.
    fn close_conn(&mut self) -> MqttResult<()>;

    /// Whether the transport is currently connected.
    fn connected(&self) -> bool;

    /// Supplies a packet buffer of exactly `length` bytes.
    fn alloc_send_buf(&mut self, length: usize) -> MqttResult<Vec<u8>> {
        Ok(vec![0u8; length])
    }

    /// Returns a buffer obtained from `alloc_send_buf`.
    fn free_send_buf(&mut self, _buffer: Vec<u8>) {}

    /// Supplies a receive buffer of at least `length` bytes.
    fn alloc_recv_buf(&mut self, length: usize) -> MqttResult<Vec<u8>> {
        Ok(vec![0u8; length])
    }

    /// Returns a buffer obtained from `alloc_recv_buf`.
    fn free_recv_buf(&mut self, _buffer: Vec<u8>) {}

    /// Writes one complete packet.  A partial write is an error, not a short count.
    fn send(&mut self, buffer: &[u8]) -> MqttResult<SendOutcome>;

    /// Polls for inbound data.  Optional; transports that deliver data through callbacks
    /// leave the default in place and the client's `poll` reports `Unsupported`.
    fn recv(&mut self, _buffer: &mut [u8]) -> MqttResult<RecvOutcome> {
        Err(MqttError::Unsupported)
    }
}

/// Blocking TCP adapter over `std::net::TcpStream`.
pub struct TcpNetworkAdapter {
    stream: Option<TcpStream>,
    port: u16,
    poll_timeout: Duration,
}

impl TcpNetworkAdapter {
    /// Creates an adapter targeting the default MQTT port.
    pub fn new(poll_timeout: Duration) -> TcpNetworkAdapter {
        TcpNetworkAdapter {
            stream: None,
            port: MQTT_PORT,
            poll_timeout,
        }
    }

    /// Overrides the broker TCP port.
    pub fn with_port(mut self, port: u16) -> TcpNetworkAdapter {
        self.port = port;
        self
    }
}

impl Default for TcpNetworkAdapter {
    fn default() -> Self {
        TcpNetworkAdapter::new(crate::config::POLL_TIMEOUT)
    }
}

impl NetworkAdapter for TcpNetworkAdapter {
    fn open_conn(&mut self, address: &str) -> MqttResult<()> {
        let endpoint = if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, self.port)
        };

        debug!("TcpNetworkAdapter - connecting to {}", endpoint);
        let stream = TcpStream::connect(&endpoint).map_err(|err| {
            error!("TcpNetworkAdapter - connect failed: {}", err);
            MqttError::HostUnavailable
        })?;

        stream.set_read_timeout(Some(self.poll_timeout))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn close_conn(&mut self) -> MqttResult<()> {
        if let Some(stream) = self.stream.take() {
            // the peer may already be gone; a failed shutdown still counts as closed
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }

    fn connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, buffer: &[u8]) -> MqttResult<SendOutcome> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(MqttError::HostUnavailable);
        };

        stream.write_all(buffer)?;
        stream.flush()?;
        Ok(SendOutcome::Sent)
    }

    fn recv(&mut self, buffer: &mut [u8]) -> MqttResult<RecvOutcome> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(MqttError::HostUnavailable);
        };

        match stream.read(buffer) {
            Ok(0) => {
                // zero-length read is the peer closing the stream
                Err(MqttError::HostUnavailable)
            }
            Ok(count) => Ok(RecvOutcome::Data(count)),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock
                || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(RecvOutcome::Idle)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalAdapter {}

    impl NetworkAdapter for MinimalAdapter {
        fn open_conn(&mut self, _address: &str) -> MqttResult<()> {
            Ok(())
        }

        fn close_conn(&mut self) -> MqttResult<()> {
            Ok(())
        }

        fn connected(&self) -> bool {
            true
        }

        fn send(&mut self, _buffer: &[u8]) -> MqttResult<SendOutcome> {
            Ok(SendOutcome::Sent)
        }
    }

    #[test]
    fn default_buffer_allocation_sizes_exactly() {
        let mut adapter = MinimalAdapter {};
        let buffer = adapter.alloc_send_buf(17).unwrap();
        assert_eq!(17, buffer.len());
        adapter.free_send_buf(buffer);
    }

    #[test]
    fn recv_defaults_to_unsupported() {
        let mut adapter = MinimalAdapter {};
        let mut buffer = [0u8; 8];
        assert_eq!(Err(MqttError::Unsupported), adapter.recv(&mut buffer));
    }

    #[test]
    fn tcp_adapter_reports_disconnected_without_stream() {
        let adapter = TcpNetworkAdapter::new(Duration::from_millis(100));
        assert!(!adapter.connected());
    }
}

//! OSC encoding and the UDP sink.
//!
//! Every changed channel becomes one message `<address> ,ii <channel>
//! <position>`. All messages of one publish cycle are concatenated into a
//! single datagram, unbundled, so receivers that expect one message per
//! datagram only see the first.

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use rosc::{decoder, encoder, OscError, OscMessage, OscPacket, OscType};

/// One outgoing channel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
    pub channel: i32,
    pub position: i32,
}

/// Encode `messages` back to back into one datagram.
pub fn encode_batch(address: &str, messages: &[ChannelMessage]) -> Result<Vec<u8>, OscError> {
    let mut datagram = Vec::new();
    for message in messages {
        let packet = OscPacket::Message(OscMessage {
            addr: address.to_string(),
            args: vec![OscType::Int(message.channel), OscType::Int(message.position)],
        });
        datagram.extend_from_slice(&encoder::encode(&packet)?);
    }
    Ok(datagram)
}

/// Split a datagram produced by [`encode_batch`] back into
/// `(address, message)` pairs.
pub fn decode_batch(mut datagram: &[u8]) -> Result<Vec<(String, ChannelMessage)>, OscError> {
    let mut messages = Vec::new();
    while !datagram.is_empty() {
        let (rest, packet) = decoder::decode_udp(datagram)?;
        if let OscPacket::Message(OscMessage { addr, args }) = packet {
            if let [OscType::Int(channel), OscType::Int(position)] = args.as_slice() {
                messages.push((
                    addr,
                    ChannelMessage {
                        channel: *channel,
                        position: *position,
                    },
                ));
            }
        }
        datagram = rest;
    }
    Ok(messages)
}

/// Where finished datagrams go.
pub trait Transport {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize>;
}

/// Connected UDP socket bound to an ephemeral local port.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    endpoint: SocketAddrV4,
}

impl UdpTransport {
    pub fn connect(endpoint: SocketAddrV4) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(endpoint)?;
        Ok(Self { socket, endpoint })
    }

    pub fn endpoint(&self) -> SocketAddrV4 {
        self.endpoint
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send(datagram)
    }
}

// Author: Dustin Pilgrim
// License: MIT

//! Minimal EventServer client, used to run built-in commands on the host.
//! Each command is sent as its own HELO, ACTION, BYE exchange over UDP.

use tokio::net::UdpSocket;

use crate::core::host::HostError;

const SIGNATURE: &[u8; 4] = b"XBMC";
const MAJOR_VERSION: u8 = 2;
const MINOR_VERSION: u8 = 0;
const HEADER_SIZE: usize = 32;
const MAX_PAYLOAD: usize = 1024;

const PT_HELO: u16 = 0x01;
const PT_BYE: u16 = 0x02;
const PT_ACTION: u16 = 0x0A;

const ACTION_EXECBUILTIN: u8 = 0x01;
const ICON_NONE: u8 = 0x00;

fn packet(packet_type: u16, uid: u32, payload: &[u8]) -> Result<Vec<u8>, HostError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(HostError::Protocol(format!(
            "eventserver payload too large ({} bytes)",
            payload.len()
        )));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(SIGNATURE);
    buf.push(MAJOR_VERSION);
    buf.push(MINOR_VERSION);
    buf.extend_from_slice(&packet_type.to_be_bytes());
    buf.extend_from_slice(&1u32.to_be_bytes()); // sequence
    buf.extend_from_slice(&1u32.to_be_bytes()); // max sequence
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(&uid.to_be_bytes());
    buf.extend_from_slice(&[0u8; 10]);
    buf.extend_from_slice(payload);
    Ok(buf)
}

fn c_string(s: &str) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.push(0);
    out
}

pub fn helo_packet(name: &str, uid: u32) -> Result<Vec<u8>, HostError> {
    let mut payload = c_string(name);
    payload.push(ICON_NONE);
    payload.extend_from_slice(&0u16.to_be_bytes()); // port, unused
    payload.extend_from_slice(&[0u8; 8]); // reserved
    packet(PT_HELO, uid, &payload)
}

pub fn builtin_packet(command: &str, uid: u32) -> Result<Vec<u8>, HostError> {
    let mut payload = vec![ACTION_EXECBUILTIN];
    payload.extend(c_string(command));
    packet(PT_ACTION, uid, &payload)
}

pub fn bye_packet(uid: u32) -> Result<Vec<u8>, HostError> {
    packet(PT_BYE, uid, &[])
}

#[derive(Debug, Clone)]
pub struct EventClient {
    addr: String,
    name: String,
    uid: u32,
}

impl EventClient {
    pub fn new(addr: String, name: String) -> Self {
        Self {
            addr,
            name,
            uid: std::process::id(),
        }
    }

    /// Fire and forget: UDP gives no acknowledgement that the host ran it.
    pub async fn send_builtin(&self, command: &str) -> Result<(), HostError> {
        let packets = [
            helo_packet(&self.name, self.uid)?,
            builtin_packet(command, self.uid)?,
            bye_packet(self.uid)?,
        ];

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&self.addr).await?;
        for p in &packets {
            socket.send(p).await?;
        }
        Ok(())
    }
}

//! # oscrec-types
//!
//! Shared type definitions for the oscrec pipeline.
//! This crate contains the plain data structures passed between the listener
//! thread, the tick consumer, and host glue. No I/O, no threads.

mod config;

pub use config::OscConfig;

use std::time::Instant;

/// Unique identifier for a channel. Stable for the life of the channel;
/// never reused within one registry after removal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(u32);

impl ChannelId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single numeric value carried per address. Only 32-bit ints and floats
/// are interpreted from the wire; everything else is dropped at decode time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ControlValue {
    Int(i32),
    Float(f32),
}

impl ControlValue {
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Int(v) => v as f32,
            Self::Float(v) => v,
        }
    }
}

impl std::fmt::Display for ControlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One logical control channel: the live/recorded state of a single OSC
/// address. Runtime state only, never serialized.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    /// Wire-level address, e.g. `/knob1`. Unique key in the registry.
    pub address: String,
    /// Externally visible identifier derived from the address, collision-free
    /// within one registry (see [`normalize_address`]).
    pub normalized_name: String,
    /// Disabled channels keep receiving value updates internally but are
    /// skipped by live output and the recorder.
    pub enabled: bool,
    pub last_value: Option<ControlValue>,
    pub last_updated_at: Option<Instant>,
    pub created_at: Instant,
}

/// Sanitize an OSC address into an identifier usable as a host property name:
/// leading `/` stripped, every other non-alphanumeric character replaced by
/// `_`, prefixed with `osc_`. Case is preserved.
///
/// `/foo-bar` → `osc_foo_bar`, `/Knob 1` → `osc_Knob_1`.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let mut name = String::with_capacity(body.len() + 4);
    name.push_str("osc_");
    for c in body.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push('_');
        }
    }
    if name == "osc_" {
        name.push_str("message");
    }
    name
}

/// Registry- and session-mutating commands. Queued through the same inbox as
/// network updates so they serialize with them at the tick boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddChannel(String),
    RemoveChannel(String),
    SetEnabled(String, bool),
    StartRecording,
    StopRecording,
}

/// A decoded value update from the wire.
#[derive(Debug, Clone)]
pub struct NetworkUpdate {
    pub address: String,
    pub value: ControlValue,
    pub received_at: Instant,
}

/// Element of the bounded inbox shared between the listener thread and the
/// tick consumer. Both kinds drain in arrival order.
#[derive(Debug, Clone)]
pub enum InboxItem {
    Update(NetworkUpdate),
    Command(Command),
}

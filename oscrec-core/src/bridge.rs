//! Host bridge boundary.
//!
//! The core stays free of host vocabulary: channels are exposed as
//! `(ChannelId, normalized name, value)` and the host maps those onto its
//! own property storage and keyframe store.

use std::collections::{BTreeMap, HashMap};

use oscrec_types::{ChannelId, ControlValue};

/// A bridge call the host could not honor right now (e.g. the property is
/// temporarily locked). Recoverable: the engine skips that channel for the
/// current tick and retries on the next one.
#[derive(Debug)]
pub struct BridgeError(pub String);

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "host bridge rejected call: {}", self.0)
    }
}

impl std::error::Error for BridgeError {}

/// Implemented by host glue. Both calls must be idempotent per target:
/// `insert_keyframe` at an existing (channel, frame) overwrites the prior
/// sample rather than appending a duplicate.
pub trait HostBridge {
    /// Make a live value visible on the host's live data object.
    fn set_property(
        &mut self,
        id: ChannelId,
        name: &str,
        value: ControlValue,
    ) -> Result<(), BridgeError>;

    /// Persist a sample at a timeline frame.
    fn insert_keyframe(
        &mut self,
        id: ChannelId,
        frame: i32,
        value: ControlValue,
    ) -> Result<(), BridgeError>;
}

/// Discards everything. Useful when running the pipeline headless.
pub struct NullBridge;

impl HostBridge for NullBridge {
    fn set_property(
        &mut self,
        _id: ChannelId,
        _name: &str,
        _value: ControlValue,
    ) -> Result<(), BridgeError> {
        Ok(())
    }

    fn insert_keyframe(
        &mut self,
        _id: ChannelId,
        _frame: i32,
        _value: ControlValue,
    ) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// In-memory host stand-in: latest live value per channel plus a keyframe
/// store keyed by (channel, frame), so a rewrite at the same frame
/// overwrites. Used by the CLI monitor and by tests.
#[derive(Default)]
pub struct MemoryBridge {
    properties: HashMap<ChannelId, (String, ControlValue)>,
    keyframes: BTreeMap<(ChannelId, i32), ControlValue>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, id: ChannelId) -> Option<ControlValue> {
        self.properties.get(&id).map(|(_, v)| *v)
    }

    pub fn properties(&self) -> &HashMap<ChannelId, (String, ControlValue)> {
        &self.properties
    }

    /// Keyframes in (channel, frame) order.
    pub fn keyframes(&self) -> &BTreeMap<(ChannelId, i32), ControlValue> {
        &self.keyframes
    }

    pub fn keyframes_for(&self, id: ChannelId) -> Vec<(i32, ControlValue)> {
        self.keyframes
            .iter()
            .filter(|((kid, _), _)| *kid == id)
            .map(|((_, frame), v)| (*frame, *v))
            .collect()
    }
}

impl HostBridge for MemoryBridge {
    fn set_property(
        &mut self,
        id: ChannelId,
        name: &str,
        value: ControlValue,
    ) -> Result<(), BridgeError> {
        self.properties.insert(id, (name.to_string(), value));
        Ok(())
    }

    fn insert_keyframe(
        &mut self,
        id: ChannelId,
        frame: i32,
        value: ControlValue,
    ) -> Result<(), BridgeError> {
        self.keyframes.insert((id, frame), value);
        Ok(())
    }
}

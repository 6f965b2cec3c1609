//! Channel registry: the authoritative address → channel state.
//!
//! Mutated only by the tick consumer. The listener thread never touches it,
//! so channel fields need no locking; the inbox is the only synchronization
//! point in the pipeline.

use std::time::Instant;

use oscrec_types::{normalize_address, Channel, ChannelId, ControlValue, NetworkUpdate};

pub struct ChannelRegistry {
    /// Insertion order is the authoritative enumeration order; downstream
    /// socket generation is order-sensitive.
    channels: Vec<Channel>,
    auto_add: bool,
    next_id: u32,
}

impl ChannelRegistry {
    pub fn new(auto_add: bool) -> Self {
        Self {
            channels: Vec::new(),
            auto_add,
            next_id: 0,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn enabled_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.enabled)
    }

    pub fn get(&self, address: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.address == address)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Apply one network update. Unknown addresses create a channel when
    /// auto-add is on and are discarded otherwise. Disabled channels still
    /// take the value; they are only skipped at output time.
    pub fn apply_update(&mut self, update: NetworkUpdate) -> bool {
        if let Some(channel) = self.get_mut(&update.address) {
            channel.last_value = Some(update.value);
            channel.last_updated_at = Some(update.received_at);
            return true;
        }
        if !self.auto_add {
            log::debug!(
                "discarding update for unknown address {} (auto-add off)",
                update.address
            );
            return false;
        }
        self.insert(update.address);
        if let Some(channel) = self.channels.last_mut() {
            channel.last_value = Some(update.value);
            channel.last_updated_at = Some(update.received_at);
        }
        true
    }

    /// Manual add, independent of the auto-add flag. Warn no-op if the
    /// address already has a channel.
    pub fn add_channel(&mut self, address: &str) -> Option<ChannelId> {
        if self.get(address).is_some() {
            log::warn!("channel for {} already exists, add ignored", address);
            return None;
        }
        Some(self.insert(address.to_string()))
    }

    /// Warn no-op if the address is unknown.
    pub fn remove_channel(&mut self, address: &str) -> Option<ChannelId> {
        match self.channels.iter().position(|c| c.address == address) {
            Some(index) => {
                let channel = self.channels.remove(index);
                log::info!(
                    "removed channel {} ({})",
                    channel.address,
                    channel.normalized_name
                );
                Some(channel.id)
            }
            None => {
                log::warn!("no channel for {}, remove ignored", address);
                None
            }
        }
    }

    /// Warn no-op if the address is unknown.
    pub fn set_enabled(&mut self, address: &str, enabled: bool) -> bool {
        match self.get_mut(address) {
            Some(channel) => {
                channel.enabled = enabled;
                true
            }
            None => {
                log::warn!("no channel for {}, enable/disable ignored", address);
                false
            }
        }
    }

    fn get_mut(&mut self, address: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.address == address)
    }

    fn insert(&mut self, address: String) -> ChannelId {
        let normalized_name = self.disambiguate(normalize_address(&address));
        let id = ChannelId::new(self.next_id);
        self.next_id += 1;
        log::info!("new channel {} as {}", address, normalized_name);
        self.channels.push(Channel {
            id,
            address,
            normalized_name,
            enabled: true,
            last_value: None,
            last_updated_at: None,
            created_at: Instant::now(),
        });
        id
    }

    /// Distinct addresses can normalize to the same name; suffix a counter
    /// so every channel exposes a unique downstream identifier.
    fn disambiguate(&self, base: String) -> String {
        if !self.name_taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.name_taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c.normalized_name == name)
    }
}

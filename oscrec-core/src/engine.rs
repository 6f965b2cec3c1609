//! The command surface and tick consumer.
//!
//! `OscEngine` is an explicit, constructible object with a start/stop
//! lifecycle; there is no process-wide singleton. Listener start/stop act
//! directly; every registry- or session-mutating command goes through the
//! same bounded inbox as network updates, so commands and data interleave in
//! arrival order and the tick consumer stays the single writer of registry
//! state.

use std::io;
use std::net::SocketAddr;

use oscrec_types::{Channel, Command, InboxItem, OscConfig};

use crate::bridge::HostBridge;
use crate::inbox::{inbox, InboxConsumer, InboxProducer};
use crate::listener::OscListener;
use crate::recorder::RecordingSession;
use crate::registry::ChannelRegistry;

/// Per-tick diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Network updates applied to the registry.
    pub applied_updates: usize,
    /// Commands applied (including warn no-ops).
    pub applied_commands: usize,
    /// Items evicted by inbox overflow since the previous tick.
    pub dropped: u64,
    /// Keyframes written this tick (0 unless recording).
    pub recorded: usize,
}

/// Cloneable handle for enqueueing commands from any thread. Commands are
/// applied at the next tick.
#[derive(Clone)]
pub struct CommandSender {
    producer: InboxProducer,
}

impl CommandSender {
    pub fn send(&self, command: Command) {
        self.producer.push(InboxItem::Command(command));
    }

    pub fn add_channel(&self, address: &str) {
        self.send(Command::AddChannel(address.to_string()));
    }

    pub fn remove_channel(&self, address: &str) {
        self.send(Command::RemoveChannel(address.to_string()));
    }

    pub fn set_enabled(&self, address: &str, enabled: bool) {
        self.send(Command::SetEnabled(address.to_string(), enabled));
    }

    pub fn start_recording(&self) {
        self.send(Command::StartRecording);
    }

    pub fn stop_recording(&self) {
        self.send(Command::StopRecording);
    }
}

pub struct OscEngine {
    config: OscConfig,
    producer: InboxProducer,
    consumer: InboxConsumer,
    listener: Option<OscListener>,
    registry: ChannelRegistry,
    session: RecordingSession,
}

impl OscEngine {
    pub fn new(config: OscConfig) -> Self {
        let (producer, consumer) = inbox(config.inbox_capacity);
        let registry = ChannelRegistry::new(config.auto_add);
        Self {
            config,
            producer,
            consumer,
            listener: None,
            registry,
            session: RecordingSession::new(),
        }
    }

    /// Handle for other threads (UI glue, tests) to enqueue commands.
    pub fn commands(&self) -> CommandSender {
        CommandSender {
            producer: self.producer.clone(),
        }
    }

    /// Bind and start the receive thread. Safe no-op if already listening;
    /// bind failure is returned synchronously with nothing left running.
    pub fn start_listener(&mut self) -> io::Result<()> {
        if self.listener.is_some() {
            log::warn!("listener already running, start ignored");
            return Ok(());
        }
        let listener = OscListener::start(&self.config, self.producer.clone())?;
        self.listener = Some(listener);
        Ok(())
    }

    /// Stop the receive thread and join it. Safe no-op if already stopped.
    /// After this returns, no further network items enter the inbox.
    pub fn stop_listener(&mut self) {
        match self.listener.take() {
            Some(listener) => listener.stop(),
            None => log::debug!("listener not running, stop ignored"),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Actual bound address while listening (binding port 0 picks one).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|l| l.local_addr())
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_active()
    }

    /// Ordered channel list; insertion order, the same order downstream
    /// socket generation consumes.
    pub fn channels(&self) -> &[Channel] {
        self.registry.channels()
    }

    pub fn add_channel(&self, address: &str) {
        self.commands().add_channel(address);
    }

    pub fn remove_channel(&self, address: &str) {
        self.commands().remove_channel(address);
    }

    pub fn set_enabled(&self, address: &str, enabled: bool) {
        self.commands().set_enabled(address, enabled);
    }

    pub fn start_recording(&self) {
        self.commands().start_recording();
    }

    pub fn stop_recording(&self) {
        self.commands().stop_recording();
    }

    /// One tick of the single consumer. Drains the inbox (bounded), applies
    /// updates and commands in arrival order, pushes live values for enabled
    /// channels, then samples keyframes if a recording session is active.
    pub fn tick(&mut self, frame: i32, bridge: &mut dyn HostBridge) -> TickReport {
        let mut report = TickReport::default();

        for item in self.consumer.drain(self.config.max_drain_per_tick) {
            match item {
                InboxItem::Update(update) => {
                    if self.registry.apply_update(update) {
                        report.applied_updates += 1;
                    }
                }
                InboxItem::Command(command) => {
                    self.apply_command(command);
                    report.applied_commands += 1;
                }
            }
        }
        report.dropped = self.consumer.take_dropped();

        for channel in self.registry.enabled_channels() {
            if let Some(value) = channel.last_value {
                if let Err(e) = bridge.set_property(channel.id, &channel.normalized_name, value)
                {
                    // Recoverable: retried next tick.
                    log::warn!(
                        "live update for {} skipped this tick: {}",
                        channel.normalized_name,
                        e
                    );
                }
            }
        }

        if self.session.is_active() {
            report.recorded = self.session.sample(frame, &self.registry, bridge);
        }
        report
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::AddChannel(address) => {
                self.registry.add_channel(&address);
            }
            Command::RemoveChannel(address) => {
                self.registry.remove_channel(&address);
            }
            Command::SetEnabled(address, enabled) => {
                self.registry.set_enabled(&address, enabled);
            }
            Command::StartRecording => self.session.start(),
            Command::StopRecording => self.session.stop(),
        }
    }

    /// Stop the listener and drop the engine.
    pub fn shutdown(mut self) {
        self.stop_listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeError, MemoryBridge, NullBridge};
    use oscrec_types::{ChannelId, ControlValue, NetworkUpdate};
    use std::time::Instant;

    fn push_update(engine: &OscEngine, address: &str, value: ControlValue) {
        engine.producer.push(InboxItem::Update(NetworkUpdate {
            address: address.to_string(),
            value,
            received_at: Instant::now(),
        }));
    }

    #[test]
    fn update_then_add_command_yields_one_channel() {
        // A queued message for an address processed before a queued
        // AddChannel for it must make the add a duplicate no-op.
        let mut engine = OscEngine::new(OscConfig::default());
        push_update(&engine, "/knob1", ControlValue::Float(0.5));
        engine.add_channel("/knob1");

        let report = engine.tick(0, &mut NullBridge);
        assert_eq!(report.applied_updates, 1);
        assert_eq!(report.applied_commands, 1);
        assert_eq!(engine.channels().len(), 1);
        assert_eq!(
            engine.channels()[0].last_value,
            Some(ControlValue::Float(0.5))
        );
    }

    #[test]
    fn coalescing_keeps_the_last_value_per_address() {
        let mut engine = OscEngine::new(OscConfig::default());
        for v in 1..=20 {
            push_update(&engine, "/fader", ControlValue::Int(v));
        }
        engine.tick(0, &mut NullBridge);
        assert_eq!(engine.channels().len(), 1);
        assert_eq!(
            engine.channels()[0].last_value,
            Some(ControlValue::Int(20))
        );
    }

    #[test]
    fn overflow_keeps_the_newest_values() {
        let config = OscConfig {
            inbox_capacity: 4,
            ..OscConfig::default()
        };
        let mut engine = OscEngine::new(config);
        for v in 1..=100 {
            push_update(&engine, "/fast", ControlValue::Int(v));
        }
        let report = engine.tick(0, &mut NullBridge);
        assert!(report.dropped > 0);
        assert_eq!(
            engine.channels()[0].last_value,
            Some(ControlValue::Int(100))
        );
    }

    #[test]
    fn excess_items_stay_queued_across_ticks() {
        let config = OscConfig {
            max_drain_per_tick: 2,
            ..OscConfig::default()
        };
        let mut engine = OscEngine::new(config);
        for addr in ["/a", "/b", "/c"] {
            push_update(&engine, addr, ControlValue::Int(1));
        }
        let first = engine.tick(0, &mut NullBridge);
        assert_eq!(first.applied_updates, 2);
        let second = engine.tick(1, &mut NullBridge);
        assert_eq!(second.applied_updates, 1);
        assert_eq!(engine.channels().len(), 3);
    }

    #[test]
    fn disabled_channel_leaves_live_output_but_keeps_updating() {
        let mut engine = OscEngine::new(OscConfig::default());
        push_update(&engine, "/knob", ControlValue::Float(0.1));
        let mut bridge = MemoryBridge::new();
        engine.tick(0, &mut bridge);
        let id = engine.channels()[0].id;
        assert_eq!(bridge.property(id), Some(ControlValue::Float(0.1)));

        engine.set_enabled("/knob", false);
        push_update(&engine, "/knob", ControlValue::Float(0.9));
        let mut bridge = MemoryBridge::new();
        engine.tick(1, &mut bridge);
        assert_eq!(bridge.property(id), None);
        assert_eq!(
            engine.channels()[0].last_value,
            Some(ControlValue::Float(0.9))
        );
    }

    #[test]
    fn recording_writes_one_sample_per_frame() {
        let mut engine = OscEngine::new(OscConfig::default());
        push_update(&engine, "/knob", ControlValue::Float(0.5));
        engine.start_recording();
        let mut bridge = MemoryBridge::new();
        for frame in 1..=5 {
            let report = engine.tick(frame, &mut bridge);
            assert_eq!(report.recorded, 1);
        }
        engine.stop_recording();
        engine.tick(6, &mut bridge);
        assert!(!engine.is_recording());

        let id = engine.channels()[0].id;
        let frames: Vec<i32> = bridge.keyframes_for(id).iter().map(|(f, _)| *f).collect();
        assert_eq!(frames, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn repeated_frame_overwrites_sample() {
        let mut engine = OscEngine::new(OscConfig::default());
        push_update(&engine, "/knob", ControlValue::Float(0.5));
        engine.start_recording();
        let mut bridge = MemoryBridge::new();
        engine.tick(5, &mut bridge);
        push_update(&engine, "/knob", ControlValue::Float(0.8));
        engine.tick(5, &mut bridge);

        let id = engine.channels()[0].id;
        assert_eq!(
            bridge.keyframes_for(id),
            vec![(5, ControlValue::Float(0.8))]
        );
    }

    #[test]
    fn removed_channel_disappears_from_enumeration() {
        let mut engine = OscEngine::new(OscConfig::default());
        engine.add_channel("/a");
        engine.add_channel("/b");
        engine.tick(0, &mut NullBridge);
        engine.remove_channel("/a");
        engine.tick(1, &mut NullBridge);
        let addrs: Vec<&str> = engine
            .channels()
            .iter()
            .map(|c| c.address.as_str())
            .collect();
        assert_eq!(addrs, vec!["/b"]);
    }

    /// Bridge that rejects every set_property call; the engine must carry on
    /// and retry on later ticks.
    struct LockedBridge {
        rejected: usize,
    }

    impl HostBridge for LockedBridge {
        fn set_property(
            &mut self,
            _id: ChannelId,
            _name: &str,
            _value: ControlValue,
        ) -> Result<(), BridgeError> {
            self.rejected += 1;
            Err(BridgeError("property locked".to_string()))
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

    #[test]
    fn bridge_rejection_is_not_fatal_and_retries_next_tick() {
        let mut engine = OscEngine::new(OscConfig::default());
        push_update(&engine, "/knob", ControlValue::Float(0.5));
        let mut locked = LockedBridge { rejected: 0 };
        engine.tick(0, &mut locked);
        assert_eq!(locked.rejected, 1);

        // Same value is offered again on the next tick.
        let mut bridge = MemoryBridge::new();
        engine.tick(1, &mut bridge);
        let id = engine.channels()[0].id;
        assert_eq!(bridge.property(id), Some(ControlValue::Float(0.5)));
    }
}

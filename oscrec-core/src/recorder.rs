//! Per-tick recorder: samples enabled channels into the host keyframe store.

use oscrec_types::ControlValue;

use crate::bridge::HostBridge;
use crate::registry::ChannelRegistry;

/// Recording session state, owned by the engine. Sampling happens inside the
/// tick, after inbox items have been applied; there is no buffering and no
/// flush beyond the last tick already written.
pub struct RecordingSession {
    active: bool,
    last_frame: Option<i32>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            active: false,
            last_frame: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frame of the most recent sample pass, if any.
    pub fn last_frame(&self) -> Option<i32> {
        self.last_frame
    }

    /// Safe no-op when already recording.
    pub fn start(&mut self) {
        if self.active {
            log::warn!("recording already active, start ignored");
            return;
        }
        self.active = true;
        self.last_frame = None;
        log::info!("recording started");
    }

    /// Safe no-op when already stopped.
    pub fn stop(&mut self) {
        if !self.active {
            log::debug!("recording not active, stop ignored");
            return;
        }
        self.active = false;
        log::info!(
            "recording stopped (last frame {:?})",
            self.last_frame
        );
        self.last_frame = None;
    }

    /// Write one sample per enabled channel that has a value. Re-invocation
    /// at the same frame overwrites (the bridge's keyframe store is keyed by
    /// channel and frame). A bridge rejection skips that channel for this
    /// frame only.
    pub fn sample(
        &mut self,
        frame: i32,
        registry: &ChannelRegistry,
        bridge: &mut dyn HostBridge,
    ) -> usize {
        let mut written = 0;
        for channel in registry.enabled_channels() {
            let value: ControlValue = match channel.last_value {
                Some(v) => v,
                None => continue,
            };
            match bridge.insert_keyframe(channel.id, frame, value) {
                Ok(()) => written += 1,
                Err(e) => log::warn!(
                    "keyframe for {} skipped at frame {}: {}",
                    channel.normalized_name,
                    frame,
                    e
                ),
            }
        }
        self.last_frame = Some(frame);
        written
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

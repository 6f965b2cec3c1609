//! # oscrec-core
//!
//! OSC ingestion pipeline: UDP listener, channel registry, and per-tick
//! recorder — independent of any host application.
//!
//! Two execution contexts exist: the listener's dedicated thread (blocking
//! receive with a shutdown timeout) and the host's tick-stepped main thread.
//! The bounded inbox is the only structure shared between them; registry and
//! session state are touched exclusively by the tick consumer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oscrec_core::{MemoryBridge, OscEngine};
//! use oscrec_types::OscConfig;
//!
//! let mut engine = OscEngine::new(OscConfig::default());
//! engine.start_listener().expect("bind failed");
//!
//! let mut bridge = MemoryBridge::new();
//! for frame in 0..600 {
//!     engine.tick(frame, &mut bridge);
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! engine.shutdown();
//! ```

pub mod bridge;
pub mod decoder;
pub mod engine;
pub mod inbox;
pub mod listener;
pub mod recorder;
pub mod registry;

pub use bridge::{BridgeError, HostBridge, MemoryBridge, NullBridge};
pub use decoder::{decode_datagram, DecodeError};
pub use engine::{CommandSender, OscEngine, TickReport};
pub use listener::OscListener;
pub use recorder::RecordingSession;
pub use registry::ChannelRegistry;

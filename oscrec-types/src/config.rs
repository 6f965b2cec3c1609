use serde::Deserialize;

fn default_bind_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_auto_add() -> bool {
    true
}

fn default_inbox_capacity() -> usize {
    1024
}

fn default_max_drain_per_tick() -> usize {
    4096
}

/// Configuration supplied by host glue. The core never reads config files
/// itself; hosts deserialize this from wherever they keep settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OscConfig {
    /// Local IP to listen on (`0.0.0.0` for all interfaces).
    #[serde(default = "default_bind_ip")]
    pub bind_ip: String,
    /// UDP port to listen for OSC.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Create a channel automatically on the first message for an unknown
    /// address. When off, updates for unknown addresses are discarded.
    #[serde(default = "default_auto_add")]
    pub auto_add: bool,
    /// Bounded inbox size. Overflow drops the oldest queued item.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
    /// Upper bound on items applied per tick; the remainder stays queued.
    #[serde(default = "default_max_drain_per_tick")]
    pub max_drain_per_tick: usize,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            bind_ip: default_bind_ip(),
            port: default_port(),
            auto_add: default_auto_add(),
            inbox_capacity: default_inbox_capacity(),
            max_drain_per_tick: default_max_drain_per_tick(),
        }
    }
}

impl OscConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_ip, self.port)
    }
}

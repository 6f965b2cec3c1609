//! UDP listener: owns the socket and the dedicated receive thread.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use oscrec_types::{InboxItem, OscConfig};

use crate::decoder;
use crate::inbox::InboxProducer;

/// Receive timeout; bounds how long shutdown can take.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Handle to the running receive thread. Stopping (or dropping) the handle
/// joins the thread, so no inbox writes can happen afterwards.
pub struct OscListener {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl OscListener {
    /// Bind the socket and start the receive loop. Bind failure (port in
    /// use, bad address) is returned synchronously and leaves nothing
    /// running.
    pub fn start(config: &OscConfig, producer: InboxProducer) -> io::Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr())?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("osc-listener".to_string())
            .spawn(move || receive_loop(socket, producer, stop_flag))?;

        log::info!("OSC listening on {}", local_addr);
        Ok(Self {
            stop,
            thread: Some(thread),
            local_addr,
        })
    }

    /// Actual bound address; useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the receive loop and join the thread. The loop observes the flag
    /// within one receive timeout.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::warn!("OSC listener thread panicked during shutdown");
            } else {
                log::info!("OSC listener on {} stopped", self.local_addr);
            }
        }
    }
}

impl Drop for OscListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(socket: UdpSocket, producer: InboxProducer, stop: Arc<AtomicBool>) {
    // Max UDP payload; datagrams larger than the wire allows cannot arrive.
    let mut buf = vec![0u8; 65536];
    let mut decode_failures: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        let (len, _peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                log::warn!("OSC receive failed, listener exiting: {}", e);
                break;
            }
        };

        match decoder::decode_datagram(&buf[..len], Instant::now()) {
            Ok(updates) => {
                for update in updates {
                    producer.push(InboxItem::Update(update));
                }
            }
            Err(e) => {
                decode_failures += 1;
                // Log the first few and then every power of two, so a
                // misconfigured sender cannot flood the log.
                if decode_failures <= 3 || decode_failures.is_power_of_two() {
                    log::warn!(
                        "dropped malformed datagram ({} total): {}",
                        decode_failures,
                        e
                    );
                }
            }
        }
    }
}

//! Stateless OSC datagram decoding.
//!
//! Extracts one numeric value per message: only the first argument is read,
//! and only 32-bit int and float type tags are interpreted. Bundles are
//! walked recursively; their timetag headers carry scheduling information we
//! deliberately ignore (no scheduled-delivery semantics).

use std::time::Instant;

use rosc::{OscPacket, OscType};

use oscrec_types::{ControlValue, NetworkUpdate};

/// A structurally malformed datagram: bad size prefix, truncated string,
/// unknown type tag at the framing level. The whole datagram is dropped.
#[derive(Debug)]
pub struct DecodeError(rosc::OscError);

impl From<rosc::OscError> for DecodeError {
    fn from(e: rosc::OscError) -> Self {
        Self(e)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed OSC datagram: {:?}", self.0)
    }
}

impl std::error::Error for DecodeError {}

/// Decode a raw datagram into zero or more value updates.
///
/// Messages with no arguments or a non-numeric first argument are skipped;
/// sibling messages of the same bundle still decode. A malformed datagram at
/// the framing level is rejected as a whole. Never panics on any byte input.
pub fn decode_datagram(
    buf: &[u8],
    received_at: Instant,
) -> Result<Vec<NetworkUpdate>, DecodeError> {
    let (_rest, packet) = rosc::decoder::decode_udp(buf)?;
    let mut updates = Vec::new();
    collect_updates(&packet, received_at, &mut updates);
    Ok(updates)
}

fn collect_updates(packet: &OscPacket, received_at: Instant, out: &mut Vec<NetworkUpdate>) {
    match packet {
        OscPacket::Message(msg) => {
            let value = match msg.args.first() {
                Some(OscType::Int(v)) => ControlValue::Int(*v),
                Some(OscType::Float(v)) => ControlValue::Float(*v),
                Some(other) => {
                    log::debug!(
                        "skipping message {}: first argument {:?} is not numeric",
                        msg.addr,
                        other
                    );
                    return;
                }
                None => {
                    log::debug!("skipping message {}: no arguments", msg.addr);
                    return;
                }
            };
            out.push(NetworkUpdate {
                address: msg.addr.clone(),
                value,
                received_at,
            });
        }
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                collect_updates(inner, received_at, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscMessage, OscTime};

    fn encode(packet: &OscPacket) -> Vec<u8> {
        rosc::encoder::encode(packet).unwrap()
    }

    fn message(addr: &str, args: Vec<OscType>) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        })
    }

    #[test]
    fn decodes_int_and_float_messages() {
        let now = Instant::now();

        let buf = encode(&message("/knob1", vec![OscType::Float(0.5)]));
        let updates = decode_datagram(&buf, now).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].address, "/knob1");
        assert_eq!(updates[0].value, ControlValue::Float(0.5));

        let buf = encode(&message("/fader", vec![OscType::Int(42)]));
        let updates = decode_datagram(&buf, now).unwrap();
        assert_eq!(updates[0].value, ControlValue::Int(42));
    }

    #[test]
    fn only_first_argument_is_read() {
        let buf = encode(&message(
            "/xy",
            vec![OscType::Float(1.0), OscType::Float(2.0)],
        ));
        let updates = decode_datagram(&buf, Instant::now()).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].value, ControlValue::Float(1.0));
    }

    #[test]
    fn non_numeric_and_empty_messages_are_skipped() {
        let buf = encode(&message(
            "/label",
            vec![OscType::String("hi".to_string())],
        ));
        assert!(decode_datagram(&buf, Instant::now()).unwrap().is_empty());

        let buf = encode(&message("/bang", vec![]));
        assert!(decode_datagram(&buf, Instant::now()).unwrap().is_empty());
    }

    #[test]
    fn bundle_decodes_siblings_around_a_skipped_message() {
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                message("/a", vec![OscType::Float(1.0)]),
                message("/skip", vec![OscType::String("x".to_string())]),
                message("/b", vec![OscType::Int(2)]),
            ],
        });
        let updates = decode_datagram(&encode(&bundle), Instant::now()).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].address, "/a");
        assert_eq!(updates[1].address, "/b");
    }

    #[test]
    fn nested_bundles_decode_recursively() {
        let inner = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![message("/deep", vec![OscType::Float(3.0)])],
        });
        let outer = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![inner, message("/top", vec![OscType::Int(7)])],
        });
        let updates = decode_datagram(&encode(&outer), Instant::now()).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].address, "/deep");
        assert_eq!(updates[1].address, "/top");
    }

    #[test]
    fn truncated_datagram_is_rejected_whole() {
        let buf = encode(&message("/knob1", vec![OscType::Float(0.5)]));
        assert!(decode_datagram(&buf[..buf.len() - 3], Instant::now()).is_err());
    }

    #[test]
    fn garbage_bytes_never_panic() {
        // Simple LCG so the fuzz corpus is reproducible.
        let mut seed: u64 = 0x5EED;
        for len in 0..256 {
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    (seed >> 33) as u8
                })
                .collect();
            let _ = decode_datagram(&bytes, Instant::now());
        }
    }
}

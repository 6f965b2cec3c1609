//! oscrec monitor: bind a UDP port, run the tick loop, print live channel
//! values. With `--record` the in-memory keyframe store is dumped to CSV
//! when the frame limit is reached, standing in for a real host's keyframe
//! store.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use oscrec_core::{MemoryBridge, OscEngine};
use oscrec_types::{ChannelId, ControlValue, OscConfig};

const TICK_INTERVAL: Duration = Duration::from_millis(16);

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    log::info!("oscrec starting (log level: {:?})", log_level);
}

fn print_usage() {
    eprintln!("Usage: oscrec [BIND_IP] [PORT] [options]");
    eprintln!();
    eprintln!("  BIND_IP              local IP to listen on (default 0.0.0.0)");
    eprintln!("  PORT                 UDP port (default 9000)");
    eprintln!("  --no-auto-add        only update manually added channels");
    eprintln!("  --frames N           stop after N ticks (default: run forever)");
    eprintln!("  --record FILE.csv    record keyframes, dump CSV at the frame limit");
    eprintln!("  -v, --verbose        debug logging");
}

struct CliArgs {
    config: OscConfig,
    verbose: bool,
    frames: Option<i32>,
    record: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut config = OscConfig::default();
    let mut verbose = false;
    let mut frames = None;
    let mut record = None;
    let mut positional = 0;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--no-auto-add" => config.auto_add = false,
            "--frames" => {
                let n = args.next().ok_or("--frames needs a value")?;
                frames = Some(n.parse::<i32>().map_err(|_| format!("bad frame count {}", n))?);
            }
            "--record" => {
                let path = args.next().ok_or("--record needs a path")?;
                record = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(String::new()),
            other if other.starts_with('-') => {
                return Err(format!("unknown option {}", other));
            }
            other => {
                match positional {
                    0 => config.bind_ip = other.to_string(),
                    1 => {
                        config.port = other
                            .parse()
                            .map_err(|_| format!("bad port {}", other))?;
                    }
                    _ => return Err(format!("unexpected argument {}", other)),
                }
                positional += 1;
            }
        }
    }

    if record.is_some() && frames.is_none() {
        return Err("--record needs --frames so the dump has an end".to_string());
    }

    Ok(CliArgs {
        config,
        verbose,
        frames,
        record,
    })
}

fn dump_csv(
    path: &PathBuf,
    bridge: &MemoryBridge,
    names: &HashMap<ChannelId, String>,
) -> std::io::Result<usize> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "channel,frame,value")?;
    let mut rows = 0;
    for ((id, frame), value) in bridge.keyframes() {
        let name = names
            .get(id)
            .map(String::as_str)
            .unwrap_or("removed");
        writeln!(file, "{},{},{}", name, frame, value)?;
        rows += 1;
    }
    Ok(rows)
}

fn main() -> std::io::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("oscrec: {}", msg);
                eprintln!();
            }
            print_usage();
            std::process::exit(if msg.is_empty() { 0 } else { 2 });
        }
    };

    init_logging(args.verbose);

    let mut engine = OscEngine::new(args.config);
    if let Err(e) = engine.start_listener() {
        eprintln!("oscrec: failed to bind: {}", e);
        std::process::exit(1);
    }
    if let Some(addr) = engine.local_addr() {
        println!("listening on {} (Ctrl-C to quit)", addr);
    }
    if args.record.is_some() {
        engine.start_recording();
    }

    let mut bridge = MemoryBridge::new();
    let mut shown: HashMap<ChannelId, ControlValue> = HashMap::new();
    let mut frame: i32 = 0;

    loop {
        let started = Instant::now();
        engine.tick(frame, &mut bridge);

        for channel in engine.channels() {
            if !channel.enabled {
                continue;
            }
            if let Some(value) = channel.last_value {
                if shown.get(&channel.id) != Some(&value) {
                    println!("{:>6}  {:<24} {}", frame, channel.normalized_name, value);
                    shown.insert(channel.id, value);
                }
            }
        }

        frame += 1;
        if let Some(limit) = args.frames {
            if frame >= limit {
                break;
            }
        }
        if let Some(remaining) = TICK_INTERVAL.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    if let Some(path) = &args.record {
        engine.stop_recording();
        let names: HashMap<ChannelId, String> = engine
            .channels()
            .iter()
            .map(|c| (c.id, c.normalized_name.clone()))
            .collect();
        let rows = dump_csv(path, &bridge, &names)?;
        println!("wrote {} keyframes to {}", rows, path.display());
    }

    engine.shutdown();
    Ok(())
}

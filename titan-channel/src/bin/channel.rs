//! Channel URI inspector.
//!
//! Parses each URI given on the command line the way the driver would and
//! prints the resolved addresses and canonical form.
//!
//! # Usage
//!
//! ```sh
//! titan-channel 'aeron:udp?endpoint=224.0.1.1:40001|interface=eth0'
//! titan-channel --ttl 8 'aeron:udp?endpoint=239.1.1.1:7000' 'aeron:udp?endpoint=localhost:7000'
//! ```
//!
//! Exits with status 1 if any URI fails to parse.

use std::io;

use titan_channel::{ChannelConfig, ChannelContext, UdpChannel, init_tracing};

struct Args {
    config: ChannelConfig,
    uris: Vec<String>,
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("titan-channel: {e}");
            std::process::exit(2);
        }
    };

    let context = ChannelContext::new(args.config);
    let mut failed = false;
    for uri in &args.uris {
        match context.parse(uri) {
            Ok(channel) => {
                print_channel(&channel);
                channel.release();
            }
            Err(e) => {
                eprintln!("titan-channel: {uri}: {e} ({:?})", e.kind());
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn print_channel(channel: &UdpChannel) {
    println!("{channel}");
    println!("  canonical       {}", channel.canonical_form());
    println!("  remote data     {}", channel.remote_data());
    println!("  local data      {}", channel.local_data());
    println!("  remote control  {}", channel.remote_control());
    println!("  local control   {}", channel.local_control());
    match channel.interface_index() {
        Some(index) => println!(
            "  interface       {} (index {index})",
            channel.interface_address()
        ),
        None => println!("  interface       {}", channel.interface_address()),
    }
    println!("  control mode    {}", channel.control_mode());
    if let Some(ttl) = channel.multicast_ttl() {
        println!("  multicast ttl   {ttl}");
    }
    if let Some(tag) = channel.tag_id() {
        println!("  tag             {tag}");
    }
    if channel.is_wildcard() {
        println!("  wildcard");
    }
}

/// Parses command line arguments.
fn parse_args(args: &[String]) -> io::Result<Args> {
    let mut config = ChannelConfig::default();
    let mut uris = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--ttl" | "-t" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "missing value for --ttl")
                })?;
                config.default_multicast_ttl = value
                    .parse()
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            }
            "--max-length" | "-m" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "missing value for --max-length")
                })?;
                config.max_uri_length = value
                    .parse()
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown argument: {arg}"),
                ));
            }
            uri => uris.push(uri.to_string()),
        }
        i += 1;
    }

    if uris.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no channel uri given (see --help)",
        ));
    }

    Ok(Args { config, uris })
}

fn print_usage() {
    eprintln!(
        r#"titan-channel - resolve and canonicalize UDP channel URIs

USAGE:
    titan-channel [OPTIONS] <URI>...

OPTIONS:
    -t, --ttl <N>           Default multicast TTL (default: 1)
    -m, --max-length <N>    Longest URI accepted, in bytes (default: 4096)
    -h, --help              Print this help message

ENVIRONMENT:
    RUST_LOG                Log filter when built with --features tracing

EXAMPLE:
    titan-channel 'aeron:udp?endpoint=224.0.1.1:40001|interface=eth0'
    titan-channel --ttl 8 'aeron:udp?endpoint=239.1.1.1:7000'
"#
    );
}

//! `fieldstored` – line-oriented JSON command daemon over a shared field store.
//!
//! Requests arrive one JSON object per line on stdin; responses leave one
//! JSON object per line on stderr. Stdout carries human-readable trace lines
//! only (tune with `RUST_LOG`), and is safe for operators to tail.

use anyhow::{Result, bail};
use fieldstore::service::{Outcome, Service};
use std::env;
use std::io::{self, BufWriter};

fn main() -> Result<()> {
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                bail!("invalid command-line argument");
            }
        }
    }

    // Diagnostics go to stdout (fmt's default writer); stderr stays reserved
    // for protocol responses.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!(version = fieldstore::VERSION, "fieldstored ready");

    let stdin = io::stdin();
    let stderr = io::stderr();
    let reader = stdin.lock();
    let writer = BufWriter::new(stderr.lock());

    let mut service = Service::new(writer);
    match service.run(reader)? {
        Outcome::Quit => tracing::info!("terminated by quit command"),
        Outcome::EndOfInput => tracing::info!("input stream closed"),
    }

    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: fieldstored\n\
         \n\
         Reads one JSON request per line from stdin and writes one JSON\n\
         response per line to stderr. Commands: run, get, quit.\n\
         Set RUST_LOG to control the diagnostic trace on stdout.\n"
    );
}

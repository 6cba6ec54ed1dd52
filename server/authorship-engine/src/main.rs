//! Binary entrypoint: read one JSON request from stdin, write one JSON report
//! to stdout.
//!
//! Output is either a Report or, when the request cannot be parsed, an
//! ErrorOutput (exit code 1). Logs go to stderr; set RUST_LOG to see them.

use std::io::{self, Read, Write};

use authorship_engine::types::ErrorOutput;
use authorship_engine::Engine;
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let mut input = String::new();
  if let Err(e) = io::stdin().read_to_string(&mut input) {
    let _ = writeln!(io::stderr(), "authorship-engine: read error: {}", e);
    std::process::exit(1);
  }

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  let engine = Engine::with_defaults();

  let code = match engine.analyze_json(&input) {
    Ok(report) => {
      let _ = serde_json::to_writer(&mut out, &report);
      0
    }
    Err(e) => {
      let err = ErrorOutput::new(e.to_string());
      let _ = serde_json::to_writer(&mut out, &err);
      1
    }
  };
  let _ = writeln!(out);
  let _ = out.flush();
  drop(out);
  std::process::exit(code);
}

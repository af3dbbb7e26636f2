use anyhow::Result;
use codetime_core::{format_duration, parse_event_line, CodeTime, Config, FileDescriptor, HostEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Bridges an editor to the tracker: one JSON event per stdin line until EOF
/// or Ctrl-C. Status refreshes are written to stderr.
pub async fn run(config: Config, active_file: Option<FileDescriptor>) -> Result<()> {
    let mut app = CodeTime::open(config)?;
    app.activate(active_file, |status| {
        eprintln!("{}  ({})", status.text, status.tooltip);
    });

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        buf.clear();
        tokio::select! {
            read = stdin.read_until(b'\n', &mut buf) => match read {
                Ok(0) => break,
                Ok(_) => match decode_line(&buf) {
                    Ok(Some(event)) => event.dispatch(app.tracker()),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping event"),
                },
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    app.deactivate();
    println!("Today: {}", format_duration(app.today_stats().total_seconds));
    Ok(())
}

// Bytes that are not UTF-8 become replacement characters and fail as JSON.
fn decode_line(raw: &[u8]) -> Result<Option<HostEvent>> {
    parse_event_line(&String::from_utf8_lossy(raw))
}

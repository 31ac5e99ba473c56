use crate::impairment::Rates;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{info, warn};

/// Grammar: whitespace-separated `keyword=value` tokens, one per rate.
/// Unknown keywords and out-of-range values are rejected per-token with a
/// warning; the rest of the line is still applied.
///
/// Example: `client_drop=25 corruption=10`
fn apply_line(line: &str, rates: &Rates) {
    for token in line.split_whitespace() {
        let Some((field, value)) = token.split_once('=') else {
            warn!(token, "control input: malformed token, expected key=value");
            continue;
        };
        let Ok(value) = value.parse::<u32>() else {
            warn!(token, "control input: value is not a non-negative integer");
            continue;
        };
        let Ok(value) = u8::try_from(value) else {
            warn!(token, "control input: value out of range [0,100]");
            continue;
        };
        if !rates.set(field, value) {
            warn!(token, "control input: unknown field or value out of range");
        } else {
            info!(field, value, "control input: rate updated");
        }
    }
}

/// Reads lines from `input` until EOF or `shutdown` fires, applying each
/// one to `rates`. Generic over `AsyncBufRead` so production code can pass
/// stdin while tests pass an in-memory buffer, accepting updates
/// concurrently with the data plane.
pub async fn run<R: AsyncBufRead + Unpin>(
    input: R,
    rates: Arc<Rates>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => apply_line(&line, &rates),
                    Ok(None) => {
                        info!("control input reached EOF");
                        break;
                    }
                    Err(err) => {
                        warn!(%err, "control input read error");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("shutdown signal received, stopping control input");
                break;
            }
        }
    }
}

//! Courier CLI library
//!
//! Argument parsing, output formatting and the request runner behind the
//! `courier` binary.

pub mod args;
pub mod cli;
pub mod error;
pub mod output;

use std::io::Write;
use std::sync::Arc;

use courier_http::{Client, Event, HttpError};

pub use cli::{Cli, OutputFormat};
pub use error::{CliError, Exit};

use output::{write_output, BodyOutput, EventOutput};

/// Send the request described by `cli` and write its body, or its events,
/// to `out`.
///
/// Non-2xx responses are written before returning [`CliError::Status`].
pub async fn run<W: Write>(cli: &Cli, mut out: W) -> Result<(), CliError> {
    let config = cli.load_config()?;
    let client = Client::with_config(config.client_config()?)
        .map_err(|e| CliError::config(format!("failed to create client: {e}")))?;

    let options = cli.request_options(&client)?;
    tracing::debug!(method = %options.method, url = %options.url, "sending request");
    let mut handle = client.execute(options)?;

    let outcome = if cli.events {
        loop {
            let Some(event) = handle.next_event().await else {
                break Err(Arc::new(HttpError::Aborted));
            };
            write_output(cli.format, &EventOutput(&event), &mut out)?;
            if let Event::Complete(outcome) = event {
                break outcome;
            }
        }
    } else {
        let outcome = handle.complete().await;
        if let Ok(response) = &outcome {
            write_output(cli.format, &BodyOutput(response), &mut out)?;
        }
        outcome
    };

    let response = outcome?;
    if response.is_success() {
        Ok(())
    } else {
        Err(CliError::Status {
            status: response.status,
        })
    }
}

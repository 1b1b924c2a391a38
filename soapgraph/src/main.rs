use std::{io::Write, time::Duration};

use structopt::StructOpt;
use thiserror::Error;
use tracing::{info, Level};

use soapgraph_util as util;
use soapgraph_wsdl as wsdl;

#[derive(Debug, Error)]
enum Error {
    #[error("Error building WSDL document")]
    ParseError(#[from] wsdl::error::Error),

    #[error("Error setting up transport")]
    TransportError(#[from] util::Error),

    #[error("Error writing output")]
    IoError(#[from] std::io::Error),
}

#[derive(StructOpt)]
struct Args {
    /// Request timeout in seconds for remote documents
    #[structopt(long)]
    timeout: Option<u64>,

    /// Raise the log level; repeat for more detail
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    input: String,
}

fn level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(level(args.verbose))
        .with_writer(std::io::stderr)
        .init();

    let transport = match args.timeout {
        Some(seconds) => util::Transport::with_timeout(Duration::from_secs(seconds))?,
        None => util::Transport::new(),
    };

    let document = wsdl::Document::load(&args.input, &transport)?;
    info!(
        definitions = document.registry().len(),
        services = document.services().len(),
        "document resolved"
    );

    let stdout = std::io::stdout();
    write!(stdout.lock(), "{}", document)?;
    Ok(())
}

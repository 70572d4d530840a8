use std::io::{Error, ErrorKind};

use clap::Parser;
use log::error;

use frontdoor::args::Args;
use frontdoor::{logging, server};

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let level = args.log_level().map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
    logging::init(level);

    let config = args.into_config().map_err(|err| {
        error!("{}", err);
        Error::new(ErrorKind::InvalidInput, err)
    })?;

    server::listen_http(config).map_err(|err| {
        error!("Server stopped: {}", err);
        err
    })
}

//! pdp: diagnostic PCR primer design pipeline.

use std::process::ExitCode;

use pdp_core::constants::exit_codes;
use pdp_lib::{app, config, logging};

fn main() -> ExitCode {
    let config = config::AppConfig::parse();
    if let Err(e) = logging::init(&config.common) {
        eprintln!("Error: {e:#}");
        return code(exit_codes::ERROR_CONFIG);
    }
    code(app::run(&config))
}

fn code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status).unwrap_or(1))
}

#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    sitegate_core::tracing_setup::init_tracing();
    let code = sitegate_cli::run(std::env::args_os());
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}

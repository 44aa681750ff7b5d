use askpdf::cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    ExitCode::from(cli::run().await as u8)
}

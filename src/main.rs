//! jornada main entrypoint.

use jornada::errors::AppError;
use jornada::{init_tracing, run};

#[tokio::main]
async fn main() {
    init_tracing();
    println!();
    match run().await {
        Ok(()) => {}
        // already reported with its context by the punch command
        Err(AppError::Punch(_)) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

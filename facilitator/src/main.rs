//! x402 bridging facilitator server.
//!
//! Verifies x402 payments on the network they name and settles every payment
//! on a single origin network, bridging funds there first when needed.

mod config;
mod run;

#[tokio::main]
async fn main() {
    if let Err(e) = run::run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

//! Stage a merge candidate, show the diff, then commit or discard it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example merge_config -- 192.168.1.1 admin admin ./snippet.cfg
//! ```
//!
//! Pass `--commit` as a fifth argument to apply the change; without it the
//! candidate is discarded after the diff is printed.

use std::env;
use std::path::PathBuf;

use dellos10::{DriverBuilder, Error};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!("usage: merge_config <host> <user> <password> <file> [--commit]");
        std::process::exit(1);
    }
    let file = PathBuf::from(&args[4]);
    let apply = args.get(5).is_some_and(|a| a == "--commit");

    let mut driver = DriverBuilder::new(&args[1])
        .username(&args[2])
        .password(&args[3])
        .connect()
        .await?;

    driver.load_merge_candidate(Some(&file), None).await?;

    let diff = driver.compare_candidate().await?;
    if diff.is_empty() {
        println!("No changes.");
    } else {
        println!("Commands to apply:\n{}", diff.commands());
    }

    if apply && !diff.additions.is_empty() {
        match driver.commit().await {
            Ok(()) => println!("Committed."),
            Err(Error::MergeConfig { message, .. }) => {
                eprintln!("{}", message);
                driver.discard().await?;
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        driver.discard().await?;
        println!("Candidate discarded.");
    }

    driver.close().await?;
    Ok(())
}

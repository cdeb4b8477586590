//! Collect facts from an OS10 switch and print them as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example getters -- --host 192.168.1.1 --user admin --password admin
//! ```
//!
//! Set `RUST_LOG=debug` to see every command sent to the device.

use std::env;

use dellos10::DriverBuilder;
use dellos10::facts::PingOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}...", args.host);
    let mut driver = DriverBuilder::new(&args.host)
        .username(&args.user)
        .password(&args.password)
        .connect()
        .await?;

    let facts = driver.get_facts().await?;
    println!("facts:\n{}", serde_json::to_string_pretty(&facts)?);

    let interfaces = driver.get_interfaces_ip().await?;
    println!("interface addresses:\n{}", serde_json::to_string_pretty(&interfaces)?);

    // Disabled features come back as {"response": "..."}
    let lldp = driver.get_lldp_neighbors().await?;
    println!("lldp:\n{}", serde_json::to_string_pretty(&lldp)?);

    let bgp = driver.get_bgp_neighbors().await?;
    println!("bgp:\n{}", serde_json::to_string_pretty(&bgp)?);

    if let Some(target) = &args.ping {
        let result = driver.ping(target, &PingOptions::default()).await?;
        println!("ping {}:\n{}", target, serde_json::to_string_pretty(&result)?);
    }

    driver.close().await?;
    Ok(())
}

struct Args {
    host: String,
    user: String,
    password: String,
    ping: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut user = "admin".to_string();
        let mut password = "admin".to_string();
        let mut ping = None;

        let mut i = 1;
        while i + 1 < args.len() {
            let value = args[i + 1].clone();
            match args[i].as_str() {
                "--host" | "-h" => host = value,
                "--user" | "-u" => user = value,
                "--password" | "-P" => password = value,
                "--ping" => ping = Some(value),
                other => eprintln!("Unknown argument: {}", other),
            }
            i += 2;
        }

        Self {
            host,
            user,
            password,
            ping,
        }
    }
}

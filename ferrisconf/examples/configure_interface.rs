//! Junos interface configuration example
//!
//! Connects over NETCONF, prints device facts, sets an interface description
//! inside a lock/load/commit transaction and reads the section back.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example configure_interface -- --host 192.0.2.10 --user admin --password secret \
//!     --interface ge-0/0/1 --description "to core"
//! ```
//!
//! With a provider settings file:
//! ```bash
//! cargo run --example configure_interface -- --config device.json --interface ge-0/0/1
//! ```

use std::env;
use std::path::PathBuf;

use ferrisconf::{Batch, ClientBuilder, ClientConfig, DeviceLock, resource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let builder = if let Some(path) = &args.config {
        let config: ClientConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        ClientBuilder::from_config(config)
    } else {
        let mut builder = ClientBuilder::new(&args.host)
            .port(args.port)
            .username(&args.user);
        if let Some(password) = &args.password {
            builder = builder.password(password);
        }
        if let Some(key) = &args.key {
            builder = builder.private_key_file(key);
        }
        builder
    };
    let client = builder.build()?;
    let lock = DeviceLock::new();

    println!("=== Ferrisconf Junos Example ===\n");
    println!("Connecting to {}...", client.ssh_config().socket_addr());

    let mut session = client.open_session().await?;
    let facts = session.facts();
    println!(
        "Connected to {} ({} running {} {}, serial {})\n",
        facts.host_name(),
        facts.hardware_model(),
        facts.os_name(),
        facts.os_version(),
        facts.serial_number()
    );

    let path = format!("interfaces {}", args.interface);
    let existed = resource::exists(&mut session, &path).await?;
    println!("{} {}", path, if existed { "exists" } else { "is not configured" });
    client.close_session(session).await?;

    let mut batch = Batch::new();
    batch.push_set(format!("{} description \"{}\"", path, args.description));

    let outcome = client
        .configure(&lock, &batch, "ferrisconf example")
        .await?;
    println!("Committed {} line(s)", batch.len());
    for warning in &outcome.warnings {
        println!("  warning: {}", warning);
    }

    println!("\n--- {} ---", path);
    let dump = client.read(&lock, &path).await?;
    for line in dump.lines() {
        println!("{}", line);
    }

    Ok(())
}

struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    config: Option<PathBuf>,
    interface: String,
    description: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 830u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = None;
        let mut key = None;
        let mut config = None;
        let mut interface = "ge-0/0/1".to_string();
        let mut description = "managed by ferrisconf".to_string();

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => host = value.unwrap_or(host),
                "--port" | "-p" => port = value.and_then(|v| v.parse().ok()).unwrap_or(port),
                "--user" | "-u" => user = value.unwrap_or(user),
                "--password" | "-P" => password = value,
                "--key" | "-k" => key = value.map(PathBuf::from),
                "--config" | "-c" => config = value.map(PathBuf::from),
                "--interface" | "-i" => interface = value.unwrap_or(interface),
                "--description" | "-d" => description = value.unwrap_or(description),
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        Self {
            host,
            port,
            user,
            password,
            key,
            config,
            interface,
            description,
        }
    }

    fn print_help() {
        println!(
            r#"ferrisconf interface configuration example

USAGE:
    cargo run --example configure_interface -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Target host [default: localhost]
    -p, --port <PORT>          NETCONF port [default: 830]
    -u, --user <USER>          Username [default: $USER]
    -P, --password <PASS>      Password for authentication
    -k, --key <PATH>           Path to SSH private key
    -c, --config <PATH>        JSON provider settings (overrides the options above)
    -i, --interface <NAME>     Interface to configure [default: ge-0/0/1]
    -d, --description <TEXT>   Description to set
    --help                     Print this help message

EXAMPLES:
    # Debug logging, including every RPC
    RUST_LOG=ferrisconf=trace cargo run --example configure_interface -- --host fw1 --user admin --password secret
"#
        );
    }
}

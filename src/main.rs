//! CLI for RelayBus
//!
//! Subcommands:
//! - `broker`: run the broker
//! - `publisher`: create a topic and publish each line read from stdin
//! - `subscriber`: subscribe to a topic by name and print what arrives

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use relaybus::broker::Broker;
use relaybus::client::{Client, ClientRole};
use relaybus::config::{Settings, load_config};
use relaybus::transport::start_tcp_server;
use relaybus::utils::{BrokerError, logging};

#[derive(Parser)]
#[command(name = "relaybus", about = "Minimal publish/subscribe broker")]
struct Cli {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info", env = "RELAYBUS_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the broker
    Broker {
        #[command(flatten)]
        endpoint: Endpoint,
    },
    /// Create a topic and publish every stdin line to it
    Publisher {
        #[command(flatten)]
        endpoint: Endpoint,
        /// Client name (defaults to the configured client name)
        #[arg(long)]
        name: Option<String>,
        /// Name of the topic to create
        #[arg(long)]
        topic: String,
    },
    /// Subscribe to a topic by name and print incoming messages
    Subscriber {
        #[command(flatten)]
        endpoint: Endpoint,
        /// Client name (defaults to the configured client name)
        #[arg(long)]
        name: Option<String>,
        /// Name of the topic to subscribe to
        #[arg(long)]
        topic: String,
    },
}

#[derive(Args)]
struct Endpoint {
    /// Address to bind (broker) or connect to (clients)
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

impl Endpoint {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let result = match load_config() {
        Ok(settings) => run(cli.command, settings).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("relaybus failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command, mut settings: Settings) -> Result<(), BrokerError> {
    match command {
        Command::Broker { endpoint } => {
            endpoint.apply(&mut settings);
            run_broker(settings).await
        }
        Command::Publisher {
            endpoint,
            name,
            topic,
        } => {
            endpoint.apply(&mut settings);
            let name = name.unwrap_or_else(|| settings.client.name.clone());
            run_publisher(&settings, &name, &topic).await
        }
        Command::Subscriber {
            endpoint,
            name,
            topic,
        } => {
            endpoint.apply(&mut settings);
            let name = name.unwrap_or_else(|| settings.client.name.clone());
            run_subscriber(&settings, &name, &topic).await
        }
    }
}

async fn run_broker(settings: Settings) -> Result<(), BrokerError> {
    let broker = Arc::new(Broker::new());

    tokio::select! {
        result = start_tcp_server(broker, &settings) => {
            error!("Broker server exited unexpectedly.");
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    }
}

fn server_addr(settings: &Settings) -> String {
    format!("{}:{}", settings.server.host, settings.server.port)
}

async fn run_publisher(settings: &Settings, name: &str, topic: &str) -> Result<(), BrokerError> {
    let (client, _deliveries) = Client::connect(
        &server_addr(settings),
        name,
        ClientRole::Publisher,
        settings.broker.max_frame_bytes,
    )
    .await?;

    let topic = client.create_topic(topic).await?;
    println!("[Topic created] {topic}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if client.publish(&topic, &line).await? {
            println!("[Info] published");
        } else {
            warn!("Topic {topic} no longer exists");
        }
    }

    client.disconnect();
    Ok(())
}

async fn run_subscriber(settings: &Settings, name: &str, topic: &str) -> Result<(), BrokerError> {
    let (client, mut deliveries) = Client::connect(
        &server_addr(settings),
        name,
        ClientRole::Subscriber,
        settings.broker.max_frame_bytes,
    )
    .await?;

    let topics = client.list_topics().await?;
    println!("[Topic List]");
    for (index, t) in topics.iter().enumerate() {
        println!(" {index}. {}", t.name);
    }

    let Some(topic_id) = client.find_topic_id(topic) else {
        error!("No topic named {topic:?} on the broker");
        return Ok(());
    };
    if !client.subscribe(topic_id).await? {
        error!("Topic {topic:?} disappeared before subscribing");
        return Ok(());
    }
    println!("[Info] subscribed to {topic}");

    loop {
        tokio::select! {
            delivery = deliveries.recv() => match delivery {
                Some(message) => println!(
                    "[New Message from \"{}\" in topic \"{}\" at {}]\n{}",
                    message.publisher.name, message.topic.name, message.timestamp, message.content
                ),
                None => {
                    warn!("Connection to the broker has been lost");
                    return Err(BrokerError::ConnectionClosed);
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Err(e) = client.unsubscribe(topic_id).await {
        warn!("Failed to unsubscribe: {e}");
    }
    client.disconnect();
    Ok(())
}

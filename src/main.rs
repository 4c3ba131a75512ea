// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, Transport};
use serde::Deserialize;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use concord_bridge::homeassistant::{self, ZoneDiscovery};
use concord_bridge::{ClientConfig, ConcordClient, PanelEvent, PanelIdentity, Zone};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "concord2mqtt", version)]
#[command(about = "Bridge between a Concord alarm panel and Home Assistant over MQTT")]
struct Cli {
    /// Path to the TOML configuration file. When omitted the usual locations
    /// are searched and built-in defaults are used if none exists.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device, overriding the configuration
    #[arg(long)]
    device: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

const CONFIG_FILE_NAME: &str = "concord.toml";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
struct Config {
    device: String,
    log_level: Option<String>,
    read_timeout_ms: u64,
    mqtt: MqttToml,
    homeassistant: HomeAssistantToml,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            log_level: None,
            read_timeout_ms: 125,
            mqtt: MqttToml::default(),
            homeassistant: HomeAssistantToml::default(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
struct MqttToml {
    #[serde(alias = "broker")]
    url: String,
    client_id: String,
    username: Option<String>,
    password: Option<String>,
    republish_interval_secs: u64,
}

impl Default for MqttToml {
    fn default() -> Self {
        Self {
            url: "tcp://localhost:1883".to_string(),
            client_id: "concord".to_string(),
            username: None,
            password: None,
            republish_interval_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
struct HomeAssistantToml {
    status_topic: String,
    discover_base: String,
}

impl Default for HomeAssistantToml {
    fn default() -> Self {
        Self {
            status_topic: "hass/status".to_string(),
            discover_base: "homeassistant".to_string(),
        }
    }
}

/// Candidate config files, in search order.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/concord").join(CONFIG_FILE_NAME)];
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        paths.push(home.join(".concord").join(CONFIG_FILE_NAME));
        paths.push(home.join(".config/concord").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).context("Failed to parse config file")
}

/// Load the explicit config file, or the first one found on the search path.
fn load_config(explicit: Option<&PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.clone()),
        None => config_search_paths().into_iter().find(|p| p.is_file()),
    };
    let Some(path) = path else {
        return Ok((Config::default(), None));
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Ok((parse_config(&text)?, Some(path)))
}

/// Apply `CONCORD_*` overrides. `lookup` is `std::env::var` outside tests.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let set = |target: &mut String, key: &str| {
        if let Some(v) = lookup(key) {
            *target = v;
        }
    };
    set(&mut config.device, "CONCORD_DEVICE");
    set(&mut config.mqtt.url, "CONCORD_MQTT_BROKER");
    set(&mut config.mqtt.url, "CONCORD_MQTT_URL");
    set(&mut config.mqtt.client_id, "CONCORD_MQTT_CLIENT_ID");
    set(
        &mut config.homeassistant.status_topic,
        "CONCORD_HOMEASSISTANT_STATUS_TOPIC",
    );
    set(
        &mut config.homeassistant.discover_base,
        "CONCORD_HOMEASSISTANT_DISCOVER_BASE",
    );
    if let Some(v) = lookup("CONCORD_LOG_LEVEL") {
        config.log_level = Some(v);
    }
    if let Some(v) = lookup("CONCORD_MQTT_USERNAME") {
        config.mqtt.username = Some(v);
    }
    if let Some(v) = lookup("CONCORD_MQTT_PASSWORD") {
        config.mqtt.password = Some(v);
    }
}

fn build_client_config(config: &Config) -> ClientConfig {
    ClientConfig::builder()
        .device(&config.device)
        .read_timeout_ms(config.read_timeout_ms)
        .build()
}

fn build_mqtt_options(mqtt: &MqttToml) -> Result<MqttOptions> {
    let broker = parse_mqtt_url(&mqtt.url)?;
    let mut opts = MqttOptions::new(&mqtt.client_id, broker.host, broker.port);
    if broker.tls {
        opts.set_transport(Transport::tls_with_default_config());
    }
    opts.set_keep_alive(Duration::from_secs(30));
    opts.set_clean_session(true);
    if let Some(username) = mqtt.username.as_deref().filter(|u| !u.is_empty()) {
        opts.set_credentials(username, mqtt.password.clone().unwrap_or_default());
    }
    Ok(opts)
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

async fn publish_retained(client: &AsyncClient, topic: String, payload: impl Into<Vec<u8>>) {
    if let Err(e) = client.publish(&topic, QoS::AtLeastOnce, true, payload).await {
        error!("Failed to publish to {topic}: {e}");
    }
}

async fn publish_state(client: &AsyncClient, discover_base: &str, zone: &Zone) {
    let topic = homeassistant::state_topic(discover_base, zone.id);
    publish_retained(client, topic, homeassistant::state_payload(zone)).await;
}

/// Publish the discovery document and current state for one zone.
async fn publish_zone(
    client: &AsyncClient,
    discover_base: &str,
    zone: &Zone,
    identity: Option<&PanelIdentity>,
) {
    let Some(identity) = identity else {
        warn!("Attempt to publish zones without panel definition");
        return;
    };

    let doc = ZoneDiscovery::new(discover_base, zone, identity);
    match serde_json::to_string(&doc) {
        Ok(json) => {
            let topic = homeassistant::config_topic(discover_base, zone.id);
            publish_retained(client, topic, json).await;
        }
        Err(e) => error!("Failed to serialize discovery document: {e}"),
    }
    publish_state(client, discover_base, zone).await;
}

async fn publish_all(client: &AsyncClient, discover_base: &str, concord: &ConcordClient) {
    let identity = concord.panel_identity();
    let mut zones = concord.zones().await;
    zones.sort_by_key(|z| z.id);
    debug!("Publishing {} zones", zones.len());
    for zone in &zones {
        publish_zone(client, discover_base, zone, identity.as_ref()).await;
    }
}

// ---------------------------------------------------------------------------
// Panel event → MQTT
// ---------------------------------------------------------------------------

async fn handle_panel_event(
    event: PanelEvent,
    client: &AsyncClient,
    discover_base: &str,
    concord: &ConcordClient,
) {
    match event {
        PanelEvent::ZoneDefined(zone) => {
            publish_zone(client, discover_base, &zone, concord.panel_identity().as_ref()).await;
        }
        PanelEvent::ZoneUpdated {
            zone,
            previous_status,
        } => {
            debug!(
                "Zone {} ({}) {} -> {} {:?}",
                zone.id,
                zone.name,
                previous_status,
                zone.status,
                zone.flags()
            );
            publish_state(client, discover_base, &zone).await;
        }
        PanelEvent::PanelDefined(identity) => {
            info!(
                "Panel {} serial {} defined, publishing zones",
                identity.panel_type, identity.serial_number
            );
            publish_all(client, discover_base, concord).await;
        }
    }
}

/// Drive the MQTT connection, forwarding Home Assistant status messages.
///
/// The status topic is (re)subscribed on every ConnAck since rumqttc does
/// not restore subscriptions after a broker reconnect.
fn spawn_mqtt_task(
    mut eventloop: rumqttc::EventLoop,
    client: AsyncClient,
    status_topic: String,
    status_tx: mpsc::Sender<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("MQTT: connected, subscribing to {status_topic}");
                    if let Err(e) = client.subscribe(&status_topic, QoS::AtMostOnce).await {
                        error!("Failed to subscribe to {status_topic}: {e}");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(msg))) if msg.topic == status_topic => {
                    let payload = String::from_utf8_lossy(&msg.payload).into_owned();
                    if status_tx.send(payload).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT event loop error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_path) = load_config(cli.config.as_ref())?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Some(device) = cli.device {
        config.device = device;
    }

    // RUST_LOG controls verbosity unless the config sets log_level. Default: info.
    let env_filter = match config.log_level.as_deref().filter(|l| !l.is_empty()) {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log_level {level:?}"))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match &config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let discover_base = config.homeassistant.discover_base.clone();
    let status_topic = config.homeassistant.status_topic.clone();

    // Set up MQTT
    let mqtt_opts = build_mqtt_options(&config.mqtt)?;
    let (client, eventloop) = AsyncClient::new(mqtt_opts, 256);
    let (status_tx, mut status_rx) = mpsc::channel(16);
    let mqtt_handle = spawn_mqtt_task(eventloop, client.clone(), status_topic.clone(), status_tx);

    // Open the panel link
    let mut concord = ConcordClient::open(build_client_config(&config))
        .context("Failed to open panel link")?;
    let mut events = concord
        .take_events()
        .context("Panel event receiver unavailable")?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut ticker = interval(Duration::from_secs(config.mqtt.republish_interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the immediate first tick; zones are published as they are defined
    ticker.tick().await;

    info!("MQTT bridge running. Send SIGINT/SIGTERM to stop.");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => handle_panel_event(event, &client, &discover_base, &concord).await,
                None => {
                    error!("Panel event stream ended");
                    break;
                }
            },
            Some(status) = status_rx.recv() => {
                info!("Home Assistant status: {status}");
                if status == "online" {
                    publish_all(&client, &discover_base, &concord).await;
                }
            }
            _ = ticker.tick() => {
                info!("Republishing zones");
                publish_all(&client, &discover_base, &concord).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
        }
    }

    if let Err(e) = client.unsubscribe(&status_topic).await {
        warn!("Failed to unsubscribe from {status_topic}: {e}");
    }
    let closed = concord.close().await;
    if let Err(e) = client.disconnect().await {
        warn!("MQTT disconnect failed: {e}");
    }
    // Give the event loop a moment to flush the disconnect
    tokio::time::sleep(Duration::from_millis(250)).await;
    mqtt_handle.abort();

    match closed {
        Err(e) if e.is_link_failure() => {
            return Err(anyhow::Error::new(e).context("Panel link failed"));
        }
        Err(e) => warn!("Panel client closed with error: {e}"),
        Ok(()) => {}
    }
    info!("Shutdown complete");
    Ok(())
}

/// Broker address parsed from the `mqtt.url` setting.
#[derive(Debug, PartialEq)]
struct BrokerAddr {
    host: String,
    port: u16,
    tls: bool,
}

/// Parse an MQTT URL like "tcp://host:port" or "ssl://host:port".
///
/// `tcp` and `mqtt` are plain connections, `ssl`, `tls` and `mqtts` use TLS.
/// A bare "host:port" is plain.
fn parse_mqtt_url(url: &str) -> Result<BrokerAddr> {
    let (tls, stripped) = match url.split_once("://") {
        Some(("tcp" | "mqtt", rest)) => (false, rest),
        Some(("ssl" | "tls" | "mqtts", rest)) => (true, rest),
        Some((scheme, _)) => anyhow::bail!("Unsupported MQTT URL scheme {scheme:?} in {url}"),
        None => (false, url),
    };

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format tcp://host:port")?;
    anyhow::ensure!(!host.is_empty(), "MQTT URL has no host: {url}");

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok(BrokerAddr {
        host: host.to_string(),
        port,
        tls,
    })
}

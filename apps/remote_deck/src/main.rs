use std::{net::Ipv4Addr, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    discovery::local_subnet_prefix, grid, Delivery, DeviceScanner, RemoteDeck, SensitivityKind,
    TriggerOutcome, UploadObserver, WidgetTrigger,
};
use shared::{
    domain::{GridPosition, GridSize, WidgetId},
    protocol::{MouseButton, ScrollGestureState},
};
use storage::{SettingsStore, Storage};
use tokio::task::JoinHandle;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;

#[derive(Parser, Debug)]
#[command(name = "remote-deck", about = "Drive a remote-control server from the terminal")]
struct Cli {
    /// Config file; defaults to ./remote_deck.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Use this server for one run without saving it.
    #[arg(long, global = true)]
    device_ip: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List widget scripts.
    Catalog {
        #[arg(long)]
        search: Option<String>,
    },
    Profiles,
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    Widgets {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Show the free cells of the selection grid.
    Slots {
        #[arg(long)]
        profile: Option<String>,
    },
    Place {
        label: String,
        row: u32,
        col: u32,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        profile: Option<String>,
    },
    Remove {
        widget_id: Uuid,
        #[arg(long)]
        profile: Option<String>,
    },
    /// Tap a button widget of the active profile.
    Tap {
        label: String,
    },
    Type {
        text: String,
    },
    Move {
        #[arg(allow_hyphen_values = true)]
        dx: f32,
        #[arg(allow_hyphen_values = true)]
        dy: f32,
    },
    Scroll {
        #[arg(allow_hyphen_values = true)]
        amount: f32,
    },
    Hscroll {
        state: GestureArg,
        #[arg(allow_hyphen_values = true)]
        dx: f32,
    },
    Click {
        #[arg(default_value = "left")]
        button: ButtonArg,
    },
    Key {
        key: String,
    },
    Media {
        key: String,
    },
    /// Press a `+`-separated combination such as `ctrl+shift+t`.
    Hotkey {
        combo: String,
    },
    OpenFolder,
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Look for servers on the local network.
    Scan {
        /// First three octets to scan, e.g. `192.168.1`.
        #[arg(long)]
        prefix: Option<String>,
    },
    SetIp {
        ip: String,
    },
    /// Show sensitivities, or set one.
    Sensitivity {
        kind: Option<SensitivityArg>,
        value: Option<f32>,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    Create { name: String },
    Delete { name: String },
    Use { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ButtonArg {
    Left,
    Middle,
    Right,
}

impl From<ButtonArg> for MouseButton {
    fn from(value: ButtonArg) -> Self {
        match value {
            ButtonArg::Left => Self::Left,
            ButtonArg::Middle => Self::Middle,
            ButtonArg::Right => Self::Right,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GestureArg {
    Start,
    Drag,
    End,
}

impl From<GestureArg> for ScrollGestureState {
    fn from(value: GestureArg) -> Self {
        match value {
            GestureArg::Start => Self::Start,
            GestureArg::Drag => Self::Drag,
            GestureArg::End => Self::End,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SensitivityArg {
    Pointer,
    Vertical,
    Horizontal,
}

impl From<SensitivityArg> for SensitivityKind {
    fn from(value: SensitivityArg) -> Self {
        match value {
            SensitivityArg::Pointer => Self::Pointer,
            SensitivityArg::Vertical => Self::VerticalScroll,
            SensitivityArg::Horizontal => Self::HorizontalScroll,
        }
    }
}

struct ConsoleObserver;

impl UploadObserver for ConsoleObserver {
    fn status(&self, message: &str) {
        println!("{message}");
    }

    fn progress(&self, fraction: f32) {
        debug!(percent = (fraction * 100.0).round(), "upload progress");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref());
    if let Some(url) = cli.database_url {
        settings.database_url = config::normalize_database_url(&url);
    }
    if let Some(ip) = cli.device_ip {
        settings.device_ip = Some(ip);
    }

    if let Command::Catalog { search } = &cli.command {
        print_catalog(search.as_deref());
        return Ok(());
    }

    let store: Arc<dyn SettingsStore> = Arc::new(Storage::new(&settings.database_url).await?);
    let mut deck = RemoteDeck::open(store).await?;
    if let Some(ip) = settings.device_ip.as_deref() {
        deck.retarget(ip);
    }

    run(&mut deck, cli.command).await
}

async fn run(deck: &mut RemoteDeck, command: Command) -> Result<()> {
    match command {
        Command::Catalog { search } => print_catalog(search.as_deref()),
        Command::Profiles => {
            for profile in deck.profiles().profiles() {
                let marker = if profile.name == deck.profiles().active_name() {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {} ({} widgets)", profile.name, profile.widgets.len());
            }
        }
        Command::Profile { action } => {
            let profiles = deck.profiles_mut();
            match action {
                ProfileAction::Create { name } => {
                    profiles.create_profile(&name).await?;
                    println!("created profile {}", name.trim());
                }
                ProfileAction::Delete { name } => {
                    let removed = profiles.delete_profile(&name).await?;
                    println!(
                        "deleted profile {}; active is {}",
                        removed.name,
                        profiles.active_name()
                    );
                }
                ProfileAction::Use { name } => {
                    profiles.set_active(&name).await?;
                    println!("active profile is {}", profiles.active_name());
                }
            }
        }
        Command::Widgets { profile } => {
            let profile = target_profile(deck, profile.as_deref())?;
            for widget in &profile.widgets {
                println!(
                    "{} {:<20} at {} size {}",
                    widget.id, widget.script.label, widget.position, widget.size
                );
            }
        }
        Command::Slots { profile } => {
            let profile = target_profile(deck, profile.as_deref())?;
            let slots = grid::empty_slots(&profile.widgets);
            let listed: Vec<String> = slots.iter().map(ToString::to_string).collect();
            println!("{} free: {}", slots.len(), listed.join(" "));
        }
        Command::Place {
            label,
            row,
            col,
            width,
            height,
            profile,
        } => {
            let profile = profile_name(deck, profile);
            let size = match (width, height) {
                (None, None) => None,
                (width, height) => Some(GridSize::new(width.unwrap_or(1), height.unwrap_or(1))?),
            };
            let id = deck
                .profiles_mut()
                .add_catalog_widget(&profile, &label, GridPosition::new(row, col), size)
                .await?;
            println!("placed {label} in {profile} as {id}");
        }
        Command::Remove { widget_id, profile } => {
            let profile = profile_name(deck, profile);
            let removed = deck
                .profiles_mut()
                .delete_widget(&profile, WidgetId(widget_id))
                .await?;
            println!("removed {} from {profile}", removed.script.label);
        }
        Command::Tap { label } => {
            let widget = deck
                .profiles()
                .active_profile()
                .widgets
                .iter()
                .find(|widget| widget.script.label.eq_ignore_ascii_case(&label))
                .ok_or_else(|| anyhow!("no widget labelled '{label}' in the active profile"))?;
            match deck.trigger(widget.id, WidgetTrigger::Tap)? {
                TriggerOutcome::Sent(handle) => report(handle).await?,
                TriggerOutcome::PickFiles => println!("use `remote-deck upload <files>` to send files"),
                TriggerOutcome::Ignored => println!("{label} does nothing when tapped"),
            }
        }
        Command::Type { text } => report(deck.dispatch().send_text(&text)).await?,
        Command::Move { dx, dy } => report(deck.dispatch().move_pointer(dx, dy)).await?,
        Command::Scroll { amount } => report(deck.dispatch().scroll_vertical(amount)).await?,
        Command::Hscroll { state, dx } => {
            report(deck.dispatch().scroll_horizontal(state.into(), dx)).await?
        }
        Command::Click { button } => report(deck.dispatch().click_mouse(button.into())).await?,
        Command::Key { key } => report(deck.dispatch().press_key(&key)).await?,
        Command::Media { key } => report(deck.dispatch().press_media_key(&key)).await?,
        Command::Hotkey { combo } => report(deck.dispatch().press_hotkey(&combo)).await?,
        Command::OpenFolder => report(deck.dispatch().open_folder()).await?,
        Command::Upload { files } => {
            let summary = deck
                .dispatch()
                .upload_files(&files, Arc::new(ConsoleObserver))
                .await;
            if !summary.all_sent() {
                bail!("{} of {} files failed", summary.total - summary.sent, summary.total);
            }
        }
        Command::Scan { prefix } => {
            let prefix = match prefix {
                Some(prefix) => parse_prefix(&prefix)?,
                None => local_subnet_prefix()
                    .context("could not detect the local subnet; pass --prefix")?,
            };
            let [a, b, c] = prefix;
            println!("scanning {a}.{b}.{c}.1-254 ...");
            let scanner = DeviceScanner::new()?;
            let devices = scanner.scan(prefix).await.unwrap_or_default();
            if devices.is_empty() {
                println!("no servers found");
            }
            for device in devices {
                println!("{}  {}", device.ip, device.hostname);
            }
        }
        Command::SetIp { ip } => {
            deck.set_device_ip(&ip).await?;
            println!("device ip set to {}", deck.settings().device_ip);
        }
        Command::Sensitivity { kind, value } => match (kind, value) {
            (Some(kind), Some(value)) => {
                deck.set_sensitivity(kind.into(), value).await?;
                println!("{kind:?} sensitivity set to {value}");
            }
            (Some(_), None) => bail!("a value is required to change a sensitivity"),
            _ => {
                let sensitivity = deck.settings().sensitivity;
                println!("pointer    {}", sensitivity.pointer);
                println!("vertical   {}", sensitivity.vertical_scroll);
                println!("horizontal {}", sensitivity.horizontal_scroll);
            }
        },
    }

    Ok(())
}

fn print_catalog(search: Option<&str>) {
    let catalog = client_core::WidgetCatalog::builtin();
    let scripts: Vec<_> = match search {
        Some(query) => catalog.search(query).collect(),
        None => catalog.all_scripts().collect(),
    };
    for script in scripts {
        println!(
            "{:<20} {:?} {:?}",
            script.label, script.kind, script.interaction_mode
        );
    }
}

fn profile_name(deck: &RemoteDeck, profile: Option<String>) -> String {
    profile.unwrap_or_else(|| deck.profiles().active_name().to_string())
}

fn target_profile<'a>(
    deck: &'a RemoteDeck,
    name: Option<&str>,
) -> Result<&'a shared::domain::Profile> {
    match name {
        Some(name) => deck
            .profiles()
            .profile(name)
            .ok_or_else(|| anyhow!("no profile named '{name}'")),
        None => Ok(deck.profiles().active_profile()),
    }
}

fn parse_prefix(raw: &str) -> Result<[u8; 3]> {
    let address: Ipv4Addr = format!("{}.0", raw.trim().trim_end_matches('.'))
        .parse()
        .with_context(|| format!("'{raw}' is not a subnet prefix like 192.168.1"))?;
    let [a, b, c, _] = address.octets();
    Ok([a, b, c])
}

async fn report(handle: JoinHandle<Delivery>) -> Result<()> {
    match handle.await? {
        Delivery::Delivered { .. } => println!("sent"),
        Delivery::Skipped => println!("nothing to send"),
        Delivery::Failed { reason } => bail!("send failed: {reason}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subnet_prefix() {
        assert_eq!(parse_prefix("192.168.1").expect("prefix"), [192, 168, 1]);
        assert_eq!(parse_prefix("10.0.7.").expect("prefix"), [10, 0, 7]);
        assert!(parse_prefix("300.1.1").is_err());
        assert!(parse_prefix("10.0").is_err());
    }

    #[test]
    fn cli_accepts_negative_deltas() {
        let cli = Cli::try_parse_from(["remote-deck", "move", "-5", "3.5"]).expect("parse");
        match cli.command {
            Command::Move { dx, dy } => {
                assert_eq!(dx, -5.0);
                assert_eq!(dy, 3.5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn place_takes_optional_size() {
        let cli = Cli::try_parse_from([
            "remote-deck",
            "place",
            "Touchpad",
            "2",
            "0",
            "--width",
            "4",
            "--height",
            "2",
        ])
        .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Place {
                width: Some(4),
                height: Some(2),
                ..
            }
        ));
    }
}

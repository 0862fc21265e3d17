// rn2903 test application -- CLI tool for exercising an RN2903 LoRa modem
// over a serial port.
//
// Usage:
//   rn2903-test-app --port /dev/ttyUSB0 info
//   rn2903-test-app --port /dev/ttyUSB0 status
//   rn2903-test-app --port /dev/ttyUSB0 cmd sys get vdd
//   rn2903-test-app --port /dev/ttyUSB0 set-keys --deveui 0011223344556677 \
//       --appeui 70B3D57ED0000000 --appkey 000102030405060708090A0B0C0D0E0F
//   rn2903-test-app --port /dev/ttyUSB0 --debug join otaa
//   rn2903-test-app hex encode "Hi there"
//   rn2903-test-app hex decode 4869207468657265

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rn2903::builder::DEFAULT_BAUD_RATE;
use rn2903::commands::CMD_SYS_GET_HWEUI;
use rn2903::{JoinStatus, JoinType, Rn2903, Rn2903Builder};
use rn2903_core::{FlowControl, ResponseStatus};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// rn2903 test application -- drives an RN2903 modem from the command line.
#[derive(Parser)]
#[command(name = "rn2903-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required for all commands except `hex`.
    #[arg(long)]
    port: Option<String>,

    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Flow control: none, hardware or software.
    #[arg(long, default_value_t = FlowControl::None)]
    flow_control: FlowControl,

    /// Echo every command and response.
    #[arg(long)]
    debug: bool,

    /// How long to wait for each response line, in milliseconds.
    #[arg(long, default_value_t = 250)]
    response_wait_ms: u64,

    /// How long a join waits for the network's verdict, in seconds.
    #[arg(long, default_value_t = 60)]
    join_timeout_secs: u64,

    /// Skip the wake-up / reset / hardware EUI bring-up sequence.
    #[arg(long)]
    no_init: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show firmware version and hardware EUI.
    Info,
    /// Read and decode the MAC status word.
    Status,
    /// Send a raw command and print the response line.
    Cmd {
        /// Command words, joined with single spaces (e.g. `sys get vdd`).
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
    /// Join the network.
    Join {
        /// otaa or abp.
        join_type: JoinType,
    },
    /// Program LoRaWAN identity and keys.
    SetKeys {
        /// Device EUI (16 hex digits).
        #[arg(long)]
        deveui: Option<String>,
        /// Application EUI (16 hex digits).
        #[arg(long)]
        appeui: Option<String>,
        /// Application key for OTAA (32 hex digits).
        #[arg(long)]
        appkey: Option<String>,
        /// Device address for ABP (8 hex digits).
        #[arg(long)]
        devaddr: Option<String>,
        /// Network session key for ABP (32 hex digits).
        #[arg(long)]
        nwkskey: Option<String>,
        /// Application session key for ABP (32 hex digits).
        #[arg(long)]
        appskey: Option<String>,
    },
    /// Hex encode/decode helpers (no modem required).
    Hex {
        #[command(subcommand)]
        action: HexAction,
    },
}

#[derive(Subcommand)]
enum HexAction {
    /// Encode text as uppercase hex.
    Encode { text: String },
    /// Decode hex and print it as text.
    Decode { hex: String },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_tracing(debug: bool) {
    let default = if debug { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn open_modem(cli: &Cli) -> Result<Rn2903> {
    let Some(port) = cli.port.as_deref() else {
        bail!("--port is required for this command");
    };

    let modem = Rn2903Builder::new()
        .serial_port(port)
        .baud_rate(cli.baud)
        .flow_control(cli.flow_control)
        .response_wait(Duration::from_millis(cli.response_wait_ms))
        .join_grant_timeout(Duration::from_secs(cli.join_timeout_secs))
        .debug(cli.debug)
        .initialize(!cli.no_init)
        .build()
        .await
        .with_context(|| format!("failed to open RN2903 on {port}"))?;

    info!(port, hweui = %modem.hardware_eui(), "modem ready");
    Ok(modem)
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_info(modem: &mut Rn2903) -> Result<()> {
    let version = modem.version().await.context("sys get ver")?;

    let hweui = if modem.hardware_eui().is_empty() {
        let status = modem.command(CMD_SYS_GET_HWEUI).await;
        if status != ResponseStatus::Ok {
            bail!("sys get hweui: {status}");
        }
        modem.response().into_owned()
    } else {
        modem.hardware_eui().to_string()
    };

    println!("Modem Information");
    println!("  Firmware:       {version}");
    println!("  Hardware EUI:   {hweui}");
    Ok(())
}

async fn cmd_status(modem: &mut Rn2903) -> Result<()> {
    modem
        .update_mac_status()
        .await
        .context("mac get status")?;
    let status = modem.mac_status();

    println!("MAC Status");
    println!("  Word:           0x{:04X}", status.word());
    println!(
        "  State:          {} ({})",
        status.state(),
        status.state().field()
    );
    println!("  Joined:         {}", status.is_joined());
    println!("  Silent:         {}", status.is_silent());
    println!("  Paused:         {}", status.is_paused());
    println!("  ADR:            {}", status.adr_enabled());
    println!("  Auto reply:     {}", status.auto_reply());
    println!("  Flags:          {:?}", status.flags());
    Ok(())
}

async fn cmd_raw(modem: &mut Rn2903, words: &[String]) -> Result<()> {
    let command = words.join(" ");
    let status = modem.command(&command).await;
    println!("{}", modem.response());
    if !status.is_ok() {
        bail!("{command}: {status}");
    }
    Ok(())
}

async fn cmd_join(modem: &mut Rn2903, join_type: JoinType) -> Result<()> {
    let status = modem.join(join_type).await;
    println!("Join ({join_type}): {status}");
    if status.is_accepted() || status == JoinStatus::AlreadyJoined {
        Ok(())
    } else {
        bail!("join did not succeed: {status}")
    }
}

struct Keys<'a> {
    deveui: Option<&'a str>,
    appeui: Option<&'a str>,
    appkey: Option<&'a str>,
    devaddr: Option<&'a str>,
    nwkskey: Option<&'a str>,
    appskey: Option<&'a str>,
}

async fn cmd_set_keys(modem: &mut Rn2903, keys: Keys<'_>) -> Result<()> {
    let mut applied = 0;

    if let Some(v) = keys.deveui {
        modem.set_device_eui(v).await.context("deveui")?;
        applied += 1;
    }
    if let Some(v) = keys.appeui {
        modem.set_application_eui(v).await.context("appeui")?;
        applied += 1;
    }
    if let Some(v) = keys.appkey {
        modem.set_application_key(v).await.context("appkey")?;
        applied += 1;
    }
    if let Some(v) = keys.devaddr {
        modem.set_device_addr(v).await.context("devaddr")?;
        applied += 1;
    }
    if let Some(v) = keys.nwkskey {
        modem.set_network_session_key(v).await.context("nwkskey")?;
        applied += 1;
    }
    if let Some(v) = keys.appskey {
        modem.set_application_session_key(v).await.context("appskey")?;
        applied += 1;
    }

    if applied == 0 {
        bail!("no keys given (see --help)");
    }
    println!("Applied {applied} setting(s)");
    Ok(())
}

fn cmd_hex(action: &HexAction) -> Result<()> {
    match action {
        HexAction::Encode { text } => {
            let Some(encoded) = rn2903::to_hex(text.as_bytes()) else {
                bail!("nothing to encode");
            };
            println!("{encoded}");
        }
        HexAction::Decode { hex } => {
            let bytes = rn2903::from_hex(hex)?;
            println!("{} byte(s): {}", bytes.len(), String::from_utf8_lossy(&bytes));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

async fn run_command(modem: &mut Rn2903, command: &Command) -> Result<()> {
    match command {
        Command::Info => cmd_info(modem).await,
        Command::Status => cmd_status(modem).await,
        Command::Cmd { words } => cmd_raw(modem, words).await,
        Command::Join { join_type } => cmd_join(modem, *join_type).await,
        Command::SetKeys {
            deveui,
            appeui,
            appkey,
            devaddr,
            nwkskey,
            appskey,
        } => {
            let keys = Keys {
                deveui: deveui.as_deref(),
                appeui: appeui.as_deref(),
                appkey: appkey.as_deref(),
                devaddr: devaddr.as_deref(),
                nwkskey: nwkskey.as_deref(),
                appskey: appskey.as_deref(),
            };
            cmd_set_keys(modem, keys).await
        }
        Command::Hex { action } => cmd_hex(action),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match &cli.command {
        // `hex` does not need a modem.
        Command::Hex { action } => cmd_hex(action),
        command => {
            let mut modem = open_modem(&cli).await?;
            let result = run_command(&mut modem, command).await;
            if let Err(e) = modem.close().await {
                debug!(error = %e, "close failed");
            }
            result
        }
    }
}

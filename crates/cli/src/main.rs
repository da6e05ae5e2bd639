//! mx-wheel CLI: command-line scroll wheel configuration tool.

use anyhow::Result;
use clap::Parser;
use mx_wheel_core::channel::DeviceChannel;
use mx_wheel_core::device::{self, DeviceFamily};
use mx_wheel_core::error::Error;
use mx_wheel_core::session::{self, Outcome, RECONNECT_INSTRUCTIONS};
use std::ffi::CString;
use tracing::{debug, warn};

const COMMANDS_HELP: &str = "\
Commands:
  free                      free spinning mode
  click                     click-to-click mode
  manual[=button[,button]]  manual mode change via button
  auto[=speed[,speed]]      automatic mode change (up, down)
  soft-free=x,y             free spinning soft threshold
  soft-click=x,y            click-to-click soft threshold
  battery                   query battery status
  mode                      query scroll wheel mode
  reconnect                 initiate reconnection

Debug commands:
  raw=id,byte,...           write a raw report
  query[=id[,length]]       read a raw report (default 0x10, 6)
  sleep[=seconds]           pause (default 1)

Prefixing the mode with 'temp-' (i.e. temp-free) switches the mode
temporarily, otherwise it becomes the default mode after power up.

Button numbers:
  0 previously set button   7 wheel left tilt
  3 middle (wheel button)   8 wheel right tilt
  4 rear thumb button       9 thumb wheel forward
  5 front thumb button     11 thumb wheel backward
  6 find button            13 thumb wheel pressed";

struct CliHidChannel {
    device: hidapi::HidDevice,
}

impl DeviceChannel for CliHidChannel {
    fn write(&self, data: &[u8]) -> mx_wheel_core::error::Result<usize> {
        self.device
            .write(data)
            .map_err(|e| device::map_channel_error("write", &e))
    }

    fn read(&self, buf: &mut [u8]) -> mx_wheel_core::error::Result<usize> {
        self.device
            .read(buf)
            .map_err(|e| device::map_channel_error("read", &e))
    }
}

impl CliHidChannel {
    /// Open the device at `path` if it is supported, otherwise the first one found.
    fn open(path: Option<&str>) -> Result<(Self, DeviceFamily)> {
        let api = hidapi::HidApi::new().map_err(|e| anyhow::anyhow!("hidapi init: {e}"))?;

        if let Some(path) = path {
            match Self::open_path(&api, path) {
                Ok(Some(opened)) => return Ok(opened),
                Ok(None) => warn!(path, "Not a supported device, scanning instead"),
                Err(e) => warn!(path, "Cannot open device: {e}"),
            }
        }

        let devices = device::discover_devices(&api);
        let info = device::select_device(&devices, path)?;
        let c_path = CString::new(info.path.clone())?;
        let hid = api
            .open_path(&c_path)
            .map_err(|e| device::map_hid_error(&format!("open {}", info.path), &e))?;

        debug!(
            path = %info.path,
            id = format_args!("{:04x}:{:04x}", info.vid, info.pid),
            family = info.family.name(),
            "Device opened"
        );
        Ok((Self { device: hid }, info.family))
    }

    fn open_path(api: &hidapi::HidApi, path: &str) -> Result<Option<(Self, DeviceFamily)>> {
        let c_path = CString::new(path)?;
        let hid = api
            .open_path(&c_path)
            .map_err(|e| device::map_hid_error(&format!("open {path}"), &e))?;
        let info = hid
            .get_device_info()
            .map_err(|e| device::map_hid_error(&format!("device info {path}"), &e))?;

        Ok(DeviceFamily::from_ids(info.vendor_id(), info.product_id())
            .map(|family| (Self { device: hid }, family)))
    }
}

#[derive(Parser)]
#[command(
    name = "mx-wheel",
    version,
    about = "Change the wheel behaviour of Logitech's MX-Revolution mouse",
    arg_required_else_help = true,
    after_help = COMMANDS_HELP
)]
struct Cli {
    /// hidraw device node to use instead of scanning.
    #[arg(short, long)]
    device: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print query results as JSON.
    #[arg(long)]
    json: bool,

    /// Commands to run in order.
    #[arg(required = true)]
    commands: Vec<String>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    match outcome {
        Outcome::Sent | Outcome::Slept(_) => {}
        Outcome::Reconnecting => {
            for line in RECONNECT_INSTRUCTIONS {
                println!("{line}");
            }
        }
        Outcome::Status(result) => {
            if json {
                println!("{}", serde_json::to_string(result)?);
            } else {
                println!("{result}");
            }
        }
        Outcome::RawReport { report_id, data } => {
            if json {
                let value = serde_json::json!({ "report": report_id, "data": data });
                println!("{value}");
            } else {
                let bytes: String = data.iter().map(|b| format!(" {b:02x}")).collect();
                println!("report {report_id:02x}:{bytes}");
            }
        }
    }
    Ok(())
}

fn bad_answer_line(kind: &str, raw: &str, json: bool) -> String {
    if json {
        serde_json::json!({ "kind": kind, "error": "bad answer", "raw": raw }).to_string()
    } else {
        format!("bad answer: {raw}")
    }
}

fn print_failure(err: &Error, json: bool) {
    match err {
        Error::MalformedResponse { kind, raw } => println!("{}", bad_answer_line(kind, raw, json)),
        other => eprintln!("mx-wheel: {other}"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Decode everything before touching the device.
    let commands = mx_wheel_core::command::parse_commands(cli.commands.as_slice())?;

    let (channel, family) = CliHidChannel::open(cli.device.as_deref())?;
    let session = session::Session::new(&channel, family);

    let mut failed = 0;
    let mut print_error = None;
    session.run_with(commands, |step| {
        match &step.result {
            Ok(outcome) => {
                if let Err(e) = print_outcome(outcome, cli.json) {
                    print_error.get_or_insert(e);
                }
            }
            Err(e) => {
                failed += 1;
                print_failure(e, cli.json);
            }
        }
    });

    if let Some(e) = print_error {
        return Err(e);
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} command(s) failed", cli.commands.len());
    }
    Ok(())
}

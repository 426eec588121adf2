//
// cargo run -- EC:79:49:63:2A:80 --image label.png
//
use clap::Parser;
use log::debug;
use ptouch::{
    raster, transport::rfcomm::DEFAULT_CHANNEL, BdAddr, Connection, Defaults, Error, Outcome,
    Printer,
};
use std::path::PathBuf;
use std::process::ExitCode;

const ADDRESS_ENV: &str = "PT_LABEL_BT_ADDRESS";

/// Label Maker for PT-P710BT
#[derive(Parser, Debug)]
#[command(name = "pt-label", version)]
struct Args {
    /// Bluetooth address of device (eg. "EC:79:49:63:2A:80")
    bt_address: Option<String>,

    /// Path to image to print
    #[arg(long)]
    image: Option<PathBuf>,

    /// Bluetooth channel to use [default: 1]
    #[arg(long)]
    bt_channel: Option<u8>,

    /// Store the `bt_address` value as the default for future executions
    #[arg(long)]
    set_default: bool,

    /// Fetch information from the printer
    #[arg(short, long)]
    info: bool,

    /// Use the printer attached by USB with this serial number
    #[arg(long, value_name = "SERIAL")]
    usb: Option<String>,
}

fn bad_options(message: &str) -> ExitCode {
    eprintln!(
        "Error: {}. Use {} --help to get more information",
        message,
        std::env::args().next().unwrap_or_else(|| "pt-label".to_string())
    );
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}:{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    debug!("{:?}", args);

    if !args.info && args.image.is_none() {
        return bad_options("Image path required");
    }

    let mut defaults = Defaults::load();

    if args.set_default {
        match &args.bt_address {
            Some(address) => {
                defaults.default_bt = Some(address.clone());
                if args.bt_channel.is_some() {
                    defaults.bt_channel = args.bt_channel;
                }
                if let Err(err) = defaults.save() {
                    eprintln!("Error: {}", err);
                    return ExitCode::FAILURE;
                }
                println!("{} set as default BT address", address);
            }
            None => return bad_options("You must provide a BT address to set as default"),
        }
    }

    let result = match &args.usb {
        Some(serial) => Printer::open_usb(serial).and_then(|printer| run(printer, &args)),
        None => {
            let address = match args
                .bt_address
                .clone()
                .or_else(|| defaults.default_bt.clone())
                .or_else(|| std::env::var(ADDRESS_ENV).ok())
            {
                Some(address) => address,
                None => {
                    return bad_options(
                        "BT Address is required. If you'd like to remember it use --set-default",
                    )
                }
            };
            if args.bt_address.is_none() {
                println!("Using BT Address of {}", address);
            }
            let channel = args
                .bt_channel
                .or(defaults.bt_channel)
                .unwrap_or(DEFAULT_CHANNEL);

            address
                .parse::<BdAddr>()
                .and_then(|address| Printer::open(address, channel))
                .and_then(|printer| run(printer, &args))
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run<C: Connection>(mut printer: Printer<C>, args: &Args) -> Result<ExitCode, Error> {
    let outcome = printer.check_status()?;
    println!("{}", outcome);

    match outcome {
        Outcome::Error(..) => {
            eprintln!("An error has occurred; exiting program");
            return Ok(ExitCode::FAILURE);
        }
        Outcome::TurnedOff => {
            eprintln!("Device was turned off");
            return Ok(ExitCode::FAILURE);
        }
        _ => {}
    }

    let path = match (&args.image, args.info) {
        (_, true) | (None, _) => return Ok(ExitCode::SUCCESS),
        (Some(path), false) => path,
    };

    let tape = printer.tape()?;
    let image = image::open(path)?;
    let payload = raster::encode(&image, tape)?;

    printer.print_job(&payload, tape.mm())?;
    printer.await_completion_with(|outcome| println!("{}", outcome))?;
    Ok(ExitCode::SUCCESS)
}

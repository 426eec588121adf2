//! P-Touch Bluetooth Printer Driver
//!
//! This crate drives Brother P-Touch PT-P710BT label printers over Bluetooth
//! RFCOMM (or USB) using the raster command protocol.
//!
//! # Example
//!
//! ```rust,no_run
//! use ptouch::{BdAddr, Printer};
//!
//! let address: BdAddr = "EC:79:49:63:2A:80".parse()?;
//! let image = image::open("label.png")?;
//!
//! let mut printer = Printer::open(address, 1)?;
//! printer.print(&image)?;
//! # Ok::<(), ptouch::Error>(())
//! ```

mod config;
mod error;
mod media;
mod printer;
pub mod raster;
pub mod status;
pub mod transport;

pub use crate::{
    config::Defaults,
    error::{Error, ErrorKind},
    media::{MediaType, Tape, TapeColor, TextColor},
    printer::{Config, Printer},
    raster::{Bitmap, CompressedLines},
    status::{
        ErrorInformation1, ErrorInformation2, MediaInfo, Mode, Notification, Outcome, Phase,
        Status,
    },
    transport::{BdAddr, Connection, RfcommConnection, UsbConnection},
};

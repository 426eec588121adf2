//! Byte stream connections to the printer.
//!
//! - [`rfcomm`]: Bluetooth RFCOMM socket (Linux)
//! - [`usb`]: USB bulk endpoints

pub mod rfcomm;
pub mod usb;

pub use rfcomm::{BdAddr, RfcommConnection};
pub use usb::UsbConnection;

use crate::error::Error;

/// An open, ordered and reliable byte stream to the printer.
///
/// Dropping the connection closes it.
pub trait Connection {
    /// Write the whole buffer.
    fn send(&mut self, buf: &[u8]) -> Result<(), Error>;

    /// Single read into `buf`, returning the number of bytes received.
    ///
    /// Blocks until data arrives. Short reads are reported as is and never
    /// coalesced.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error>;
}

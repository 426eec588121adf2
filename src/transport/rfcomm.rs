//! # Bluetooth RFCOMM Transport
//!
//! The PT-P710BT exposes the raster protocol over the Serial Port Profile,
//! normally on RFCOMM channel 1. The printer must already be paired with the
//! host; this module only opens the socket.

use log::{debug, info};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::str::FromStr;

use crate::{error::Error, transport::Connection};

/// Default RFCOMM channel of the printer's serial port service.
pub const DEFAULT_CHANNEL: u8 = 1;

/// Bluetooth device address, e.g. `EC:79:49:63:2A:80`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdAddr([u8; 6]);

impl BdAddr {
    /// Address bytes in the order the kernel expects (least significant first).
    fn to_le_bytes(self) -> [u8; 6] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl FromStr for BdAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::InvalidAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(parts) {
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidAddress(s.to_string()));
            }
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| Error::InvalidAddress(s.to_string()))?;
        }
        Ok(BdAddr(bytes))
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Connected RFCOMM socket.
pub struct RfcommConnection {
    socket: File,
    address: BdAddr,
}

impl RfcommConnection {
    /// Connect to `address` on `channel`.
    ///
    /// Fails if the device is unreachable or refuses the channel. No retry
    /// is attempted.
    pub fn connect(address: BdAddr, channel: u8) -> Result<Self, Error> {
        debug!("connecting to {} channel {}", address, channel);
        let socket = sys::connect(address.to_le_bytes(), channel)?;
        info!("connected to {} channel {}", address, channel);

        Ok(RfcommConnection { socket, address })
    }
}

impl Connection for RfcommConnection {
    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.socket.write_all(buf)?;
        self.socket.flush()?;
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        Ok(self.socket.read(buf)?)
    }
}

impl Drop for RfcommConnection {
    fn drop(&mut self) {
        debug!("closing connection to {}", self.address);
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use std::fs::File;
    use std::io;
    use std::mem;
    use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};

    use crate::error::Error;

    const BTPROTO_RFCOMM: libc::c_int = 3;

    /// `struct sockaddr_rc` from `<bluetooth/rfcomm.h>`.
    #[repr(C)]
    struct SockaddrRc {
        rc_family: libc::sa_family_t,
        rc_bdaddr: [u8; 6],
        rc_channel: u8,
    }

    pub(super) fn connect(bdaddr: [u8; 6], channel: u8) -> Result<File, Error> {
        let fd = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
                BTPROTO_RFCOMM,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error().into());
        }
        // Closed on drop, including the error path below.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        let addr = SockaddrRc {
            rc_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            rc_bdaddr: bdaddr,
            rc_channel: channel,
        };
        let result = unsafe {
            libc::connect(
                fd.as_raw_fd(),
                &addr as *const SockaddrRc as *const libc::sockaddr,
                mem::size_of::<SockaddrRc>() as libc::socklen_t,
            )
        };
        if result != 0 {
            return Err(io::Error::last_os_error().into());
        }

        Ok(File::from(fd))
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use std::fs::File;

    use crate::error::Error;

    pub(super) fn connect(_bdaddr: [u8; 6], _channel: u8) -> Result<File, Error> {
        Err(Error::Unsupported)
    }
}

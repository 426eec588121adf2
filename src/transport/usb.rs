use log::{debug, info};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
use std::thread;
use std::time::Duration;

use crate::{error::Error, transport::Connection};

pub const VENDOR_ID: u16 = 0x04F9;

/// Product id of the PT-P710BT.
pub const PT_P710BT: u16 = 0x20AF;

/// Pause between bulk reads that come back empty.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    iface: u8,
    address: u8,
}

/// The same printer attached by USB cable.
pub struct UsbConnection {
    handle: DeviceHandle<Context>,
    endpoint_out: Endpoint,
    endpoint_in: Endpoint,
    timeout: Duration,
}

impl UsbConnection {
    /// Open the printer with the given product id and serial number.
    pub fn open(product_id: u16, serial: &str) -> Result<Self, Error> {
        let context = Context::new()?;
        let (device, device_desc, mut handle) =
            match Self::open_device(&context, VENDOR_ID, product_id, serial) {
                Ok(found) => found,
                Err(err) => {
                    debug!("{:?}", err);
                    return Err(Error::DeviceOffline);
                }
            };

        let endpoint_in = Self::find_endpoint(&device, &device_desc, Direction::In)
            .ok_or(Error::MissingEndpoint)?;
        let endpoint_out = Self::find_endpoint(&device, &device_desc, Direction::Out)
            .ok_or(Error::MissingEndpoint)?;

        handle.set_auto_detach_kernel_driver(true).ok();
        handle.claim_interface(endpoint_out.iface)?;
        info!("opened usb printer {:04x}:{:04x}@{}", VENDOR_ID, product_id, serial);

        Ok(UsbConnection {
            handle,
            endpoint_out,
            endpoint_in,
            timeout: Duration::from_secs(10),
        })
    }

    fn open_device(
        context: &Context,
        vid: u16,
        pid: u16,
        serial: &str,
    ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
        let devices = context.devices()?;

        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() != vid || device_desc.product_id() != pid {
                continue;
            }

            let handle = match device.open() {
                Ok(handle) => handle,
                Err(err) => {
                    debug!("Failed to open device: {:?}", err);
                    continue;
                }
            };

            let timeout = Duration::from_secs(1);
            let languages = handle.read_languages(timeout)?;
            let language = match languages.first() {
                Some(language) => *language,
                None => continue,
            };

            match handle.read_serial_number_string(language, &device_desc, timeout) {
                Ok(s) if s == serial => return Ok((device, device_desc, handle)),
                Ok(_) => continue,
                Err(err) => {
                    debug!("Failed to read serial number string: {:?}", err);
                    continue;
                }
            }
        }
        debug!("No device match with this serial: {:?}", serial);
        Err(Error::DeviceOffline)
    }

    fn find_endpoint(
        device: &Device<Context>,
        device_desc: &DeviceDescriptor,
        direction: Direction,
    ) -> Option<Endpoint> {
        for n in 0..device_desc.num_configurations() {
            let config_desc = match device.config_descriptor(n) {
                Ok(c) => c,
                Err(_) => continue,
            };
            for interface in config_desc.interfaces() {
                for interface_desc in interface.descriptors() {
                    for endpoint_desc in interface_desc.endpoint_descriptors() {
                        if endpoint_desc.direction() == direction
                            && endpoint_desc.transfer_type() == TransferType::Bulk
                        {
                            return Some(Endpoint {
                                iface: interface_desc.interface_number(),
                                address: endpoint_desc.address(),
                            });
                        }
                    }
                }
            }
        }
        None
    }
}

impl Connection for UsbConnection {
    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        let n = self
            .handle
            .write_bulk(self.endpoint_out.address, buf, self.timeout)?;
        if n == buf.len() {
            Ok(())
        } else {
            debug!(
                "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                n,
                buf.len()
            );
            Err(Error::IncompleteWrite {
                written: n,
                expected: buf.len(),
            })
        }
    }

    /// Blocks until the printer has something to say.
    ///
    /// The printer answers a bulk read with zero bytes, or lets it time out,
    /// while no status is pending. Both are retried.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let address = self.endpoint_in.address;
        let timeout = self.timeout;
        let handle = &self.handle;
        read_until_data(buf, POLL_INTERVAL, |buf| {
            handle.read_bulk(address, buf, timeout)
        })
    }
}

fn read_until_data<F>(buf: &mut [u8], interval: Duration, mut read: F) -> Result<usize, Error>
where
    F: FnMut(&mut [u8]) -> Result<usize, rusb::Error>,
{
    loop {
        match read(buf) {
            Ok(0) | Err(rusb::Error::Timeout) => thread::sleep(interval),
            Ok(n) => return Ok(n),
            Err(e) => return Err(Error::UsbError(e)),
        }
    }
}

impl Drop for UsbConnection {
    fn drop(&mut self) {
        self.handle.release_interface(self.endpoint_out.iface).ok();
    }
}

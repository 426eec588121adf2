use log::{debug, info};

use crate::{
    error::Error,
    media::Tape,
    raster::{self, Bitmap, CompressedLines},
    status::{Mode, Outcome, Status, STATUS_SIZE},
    transport::{BdAddr, Connection, RfcommConnection, UsbConnection},
};

/// A print session over an exclusively owned connection.
///
/// The protocol is strictly request/response followed by a blocking drain of
/// status notifications, so a session is driven from one thread at a time.
/// Dropping the session closes the connection, which is also the only way to
/// cancel a running job.
pub struct Printer<C: Connection> {
    connection: C,
    config: Config,
    media_width: Option<u8>,
}

impl Printer<RfcommConnection> {
    /// Connect to a paired printer over Bluetooth.
    pub fn open(address: BdAddr, channel: u8) -> Result<Self, Error> {
        Ok(Printer::new(RfcommConnection::connect(address, channel)?))
    }
}

impl Printer<UsbConnection> {
    /// Open a PT-P710BT attached by USB, identified by its serial number.
    pub fn open_usb(serial: &str) -> Result<Self, Error> {
        Ok(Printer::new(UsbConnection::open(
            crate::transport::usb::PT_P710BT,
            serial,
        )?))
    }
}

impl<C: Connection> Printer<C> {
    pub fn new(connection: C) -> Self {
        Printer {
            connection,
            config: Config::default(),
            media_width: None,
        }
    }

    pub fn with_config(self, config: Config) -> Self {
        Printer { config, ..self }
    }

    /// Tape width in mm reported by the last status reply of this session.
    pub fn media_width(&self) -> Option<u8> {
        self.media_width
    }

    /// Installed tape as reported by the last status reply.
    pub fn tape(&self) -> Result<Tape, Error> {
        match self.media_width {
            Some(mm) => Tape::from_mm(mm),
            None => Err(Error::MediaWidthUnknown),
        }
    }

    /// Give back the connection.
    pub fn into_inner(self) -> C {
        self.connection
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.connection.send(buf)
    }

    fn initialize(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        buf.append(&mut [0x00; 100].to_vec()); // Invalidate
        buf.append(&mut [0x1B, 0x40].to_vec()); // ESC @ : Initialize
        buf
    }

    fn request_status(&mut self) -> Result<(), Error> {
        let mut buf = self.initialize();
        buf.append(&mut [0x1B, 0x69, 0x53].to_vec()); // ESC i S : Status information request
        self.write(&buf)
    }

    /// Read one status frame.
    ///
    /// A single read must return the whole 32-byte frame; anything shorter
    /// fails without retrying.
    pub fn read_status(&mut self) -> Result<Status, Error> {
        let mut buf = [0u8; STATUS_SIZE];
        let n = self.connection.recv(&mut buf)?;
        if n != STATUS_SIZE {
            debug!("short status read: {:X?}", &buf[..n]);
            return Err(Error::InvalidResponse(n));
        }

        let status = Status::from_buf(buf);
        debug!("Raw status code: {:X?}", buf);
        debug!("Parsed Status struct: {:?}", status);
        Ok(status)
    }

    /// Reset the link, request the status and read the reply.
    pub fn query_status(&mut self) -> Result<Status, Error> {
        self.request_status()?;
        self.read_status()
    }

    /// Map a status frame onto the job state machine.
    ///
    /// A reply to a status request also records the installed tape width for
    /// this session.
    pub fn interpret_status(&mut self, status: &Status) -> Result<Outcome, Error> {
        let outcome = status.outcome()?;
        match outcome {
            Outcome::StatusReply(media) => {
                info!("media width {}mm, {:?}", media.width_mm, media.media_type);
                self.media_width = Some(media.width_mm);
            }
            Outcome::Completed(mode) => info!("printing completed, mode {:?}", mode),
            Outcome::Error(error_1, error_2) => info!("error {:?} {:?}", error_1, error_2),
            Outcome::TurnedOff => info!("printer turned off"),
            Outcome::Notification(notification) => debug!("notification {:?}", notification),
            Outcome::PhaseChange(phase) => debug!("phase changed {:?}", phase),
        }
        Ok(outcome)
    }

    /// Read printer status.
    ///
    /// This method is convenient for inspection when a new tape is installed.
    /// Frames the printer pushes on its own before answering (notifications,
    /// phase changes, a late completion) are skipped. The answer is a status
    /// reply, or an error or power-off report.
    pub fn check_status(&mut self) -> Result<Outcome, Error> {
        let mut status = self.query_status()?;
        loop {
            let outcome = self.interpret_status(&status)?;
            match outcome {
                Outcome::StatusReply(_) | Outcome::Error(..) | Outcome::TurnedOff => {
                    return Ok(outcome)
                }
                _ => {
                    debug!("skipping unsolicited status while waiting for reply");
                    status = self.read_status()?;
                }
            }
        }
    }

    /// Send a raster payload produced by [`raster::encode`] for a tape of
    /// `media_width_mm`.
    pub fn print_job(&mut self, payload: &[u8], media_width_mm: u8) -> Result<(), Error> {
        let mut preamble: Vec<u8> = Vec::new();
        preamble.append(&mut [0x1B, 0x69, 0x61, 0x01].to_vec()); // ESC i a : Raster mode
        preamble.append(&mut [0x1B, 0x69, 0x21, 0x00].to_vec()); // ESC i ! : Notify status automatically

        // ESC i z : Print information, recover on and media width valid
        preamble.append(&mut [0x1B, 0x69, 0x7A, 0x84, 0x00, media_width_mm, 0x00].to_vec());
        // Raster line count, 16 bytes per line
        preamble.append(&mut ((payload.len() >> 4) as u32).to_le_bytes().to_vec());
        preamble.append(&mut [0x00, 0x00].to_vec());

        preamble.append(&mut [0x1B, 0x69, 0x4D, self.config.various_mode().bits()].to_vec()); // ESC i M : Various mode
        preamble.append(&mut [0x1B, 0x69, 0x4B, self.config.advanced_mode()].to_vec()); // ESC i K : Advanced mode
        preamble.append(&mut [0x1B, 0x69, 0x64].to_vec()); // ESC i d : Margin amount
        preamble.append(&mut self.config.feed.to_le_bytes().to_vec());

        let lines = if self.config.compress {
            preamble.append(&mut [0x4D, 0x02].to_vec()); // M : TIFF (PackBits) compression
            raster::rasterize(payload)
        } else {
            preamble.append(&mut [0x4D, 0x00].to_vec()); // M : No compression
            CompressedLines::uncompressed(payload)
        };

        debug!("{:?}", self.config);
        debug!("start sending {} bytes of raster data", payload.len());
        self.write(&preamble)?;

        for line in lines {
            self.write(&line)?;
        }

        self.write(&[0x1A]) // Control-Z : Print then feed
    }

    /// Wait for the job to finish.
    ///
    /// Returns the mode flags of the completed job. A device fault or power
    /// off ends the wait with an error. There is no timeout.
    pub fn await_completion(&mut self) -> Result<Mode, Error> {
        self.await_completion_with(|_| {})
    }

    /// Same as [`Printer::await_completion`], handing every decoded outcome to
    /// `on_status` before acting on it.
    pub fn await_completion_with(
        &mut self,
        mut on_status: impl FnMut(&Outcome),
    ) -> Result<Mode, Error> {
        loop {
            let status = self.read_status()?;
            let outcome = self.interpret_status(&status)?;
            on_status(&outcome);

            match outcome {
                Outcome::Completed(mode) => return Ok(mode),
                Outcome::Error(error_1, error_2) => {
                    return Err(Error::DeviceFault { error_1, error_2 })
                }
                Outcome::TurnedOff => return Err(Error::TurnedOff),
                _ => continue,
            }
        }
    }

    /// Print a label.
    ///
    /// Queries the installed tape, encodes the bitmap for it, sends the job
    /// and waits for completion.
    pub fn print(&mut self, bitmap: &impl Bitmap) -> Result<Mode, Error> {
        self.media_width = None;
        match self.check_status()? {
            Outcome::Error(error_1, error_2) => {
                return Err(Error::DeviceFault { error_1, error_2 })
            }
            Outcome::TurnedOff => return Err(Error::TurnedOff),
            _ => {}
        }

        let tape = self.tape()?;
        debug!("encoding for {}", tape);
        let payload = raster::encode(bitmap, tape)?;

        self.print_job(&payload, tape.mm())?;
        self.await_completion()
    }
}

/// Job settings.
///
/// The defaults are auto cut on, mirror printing off, chain printing off, no
/// margin feed and PackBits compression.
#[derive(Debug, Clone)]
pub struct Config {
    auto_cut: bool,
    mirror: bool,
    chain_printing: bool,
    feed: u16,
    compress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auto_cut: true,
            mirror: false,
            chain_printing: false,
            feed: 0,
            compress: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_cut(self, flag: bool) -> Self {
        Config {
            auto_cut: flag,
            ..self
        }
    }

    pub fn mirror(self, flag: bool) -> Self {
        Config {
            mirror: flag,
            ..self
        }
    }

    pub fn chain_printing(self, flag: bool) -> Self {
        Config {
            chain_printing: flag,
            ..self
        }
    }

    pub fn set_feed_in_dots(self, feed: u16) -> Self {
        Config { feed, ..self }
    }

    pub fn compress(self, flag: bool) -> Self {
        Config {
            compress: flag,
            ..self
        }
    }

    fn various_mode(&self) -> Mode {
        let mut mode = Mode::empty();
        if self.auto_cut {
            mode |= Mode::AUTO_CUT;
        }
        if self.mirror {
            mode |= Mode::MIRROR_PRINTING;
        }
        mode
    }

    fn advanced_mode(&self) -> u8 {
        let mut advanced_mode: u8 = 0b0000_0000;
        if !self.chain_printing {
            advanced_mode |= 0b0000_1000; // No chain printing
        }
        advanced_mode
    }
}

//! Status frames sent back by the printer.
//!
//! The printer answers every status request with a 32-byte frame, and once
//! automatic status notification is enabled it also pushes frames on its
//! own while a job runs. [`Status::from_buf`] decodes one frame and
//! [`Status::outcome`] maps it onto the job state machine.

use bitflags::bitflags;
use std::fmt;

use crate::{
    error::Error,
    media::{MediaType, TapeColor, TextColor},
};

pub const STATUS_SIZE: usize = 32;

const OFFSET_ERROR_INFORMATION_1: usize = 8;
const OFFSET_ERROR_INFORMATION_2: usize = 9;
const OFFSET_MEDIA_WIDTH: usize = 10;
const OFFSET_MEDIA_TYPE: usize = 11;
const OFFSET_MODE: usize = 15;
const OFFSET_STATUS_TYPE: usize = 18;
const OFFSET_PHASE_TYPE: usize = 19;
const OFFSET_PHASE_NUMBER: usize = 20;
const OFFSET_NOTIFICATION_NUMBER: usize = 22;
const OFFSET_TAPE_COLOR: usize = 24;
const OFFSET_TEXT_COLOR: usize = 25;

bitflags! {
    /// Error information 1 (byte 8).
    pub struct ErrorInformation1: u8 {
        const NO_MEDIA = 0b0000_0001;
        const CUTTER_JAM = 0b0000_0100;
        const WEAK_BATTERIES = 0b0000_1000;
        const HIGH_VOLTAGE_ADAPTER = 0b0100_0000;
    }
}

bitflags! {
    /// Error information 2 (byte 9).
    pub struct ErrorInformation2: u8 {
        const WRONG_MEDIA = 0b0000_0001;
        const COVER_OPEN = 0b0001_0000;
        const OVERHEATING = 0b0010_0000;
    }
}

bitflags! {
    /// Various mode settings (byte 15), also the payload of `ESC i M`.
    pub struct Mode: u8 {
        const AUTO_CUT = 0b0100_0000;
        const MIRROR_PRINTING = 0b1000_0000;
    }
}

// StatusType

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    ReplyToRequest,
    Completed,
    Error,
    TurnedOff,
    Notification,
    PhaseChange,
}

impl StatusType {
    pub fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            0x00 => Ok(Self::ReplyToRequest),
            0x01 => Ok(Self::Completed),
            0x02 => Ok(Self::Error),
            0x04 => Ok(Self::TurnedOff),
            0x05 => Ok(Self::Notification),
            0x06 => Ok(Self::PhaseChange),
            _ => Err(Error::UnknownStatusType(code)),
        }
    }
}

// Phase

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingPhase {
    Editing,
    Feed,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintingPhase {
    Printing,
    CoverOpenWhileReceiving,
    Other(u16),
}

/// Phase type (byte 19) with its phase number (bytes 20-21, big endian).
///
/// The phase number is interpreted differently for each phase type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing(EditingPhase),
    Printing(PrintingPhase),
}

impl Phase {
    pub fn from_codes(phase_type: u8, number: u16) -> Result<Self, Error> {
        match phase_type {
            0x00 => Ok(Self::Editing(match number {
                0x0000 => EditingPhase::Editing,
                0x0001 => EditingPhase::Feed,
                n => EditingPhase::Other(n),
            })),
            0x01 => Ok(Self::Printing(match number {
                0x0000 => PrintingPhase::Printing,
                0x0014 => PrintingPhase::CoverOpenWhileReceiving,
                n => PrintingPhase::Other(n),
            })),
            _ => Err(Error::UnknownPhaseType(phase_type)),
        }
    }
}

// Notification

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    NotAvailable,
    CoverOpen,
    CoverClosed,
    Other(u8),
}

impl Notification {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::NotAvailable,
            0x01 => Self::CoverOpen,
            0x02 => Self::CoverClosed,
            _ => Self::Other(code),
        }
    }
}

/// Tape information carried by a reply to a status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    pub width_mm: u8,
    pub media_type: MediaType,
    pub tape_color: TapeColor,
    pub text_color: TextColor,
}

///
/// Status received from the printer encoded to Rust friendly type.
///
#[derive(Debug, Clone)]
pub struct Status {
    error_1: ErrorInformation1,
    error_2: ErrorInformation2,
    media: MediaInfo,
    mode: Mode,
    status_type: u8,
    phase_type: u8,
    phase_number: u16,
    notification: Notification,
}

impl Status {
    pub fn from_buf(buf: [u8; STATUS_SIZE]) -> Self {
        Status {
            error_1: ErrorInformation1::from_bits_truncate(buf[OFFSET_ERROR_INFORMATION_1]),
            error_2: ErrorInformation2::from_bits_truncate(buf[OFFSET_ERROR_INFORMATION_2]),
            media: MediaInfo {
                width_mm: buf[OFFSET_MEDIA_WIDTH],
                media_type: MediaType::from_code(buf[OFFSET_MEDIA_TYPE]),
                tape_color: TapeColor::from_code(buf[OFFSET_TAPE_COLOR]),
                text_color: TextColor::from_code(buf[OFFSET_TEXT_COLOR]),
            },
            mode: Mode::from_bits_truncate(buf[OFFSET_MODE]),
            status_type: buf[OFFSET_STATUS_TYPE],
            phase_type: buf[OFFSET_PHASE_TYPE],
            phase_number: u16::from_be_bytes([
                buf[OFFSET_PHASE_NUMBER],
                buf[OFFSET_PHASE_NUMBER + 1],
            ]),
            notification: Notification::from_code(buf[OFFSET_NOTIFICATION_NUMBER]),
        }
    }

    pub fn error_information(&self) -> (ErrorInformation1, ErrorInformation2) {
        (self.error_1, self.error_2)
    }

    pub fn media(&self) -> MediaInfo {
        self.media
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status_type(&self) -> Result<StatusType, Error> {
        StatusType::from_code(self.status_type)
    }

    pub fn phase(&self) -> Result<Phase, Error> {
        Phase::from_codes(self.phase_type, self.phase_number)
    }

    pub fn notification(&self) -> Notification {
        self.notification
    }

    /// Dispatch on the status type.
    ///
    /// Only the fields relevant to the status type are carried over into the
    /// outcome.
    pub fn outcome(&self) -> Result<Outcome, Error> {
        let outcome = match self.status_type()? {
            StatusType::ReplyToRequest => Outcome::StatusReply(self.media),
            StatusType::Completed => Outcome::Completed(self.mode),
            StatusType::Error => Outcome::Error(self.error_1, self.error_2),
            StatusType::TurnedOff => Outcome::TurnedOff,
            StatusType::Notification => Outcome::Notification(self.notification),
            StatusType::PhaseChange => Outcome::PhaseChange(self.phase()?),
        };
        Ok(outcome)
    }
}

/// What a status frame means for the running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    StatusReply(MediaInfo),
    Completed(Mode),
    Error(ErrorInformation1, ErrorInformation2),
    TurnedOff,
    Notification(Notification),
    PhaseChange(Phase),
}

impl Outcome {
    /// Completed, Error and TurnedOff end a job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Error(..) | Self::TurnedOff)
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "-".repeat(title.len()))
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusReply(media) => {
                heading(f, "Printer Status")?;
                writeln!(f, "Media Width: {}mm", media.width_mm)?;
                writeln!(f, "Media Type: {:?}", media.media_type)?;
                writeln!(f, "Tape Color: {:?}", media.tape_color)?;
                writeln!(f, "Text Color: {:?}", media.text_color)
            }
            Self::Completed(mode) => {
                heading(f, "Printing Completed")?;
                writeln!(f, "Mode: {:?}", mode)
            }
            Self::Error(error_1, error_2) => {
                heading(f, "Error Occurred")?;
                writeln!(f, "Error information 1: {:?}", error_1)?;
                writeln!(f, "Error information 2: {:?}", error_2)
            }
            Self::TurnedOff => heading(f, "Turned Off"),
            Self::Notification(notification) => {
                heading(f, "Notification")?;
                writeln!(f, "Notification number: {:?}", notification)
            }
            Self::PhaseChange(phase) => {
                heading(f, "Phase Changed")?;
                match phase {
                    Phase::Editing(number) => {
                        writeln!(f, "Phase type: Editing")?;
                        writeln!(f, "Phase number: {:?}", number)
                    }
                    Phase::Printing(number) => {
                        writeln!(f, "Phase type: Printing")?;
                        writeln!(f, "Phase number: {:?}", number)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn frame(status_type: u8) -> [u8; STATUS_SIZE] {
        let mut buf = [0u8; STATUS_SIZE];
        buf[0] = 0x80;
        buf[1] = 0x20;
        buf[2] = 0x42;
        buf[OFFSET_STATUS_TYPE] = status_type;
        buf
    }

    #[test]
    fn zero_error_bytes_decode_to_empty_sets() {
        let status = Status::from_buf(frame(0x00));
        let (error_1, error_2) = status.error_information();
        assert!(error_1.is_empty());
        assert!(error_2.is_empty());
    }

    #[test]
    fn reply_carries_media() {
        let mut buf = frame(0x00);
        buf[OFFSET_MEDIA_WIDTH] = 12;
        buf[OFFSET_MEDIA_TYPE] = 0x01;
        buf[OFFSET_TAPE_COLOR] = 0x01;
        buf[OFFSET_TEXT_COLOR] = 0x08;

        let outcome = Status::from_buf(buf).outcome().unwrap();
        assert_eq!(
            outcome,
            Outcome::StatusReply(MediaInfo {
                width_mm: 12,
                media_type: MediaType::LaminatedTape,
                tape_color: TapeColor::White,
                text_color: TextColor::Black,
            })
        );
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn completed_is_terminal_whatever_else_is_set() {
        let mut buf = [0xFFu8; STATUS_SIZE];
        buf[OFFSET_STATUS_TYPE] = 0x01;
        let outcome = Status::from_buf(buf).outcome().unwrap();
        assert_eq!(outcome, Outcome::Completed(Mode::all()));
        assert!(outcome.is_terminal());
    }

    #[test]
    fn error_carries_flags() {
        let mut buf = frame(0x02);
        buf[OFFSET_ERROR_INFORMATION_1] = 0x01 | 0x08;
        buf[OFFSET_ERROR_INFORMATION_2] = 0x10;

        let outcome = Status::from_buf(buf).outcome().unwrap();
        assert_eq!(
            outcome,
            Outcome::Error(
                ErrorInformation1::NO_MEDIA | ErrorInformation1::WEAK_BATTERIES,
                ErrorInformation2::COVER_OPEN
            )
        );
        assert!(outcome.is_terminal());
    }

    #[test]
    fn turned_off_is_terminal() {
        let outcome = Status::from_buf(frame(0x04)).outcome().unwrap();
        assert_eq!(outcome, Outcome::TurnedOff);
        assert!(outcome.is_terminal());
    }

    #[test]
    fn notification_is_not_terminal() {
        let mut buf = frame(0x05);
        buf[OFFSET_NOTIFICATION_NUMBER] = 0x02;
        let outcome = Status::from_buf(buf).outcome().unwrap();
        assert_eq!(outcome, Outcome::Notification(Notification::CoverClosed));
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn phase_number_depends_on_phase_type() {
        let mut buf = frame(0x06);
        buf[OFFSET_PHASE_TYPE] = 0x01;
        buf[OFFSET_PHASE_NUMBER + 1] = 0x14;
        assert_eq!(
            Status::from_buf(buf).outcome().unwrap(),
            Outcome::PhaseChange(Phase::Printing(PrintingPhase::CoverOpenWhileReceiving))
        );

        buf[OFFSET_PHASE_TYPE] = 0x00;
        buf[OFFSET_PHASE_NUMBER + 1] = 0x01;
        assert_eq!(
            Status::from_buf(buf).outcome().unwrap(),
            Outcome::PhaseChange(Phase::Editing(EditingPhase::Feed))
        );
    }

    #[test]
    fn unknown_status_type_is_rejected() {
        assert!(matches!(
            Status::from_buf(frame(0x03)).outcome(),
            Err(Error::UnknownStatusType(0x03))
        ));
    }

    #[test]
    fn unknown_phase_type_is_rejected() {
        let mut buf = frame(0x06);
        buf[OFFSET_PHASE_TYPE] = 0x07;
        assert!(matches!(
            Status::from_buf(buf).outcome(),
            Err(Error::UnknownPhaseType(0x07))
        ));
    }

    #[test]
    fn report_headings() {
        let text = Outcome::TurnedOff.to_string();
        assert_eq!(text, "Turned Off\n----------\n");
    }
}

use crate::error::Error;
use std::fmt;

/// TZe tape widths supported by the PT-P710BT.
///
/// The printable area of each tape is a fixed number of dots out of the
/// 128 pins of the print head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tape {
    /// Actually 3.5mm, reported by the printer as 3.
    Tape3,
    Tape6,
    Tape9,
    Tape12,
    Tape18,
    Tape24,
}

impl Tape {
    pub fn from_mm(mm: u8) -> Result<Self, Error> {
        match mm {
            3 => Ok(Self::Tape3),
            6 => Ok(Self::Tape6),
            9 => Ok(Self::Tape9),
            12 => Ok(Self::Tape12),
            18 => Ok(Self::Tape18),
            24 => Ok(Self::Tape24),
            _ => Err(Error::UnsupportedMediaWidth(mm)),
        }
    }

    pub fn mm(&self) -> u8 {
        match self {
            Self::Tape3 => 3,
            Self::Tape6 => 6,
            Self::Tape9 => 9,
            Self::Tape12 => 12,
            Self::Tape18 => 18,
            Self::Tape24 => 24,
        }
    }

    /// Printable width in dots.
    pub fn dots(&self) -> u32 {
        match self {
            Self::Tape3 => 24,
            Self::Tape6 => 32,
            Self::Tape9 => 50,
            Self::Tape12 => 70,
            Self::Tape18 => 112,
            Self::Tape24 => 128,
        }
    }
}

// MediaType

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    NoMedia,
    LaminatedTape,
    NonLaminatedTape,
    HeatShrinkTube,
    IncompatibleTape,
    Unknown(u8),
}

impl MediaType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::NoMedia,
            0x01 => Self::LaminatedTape,
            0x03 => Self::NonLaminatedTape,
            0x11 => Self::HeatShrinkTube,
            0xFF => Self::IncompatibleTape,
            _ => Self::Unknown(code),
        }
    }
}

// TapeColor

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeColor {
    White,
    Other,
    Clear,
    Red,
    Blue,
    Yellow,
    Green,
    Black,
    ClearWhiteText,
    MatteWhite,
    MatteClear,
    MatteSilver,
    SatinGold,
    SatinSilver,
    BlueD,
    RedD,
    FluorescentOrange,
    FluorescentYellow,
    BerryPinkS,
    LightGrayS,
    LimeGreenS,
    YellowF,
    PinkF,
    BlueF,
    WhiteHeatShrinkTube,
    WhiteFlexId,
    YellowFlexId,
    Cleaning,
    Stencil,
    Incompatible,
    Unknown(u8),
}

impl TapeColor {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::White,
            0x02 => Self::Other,
            0x03 => Self::Clear,
            0x04 => Self::Red,
            0x05 => Self::Blue,
            0x06 => Self::Yellow,
            0x07 => Self::Green,
            0x08 => Self::Black,
            0x09 => Self::ClearWhiteText,
            0x20 => Self::MatteWhite,
            0x21 => Self::MatteClear,
            0x22 => Self::MatteSilver,
            0x23 => Self::SatinGold,
            0x24 => Self::SatinSilver,
            0x30 => Self::BlueD,
            0x31 => Self::RedD,
            0x40 => Self::FluorescentOrange,
            0x41 => Self::FluorescentYellow,
            0x50 => Self::BerryPinkS,
            0x51 => Self::LightGrayS,
            0x52 => Self::LimeGreenS,
            0x60 => Self::YellowF,
            0x61 => Self::PinkF,
            0x62 => Self::BlueF,
            0x70 => Self::WhiteHeatShrinkTube,
            0x90 => Self::WhiteFlexId,
            0x91 => Self::YellowFlexId,
            0xF0 => Self::Cleaning,
            0xF1 => Self::Stencil,
            0xFF => Self::Incompatible,
            _ => Self::Unknown(code),
        }
    }
}

// TextColor

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    White,
    Other,
    Red,
    Blue,
    Black,
    Gold,
    BlueF,
    Cleaning,
    Stencil,
    Incompatible,
    Unknown(u8),
}

impl TextColor {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::White,
            0x02 => Self::Other,
            0x04 => Self::Red,
            0x05 => Self::Blue,
            0x08 => Self::Black,
            0x0A => Self::Gold,
            0x62 => Self::BlueF,
            0xF0 => Self::Cleaning,
            0xF1 => Self::Stencil,
            0xFF => Self::Incompatible,
            _ => Self::Unknown(code),
        }
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm ({} dots)", self.mm(), self.dots())
    }
}

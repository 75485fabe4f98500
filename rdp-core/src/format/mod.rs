//! Standard pixel formats, sensor-native encodings and their byte footprints

mod size;

pub use size::{fourcc_image_size, image_size, native_image_size};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RdpError, Result};

/// Uncompressed output formats produced by the pipeline.
///
/// 16-bit formats are stored little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardFormat {
    Z16,
    Yuyv,
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Y8,
    Y16,
}

impl StandardFormat {
    pub const ALL: [StandardFormat; 8] = [
        StandardFormat::Z16,
        StandardFormat::Yuyv,
        StandardFormat::Rgb8,
        StandardFormat::Bgr8,
        StandardFormat::Rgba8,
        StandardFormat::Bgra8,
        StandardFormat::Y8,
        StandardFormat::Y16,
    ];

    /// Bytes of one pixel, or `None` for YUYV where two pixels share chroma
    pub const fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            StandardFormat::Y8 => Some(1),
            StandardFormat::Z16 | StandardFormat::Y16 => Some(2),
            StandardFormat::Rgb8 | StandardFormat::Bgr8 => Some(3),
            StandardFormat::Rgba8 | StandardFormat::Bgra8 => Some(4),
            StandardFormat::Yuyv => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            StandardFormat::Z16 => "Z16",
            StandardFormat::Yuyv => "YUYV",
            StandardFormat::Rgb8 => "RGB8",
            StandardFormat::Bgr8 => "BGR8",
            StandardFormat::Rgba8 => "RGBA8",
            StandardFormat::Bgra8 => "BGRA8",
            StandardFormat::Y8 => "Y8",
            StandardFormat::Y16 => "Y16",
        }
    }
}

impl fmt::Display for StandardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StandardFormat {
    type Err = RdpError;

    fn from_str(s: &str) -> Result<Self> {
        StandardFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RdpError::UnsupportedFormat(s.to_string()))
    }
}

/// Four-character code naming a raw wire layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }
}

/// Packed little-endian form, as used by V4L2 (`'Y' | 'U' << 8 | ...`)
impl From<u32> for FourCc {
    fn from(value: u32) -> Self {
        Self(value.to_le_bytes())
    }
}

impl From<FourCc> for u32 {
    fn from(code: FourCc) -> Self {
        u32::from_le_bytes(code.0)
    }
}

/// Codes shorter than four characters are padded with spaces
impl FromStr for FourCc {
    type Err = RdpError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > 4 || !s.is_ascii() {
            return Err(RdpError::UnsupportedFormat(s.to_string()));
        }
        let mut code = [b' '; 4];
        code[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self(code))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

/// Sensor-native encodings the unpacking engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeEncoding {
    /// Y0 U Y1 V, two pixels per macropixel
    #[serde(rename = "YUY2")]
    Yuy2,
    /// 16-bit depth
    #[serde(rename = "Z16")]
    Z16,
    /// 8-bit infrared
    #[serde(rename = "Y8")]
    Y8,
    /// 16-bit container holding 10-bit infrared
    #[serde(rename = "Y16")]
    Y16,
    /// 8-bit left/right stereo pair
    #[serde(rename = "Y8I")]
    Y8i,
    /// Two 12-bit containers (10 significant bits) packed into 3 bytes
    #[serde(rename = "Y12I")]
    Y12i,
    #[serde(rename = "INVR")]
    Invr,
    #[serde(rename = "INVZ")]
    Invz,
    #[serde(rename = "INVI")]
    Invi,
    /// 16-bit depth followed by 8-bit infrared
    #[serde(rename = "INRI")]
    Inri,
    /// 16-bit depth and 16-bit infrared sharing a 2x1 macropixel
    #[serde(rename = "INZI")]
    Inzi,
}

impl NativeEncoding {
    pub const ALL: [NativeEncoding; 11] = [
        NativeEncoding::Yuy2,
        NativeEncoding::Z16,
        NativeEncoding::Y8,
        NativeEncoding::Y16,
        NativeEncoding::Y8i,
        NativeEncoding::Y12i,
        NativeEncoding::Invr,
        NativeEncoding::Invz,
        NativeEncoding::Invi,
        NativeEncoding::Inri,
        NativeEncoding::Inzi,
    ];

    pub const fn fourcc(&self) -> FourCc {
        match self {
            NativeEncoding::Yuy2 => FourCc::new(b"YUY2"),
            NativeEncoding::Z16 => FourCc::new(b"Z16 "),
            NativeEncoding::Y8 => FourCc::new(b"Y8  "),
            NativeEncoding::Y16 => FourCc::new(b"Y16 "),
            NativeEncoding::Y8i => FourCc::new(b"Y8I "),
            NativeEncoding::Y12i => FourCc::new(b"Y12I"),
            NativeEncoding::Invr => FourCc::new(b"INVR"),
            NativeEncoding::Invz => FourCc::new(b"INVZ"),
            NativeEncoding::Invi => FourCc::new(b"INVI"),
            NativeEncoding::Inri => FourCc::new(b"INRI"),
            NativeEncoding::Inzi => FourCc::new(b"INZI"),
        }
    }

    /// Pixels covered by one macropixel
    pub const fn macropixel_width(&self) -> usize {
        match self {
            NativeEncoding::Yuy2 | NativeEncoding::Inzi => 2,
            _ => 1,
        }
    }

    /// Bytes of one macropixel
    pub const fn macropixel_bytes(&self) -> usize {
        match self {
            NativeEncoding::Y8 | NativeEncoding::Invi => 1,
            NativeEncoding::Z16
            | NativeEncoding::Y16
            | NativeEncoding::Y8i
            | NativeEncoding::Invr
            | NativeEncoding::Invz => 2,
            NativeEncoding::Y12i | NativeEncoding::Inri => 3,
            NativeEncoding::Yuy2 | NativeEncoding::Inzi => 4,
        }
    }

    /// Standard format with the same per-pixel byte layout, if any
    pub const fn passthrough_format(&self) -> Option<StandardFormat> {
        match self {
            NativeEncoding::Yuy2 => Some(StandardFormat::Yuyv),
            NativeEncoding::Z16 | NativeEncoding::Invr | NativeEncoding::Invz => {
                Some(StandardFormat::Z16)
            }
            NativeEncoding::Y8 | NativeEncoding::Invi => Some(StandardFormat::Y8),
            NativeEncoding::Y16 => Some(StandardFormat::Y16),
            NativeEncoding::Y8i
            | NativeEncoding::Y12i
            | NativeEncoding::Inri
            | NativeEncoding::Inzi => None,
        }
    }
}

impl TryFrom<FourCc> for NativeEncoding {
    type Error = RdpError;

    fn try_from(code: FourCc) -> Result<Self> {
        NativeEncoding::ALL
            .into_iter()
            .find(|encoding| encoding.fourcc() == code)
            .ok_or_else(|| RdpError::UnsupportedFormat(code.to_string()))
    }
}

impl FromStr for NativeEncoding {
    type Err = RdpError;

    fn from_str(s: &str) -> Result<Self> {
        NativeEncoding::try_from(s.parse::<FourCc>()?)
    }
}

impl fmt::Display for NativeEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc().to_string();
        f.write_str(code.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_format_from_str() {
        assert_eq!("rgb8".parse::<StandardFormat>().unwrap(), StandardFormat::Rgb8);
        assert_eq!("YUYV".parse::<StandardFormat>().unwrap(), StandardFormat::Yuyv);
        assert_eq!(" z16 ".parse::<StandardFormat>().unwrap(), StandardFormat::Z16);

        let err = "xyz32f".parse::<StandardFormat>().unwrap_err();
        assert!(matches!(err, RdpError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(StandardFormat::Y8.bytes_per_pixel(), Some(1));
        assert_eq!(StandardFormat::Z16.bytes_per_pixel(), Some(2));
        assert_eq!(StandardFormat::Bgr8.bytes_per_pixel(), Some(3));
        assert_eq!(StandardFormat::Rgba8.bytes_per_pixel(), Some(4));
        assert_eq!(StandardFormat::Yuyv.bytes_per_pixel(), None);
    }

    #[test]
    fn test_fourcc_parse_pads_with_spaces() {
        let code: FourCc = "Z16".parse().unwrap();
        assert_eq!(code, FourCc::new(b"Z16 "));
        assert_eq!(code.to_string(), "Z16 ");

        assert!("TOOLONG".parse::<FourCc>().is_err());
        assert!("".parse::<FourCc>().is_err());
    }

    #[test]
    fn test_fourcc_packed_u32_is_little_endian() {
        let packed = u32::from_le_bytes(*b"YUY2");
        assert_eq!(FourCc::from(packed), FourCc::new(b"YUY2"));
        assert_eq!(u32::from(FourCc::new(b"YUY2")), packed);
    }

    #[test]
    fn test_native_encoding_from_fourcc() {
        for encoding in NativeEncoding::ALL {
            assert_eq!(NativeEncoding::try_from(encoding.fourcc()).unwrap(), encoding);
        }
        assert_eq!("Y12I".parse::<NativeEncoding>().unwrap(), NativeEncoding::Y12i);
        assert_eq!("Y8I".parse::<NativeEncoding>().unwrap(), NativeEncoding::Y8i);

        let err = NativeEncoding::try_from(FourCc::new(b"MJPG")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported format: MJPG");
    }

    #[test]
    fn test_native_encoding_display() {
        assert_eq!(NativeEncoding::Y8.to_string(), "Y8");
        assert_eq!(NativeEncoding::Inri.to_string(), "INRI");
    }

    #[test]
    fn test_passthrough_formats() {
        assert_eq!(
            NativeEncoding::Invz.passthrough_format(),
            Some(StandardFormat::Z16)
        );
        assert_eq!(
            NativeEncoding::Yuy2.passthrough_format(),
            Some(StandardFormat::Yuyv)
        );
        assert_eq!(NativeEncoding::Y12i.passthrough_format(), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&NativeEncoding::Y12i).unwrap();
        assert_eq!(json, "\"Y12I\"");
        let format: StandardFormat = serde_json::from_str("\"bgra8\"").unwrap();
        assert_eq!(format, StandardFormat::Bgra8);
    }
}

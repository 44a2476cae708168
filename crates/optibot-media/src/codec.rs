//! Video codec selection.
//!
//! Hardware encoders are only exposed where the driver stacks are supported:
//! NVENC and AMF on Windows. Every other combination falls back to the
//! software encoder.

use std::str::FromStr;

/// Default software encoder used whenever no hardware path applies.
pub const DEFAULT_VIDEO_CODEC: &str = "libx265";

/// Host platform, determined at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }
}

/// Configured acceleration hardware vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccelVendor {
    /// No acceleration configured, or an unrecognized vendor string.
    #[default]
    None,
    Nvidia,
    Amd,
}

impl FromStr for AccelVendor {
    type Err = std::convert::Infallible;

    /// Case-insensitive; unknown vendors degrade to [`AccelVendor::None`]
    /// rather than failing, so a typo in the config costs hardware
    /// acceleration but never the job.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "nvidia" => AccelVendor::Nvidia,
            "amd" => AccelVendor::Amd,
            _ => AccelVendor::None,
        })
    }
}

/// Select the video encoder for a platform/vendor pair.
///
/// Total over the whole domain; the default software codec is the answer for
/// every combination without a dedicated hardware path.
pub fn select_video_codec(platform: Platform, vendor: AccelVendor) -> &'static str {
    match (platform, vendor) {
        (Platform::Windows, AccelVendor::Nvidia) => "hevc_nvenc",
        (Platform::Windows, AccelVendor::Amd) => "hevc_amf",
        _ => DEFAULT_VIDEO_CODEC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_hardware_paths() {
        assert_eq!(
            select_video_codec(Platform::Windows, AccelVendor::Nvidia),
            "hevc_nvenc"
        );
        assert_eq!(
            select_video_codec(Platform::Windows, AccelVendor::Amd),
            "hevc_amf"
        );
    }

    #[test]
    fn everything_else_uses_software_codec() {
        for platform in [
            Platform::Windows,
            Platform::Linux,
            Platform::MacOs,
            Platform::Other,
        ] {
            for vendor in [AccelVendor::None, AccelVendor::Nvidia, AccelVendor::Amd] {
                let codec = select_video_codec(platform, vendor);
                if platform == Platform::Windows && vendor != AccelVendor::None {
                    continue;
                }
                assert_eq!(codec, DEFAULT_VIDEO_CODEC);
            }
        }
    }

    #[test]
    fn vendor_parsing_is_case_insensitive_and_total() {
        assert_eq!("NVIDIA".parse::<AccelVendor>().unwrap(), AccelVendor::Nvidia);
        assert_eq!("Amd".parse::<AccelVendor>().unwrap(), AccelVendor::Amd);
        assert_eq!("none".parse::<AccelVendor>().unwrap(), AccelVendor::None);
        assert_eq!("intel".parse::<AccelVendor>().unwrap(), AccelVendor::None);
        assert_eq!("".parse::<AccelVendor>().unwrap(), AccelVendor::None);
    }
}

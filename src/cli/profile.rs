//! Output profiles trading write speed against file size.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use mocktarget::writer::{CompressionType, WriterConfig};

/// Output profile selecting a writer preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Snappy, 50,000-row groups.
    Fast,

    /// ZSTD level 3, 100,000-row groups (default).
    #[default]
    Balanced,

    /// ZSTD level 22, 500,000-row groups.
    MaxCompression,
}

impl Profile {
    /// Writer preset of this profile.
    pub fn writer_config(&self) -> WriterConfig {
        match self {
            Profile::Fast => WriterConfig::fast_write(),
            Profile::Balanced => WriterConfig::balanced(),
            Profile::MaxCompression => WriterConfig::max_compression(),
        }
    }

    /// ZSTD level used when a configuration names zstd without a level.
    pub fn compression_level(&self) -> i32 {
        match self.writer_config().compression {
            CompressionType::Zstd(level) => level,
            _ => 3,
        }
    }

    /// Returns all available profile names.
    pub fn variants() -> &'static [&'static str] {
        &["fast", "balanced", "max-compression"]
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Fast => write!(f, "fast"),
            Profile::Balanced => write!(f, "balanced"),
            Profile::MaxCompression => write!(f, "max-compression"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Profile::Fast),
            "balanced" | "default" => Ok(Profile::Balanced),
            "max-compression" | "max" => Ok(Profile::MaxCompression),
            _ => Err(format!(
                "Unknown profile '{}'. Valid options: {}",
                s,
                Profile::variants().join(", ")
            )),
        }
    }
}

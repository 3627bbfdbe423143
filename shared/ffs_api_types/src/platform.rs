use core::fmt;
use core::str::FromStr;

/// SoC family the example runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Zynq,
    /// Zynq UltraScale+ MPSoC. Also the emulation platform class, where
    /// large transfers take too long.
    ZynqUltraMp,
    Versal,
    Unknown,
}

impl Platform {
    /// Classify a device-tree `compatible` property: a list of
    /// NUL-separated strings, most specific first.
    pub fn from_compatible(compatible: &[u8]) -> Self {
        for entry in compatible.split(|&b| b == 0) {
            let Ok(entry) = core::str::from_utf8(entry) else { continue };
            match entry.trim() {
                s if s.starts_with("xlnx,zynqmp")    => return Platform::ZynqUltraMp,
                s if s.starts_with("xlnx,zynq-7000") => return Platform::Zynq,
                s if s.starts_with("xlnx,versal")    => return Platform::Versal,
                _ => {}
            }
        }
        Platform::Unknown
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Zynq        => "zynq",
            Platform::ZynqUltraMp => "zynqmp",
            Platform::Versal      => "versal",
            Platform::Unknown     => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownPlatform;

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: zynq, zynqmp, versal, unknown")
    }
}

impl core::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: [(&str, Platform); 5] = [
            ("zynq",          Platform::Zynq),
            ("zynqmp",        Platform::ZynqUltraMp),
            ("zynq-ultra-mp", Platform::ZynqUltraMp),
            ("versal",        Platform::Versal),
            ("unknown",       Platform::Unknown),
        ];
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, platform)| platform)
            .ok_or(UnknownPlatform)
    }
}

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    Direct,
    HardwareList,
    BufferReplay,
    SoftwareEmulation,
}

impl DrawMode {
    pub const ALL: [DrawMode; 4] = [
        DrawMode::Direct,
        DrawMode::HardwareList,
        DrawMode::BufferReplay,
        DrawMode::SoftwareEmulation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DrawMode::Direct => "direct",
            DrawMode::HardwareList => "hardware list",
            DrawMode::BufferReplay => "buffer replay",
            DrawMode::SoftwareEmulation => "software emulation",
        }
    }

    /// True for modes that run on the driver's command-list extension.
    pub fn requires_command_list(self) -> bool {
        matches!(self, DrawMode::HardwareList | DrawMode::BufferReplay)
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rejected backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    Unsupported(DrawMode),
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::Unsupported(mode) => {
                write!(f, "draw mode '{mode}' needs command-list support, which the device lacks")
            }
        }
    }
}

impl std::error::Error for SelectError {}

// ABOUTME: Operational modes selecting which service roles the supervisor runs.
// ABOUTME: Parses canonical names and aliases, rejecting anything else as InvalidMode.

use crate::error::RenderError;
use std::fmt;
use std::str::FromStr;

/// A group of services run together under the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Region,
    Rack,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Region => "region",
            Role::Rack => "rack",
        }
    }
}

/// Operational mode of the host application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    None,
    Region,
    Rack,
    RegionRack,
    All,
}

impl Mode {
    #[cfg(test)]
    pub const ALL: [Mode; 5] = [
        Mode::None,
        Mode::Region,
        Mode::Rack,
        Mode::RegionRack,
        Mode::All,
    ];

    /// Canonical name, as written back into the rendered config header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::None => "none",
            Mode::Region => "region",
            Mode::Rack => "rack",
            Mode::RegionRack => "region+rack",
            Mode::All => "all",
        }
    }

    /// Roles run in this mode, region first.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Mode::None => &[],
            Mode::Region => &[Role::Region],
            Mode::Rack => &[Role::Rack],
            Mode::RegionRack | Mode::All => &[Role::Region, Role::Rack],
        }
    }

    pub fn runs(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Mode::None),
            "region" | "region-only" => Ok(Mode::Region),
            "rack" | "rack-only" => Ok(Mode::Rack),
            "region+rack" | "combined" => Ok(Mode::RegionRack),
            "all" => Ok(Mode::All),
            _ => Err(RenderError::InvalidMode(s.to_string())),
        }
    }
}

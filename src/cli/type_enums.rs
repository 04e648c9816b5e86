use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which host package manager provisions the system packages.
/// `Auto` searches PATH for the supported managers in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerKind {
    #[default]
    Auto,
    Apt,    // Debian, Ubuntu (apt-get + dpkg-query)
    Dnf,    // Fedora, RHEL 8+
    Yum,    // Older RHEL / CentOS
    Apk,    // Alpine
    Pacman, // Arch
    Zypper, // openSUSE
    Brew,   // Homebrew (macOS/Linux), never run under sudo
}

impl PackageManagerKind {
    pub const ALL: [&'static str; 8] = [
        "auto", "apt", "dnf", "yum", "apk", "pacman", "zypper", "brew",
    ];
}

impl FromStr for PackageManagerKind {
    type Err = String;

    /// Case-insensitive; `apt-get` is accepted as an alias of `apt`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PackageManagerKind::Auto),
            "apt" | "apt-get" => Ok(PackageManagerKind::Apt),
            "dnf" => Ok(PackageManagerKind::Dnf),
            "yum" => Ok(PackageManagerKind::Yum),
            "apk" => Ok(PackageManagerKind::Apk),
            "pacman" => Ok(PackageManagerKind::Pacman),
            "zypper" => Ok(PackageManagerKind::Zypper),
            "brew" => Ok(PackageManagerKind::Brew),
            _ => Err(format!(
                "Invalid package manager '{s}'. Must be one of: {}",
                Self::ALL.join(", ")
            )),
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PackageManagerKind::Auto => "auto",
            PackageManagerKind::Apt => "apt",
            PackageManagerKind::Dnf => "dnf",
            PackageManagerKind::Yum => "yum",
            PackageManagerKind::Apk => "apk",
            PackageManagerKind::Pacman => "pacman",
            PackageManagerKind::Zypper => "zypper",
            PackageManagerKind::Brew => "brew",
        };
        write!(f, "{name}")
    }
}

/// How package installation obtains root privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeMode {
    /// Run directly as root, otherwise through `sudo -n` when available.
    #[default]
    Auto,
    /// Always prefix with `sudo -n`.
    Sudo,
    /// Never escalate.
    None,
}

impl FromStr for PrivilegeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PrivilegeMode::Auto),
            "sudo" => Ok(PrivilegeMode::Sudo),
            "none" => Ok(PrivilegeMode::None),
            _ => Err(format!(
                "Invalid privilege mode '{s}'. Must be one of: auto, sudo, none"
            )),
        }
    }
}

impl fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrivilegeMode::Auto => write!(f, "auto"),
            PrivilegeMode::Sudo => write!(f, "sudo"),
            PrivilegeMode::None => write!(f, "none"),
        }
    }
}

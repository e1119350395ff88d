use serde::{Deserialize, Serialize};
use std::fmt;

/// Service type as reported in the `<type>` element of a Monit status entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Filesystem,
    Directory,
    File,
    Process,
    Host,
    System,
    Fifo,
    Program,
    Network,
}

impl ServiceType {
    pub const ALL: [ServiceType; 9] = [
        ServiceType::Filesystem,
        ServiceType::Directory,
        ServiceType::File,
        ServiceType::Process,
        ServiceType::Host,
        ServiceType::System,
        ServiceType::Fifo,
        ServiceType::Program,
        ServiceType::Network,
    ];

    /// Resolve a `<type>` code; unknown codes yield `None`
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(ServiceType::Filesystem),
            "1" => Some(ServiceType::Directory),
            "2" => Some(ServiceType::File),
            "3" => Some(ServiceType::Process),
            "4" => Some(ServiceType::Host),
            "5" => Some(ServiceType::System),
            "6" => Some(ServiceType::Fifo),
            "7" => Some(ServiceType::Program),
            "8" => Some(ServiceType::Network),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceType::Filesystem => "0",
            ServiceType::Directory => "1",
            ServiceType::File => "2",
            ServiceType::Process => "3",
            ServiceType::Host => "4",
            ServiceType::System => "5",
            ServiceType::Fifo => "6",
            ServiceType::Program => "7",
            ServiceType::Network => "8",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::Filesystem => "filesystem",
            ServiceType::Directory => "directory",
            ServiceType::File => "file",
            ServiceType::Process => "process",
            ServiceType::Host => "host",
            ServiceType::System => "system",
            ServiceType::Fifo => "fifo",
            ServiceType::Program => "program",
            ServiceType::Network => "network",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

//! Environment identifiers
//!
//! Every logical environment in a process is keyed by a small integer id.
//! The id doubles as the namespace for on-disk config lookup: environment
//! `N` reads its connection parameters from `dbconn<N>.json`.

use crate::error::{Error, Result};
use std::fmt;

/// Process environment variable naming the default environment id
pub const ENV_ID_VAR: &str = "SQLENV_ID";

/// Upper bound on concurrently registered environments
pub const MAX_ENVIRONMENTS: usize = 15;

/// Identifier of one logical environment
///
/// Totally ordered, stable for the process lifetime once read. Displays as
/// its number, which is also how config files and log lines refer to it.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvId {
    /// Primary environment
    Main = 1,
    /// Long-running run environment
    Run = 2,
    /// Performance test environment
    PerfTest = 3,
    /// Interactive shell environment
    Shell = 4,
    /// Core test environment
    CoreTest = 5,
    /// Engine test environment
    EngineTest = 6,
    /// Scratch environment for temporary data
    TempTest = 7,
    /// Bulk load environment
    Load = 8,
}

impl EnvId {
    /// Numeric value of this id
    #[inline]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Name of the connection config file for this environment
    pub fn config_file_name(self) -> String {
        format!("dbconn{}.json", self.number())
    }

    /// Resolve the default environment id from the process environment
    ///
    /// Reads `SQLENV_ID`; absent means [`EnvId::Main`]. A present but
    /// unparsable value is a configuration error, not a silent fallback.
    pub fn from_process_env() -> Result<EnvId> {
        match std::env::var(ENV_ID_VAR) {
            Ok(raw) => {
                let n: u8 = raw.parse().map_err(|_| {
                    Error::Config(format!("{ENV_ID_VAR} is not an environment number: {raw}"))
                })?;
                EnvId::try_from(n)
            }
            Err(_) => Ok(EnvId::Main),
        }
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl TryFrom<u8> for EnvId {
    type Error = Error;

    fn try_from(n: u8) -> Result<EnvId> {
        match n {
            1 => Ok(EnvId::Main),
            2 => Ok(EnvId::Run),
            3 => Ok(EnvId::PerfTest),
            4 => Ok(EnvId::Shell),
            5 => Ok(EnvId::CoreTest),
            6 => Ok(EnvId::EngineTest),
            7 => Ok(EnvId::TempTest),
            8 => Ok(EnvId::Load),
            _ => Err(Error::Config(format!("unknown environment number {n}"))),
        }
    }
}

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate cascade;
#[macro_use]
extern crate thiserror;
#[macro_use]
extern crate log;
#[macro_use]
extern crate shrinkwraprs;

mod agent;
mod common;
mod query;
mod report;
mod update;

pub use self::{agent::*, query::*, report::*, update::*};
pub use self::common::{error_chain, format_timestamp, from_ole_date, join_values};

use std::io;

/// A fault raised by the update service, independent of the platform's error type.
#[derive(Clone, Debug, Default, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct Fault {
    /// The `HRESULT` of the failed call, or 0 when none was given.
    pub code:    i32,
    pub message: Box<str>,
}

impl Fault {
    pub fn new<M: Into<Box<str>>>(message: M) -> Self { Self { code: 0, message: message.into() } }
}

#[cfg(windows)]
impl From<windows::core::Error> for Fault {
    fn from(why: windows::core::Error) -> Self {
        let code = why.code().0;
        let message = why.message();
        let message = if message.trim().is_empty() {
            format!("HRESULT {:#010X}", code as u32)
        } else {
            format!("{} ({:#010X})", message.trim(), code as u32)
        };

        Fault { code, message: message.into() }
    }
}

/// An error that may occur when querying the update service or writing the report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to wait for a key press")]
    Acknowledge(#[source] io::Error),
    #[error("unable to initialize COM for the update session")]
    ComInit(#[source] Fault),
    #[error("unable to create an update searcher")]
    CreateSearcher(#[source] Fault),
    #[error("failed to write the update report")]
    Output(#[source] io::Error),
    #[error("failed to get property {} of update", _0)]
    Property(&'static str, #[source] Fault),
    #[error("search for `{}` failed", _0)]
    Search(Criteria, #[source] Fault),
    #[error("unable to open an update session")]
    Session(#[source] Fault),
    #[error("the Windows Update Agent is not available on this platform")]
    Unsupported,
}

/// A service which hands out searchers for its update catalog.
pub trait UpdateService {
    type Searcher: UpdateSearcher;

    /// Opens a session with the service, yielding the searcher used for every query.
    fn open(&self) -> Result<Self::Searcher, Error>;
}

/// Runs update searches against an open session.
pub trait UpdateSearcher {
    /// Fetches a snapshot of every update matching the criteria, in the service's order.
    fn search(&self, criteria: &Criteria) -> Result<Vec<Update>, Error>;
}

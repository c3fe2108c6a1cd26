//! Query options.

use no_panic::no_panic;
use url::Url;

use crate::error::Error;

/// What `close()` does when an `execute()` on the same query is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosePolicy {
    /// Wait for the in-flight execute to complete, then release the cursor
    #[default]
    Wait,
    /// Fail immediately with `Error::InvalidState`
    Reject,
}

/// Options applied to queries created with [`Query::with_opts`](crate::tokio::Query::with_opts).
#[derive(Debug, Clone)]
pub struct Opts {
    /// Initial fetch size for queries over prepared statements.
    ///
    /// `0` fetches every row in one page. Simple statements ignore this value.
    ///
    /// Default: `0`
    pub fetch_size: u32,

    /// Behavior of `close()` while an execute is in flight.
    ///
    /// Default: `ClosePolicy::Wait`
    pub close_policy: ClosePolicy,
}

impl Default for Opts {
    #[no_panic]
    fn default() -> Self {
        Self {
            fetch_size: 0,
            close_policy: ClosePolicy::Wait,
        }
    }
}

impl TryFrom<&Url> for Opts {
    type Error = Error;

    /// Read query options from a PostgreSQL connection URL.
    ///
    /// Format: `postgres://[user[:password]@]host[:port][/database][?param1=value1&..]`
    ///
    /// Supported query parameters:
    /// - `fetch_size`: non-negative integer, 0 = unbounded
    /// - `close_policy`: wait, reject
    ///
    /// Other parameters configure the connection and are ignored here.
    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if !["postgres", "pg"].contains(&url.scheme()) {
            return Err(Error::InvalidUsage(format!(
                "Invalid scheme: expected 'postgres://' or 'pg://', got '{}://'",
                url.scheme()
            )));
        }

        let mut opts = Opts::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "fetch_size" => {
                    opts.fetch_size = value.parse().map_err(|_| {
                        Error::InvalidUsage(format!("Invalid fetch_size: {}", value))
                    })?;
                }
                "close_policy" => {
                    opts.close_policy = match value.as_ref() {
                        "wait" => ClosePolicy::Wait,
                        "reject" => ClosePolicy::Reject,
                        _ => {
                            return Err(Error::InvalidUsage(format!(
                                "Invalid close_policy: expected one of ['wait', 'reject'], got {}",
                                value
                            )));
                        }
                    };
                }
                _ => {}
            }
        }

        Ok(opts)
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(s).map_err(|e| Error::InvalidUsage(format!("Invalid URL: {}", e)))?;
        Self::try_from(&url)
    }
}

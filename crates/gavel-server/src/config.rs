use figment::{
    providers::Env,
    Figment,
};
use serde::{
    Deserialize,
    Serialize,
};

/// The single config for creating a gavel-server service.
///
/// Read from the environment with a `GAVEL_` prefix, e.g.
/// `GAVEL_LISTEN_ADDR=127.0.0.1:9000`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// The socket address the JSON-RPC server listens on.
    pub listen_addr: String,
    /// Log filter directives for the service.
    pub log: String,
}

impl Config {
    const PREFIX: &'static str = "GAVEL_";

    /// Reads the config from the environment.
    ///
    /// `RUST_LOG` is merged in as the `log` field so the conventional
    /// variable keeps working alongside `GAVEL_LOG`.
    ///
    /// # Errors
    /// Returns an error if a required variable is unset or fails to
    /// deserialize into the target field.
    pub fn get() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Env::prefixed("RUST_").split("_").only(&["log"]))
            .merge(Env::prefixed(Self::PREFIX))
            .extract()
    }
}

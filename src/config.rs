//! Command-line and environment configuration for the server binary.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::nlu::{HttpNlu, HttpNluConfig};
use crate::secret::Secret;
use crate::Error;

/// Server configuration; every flag can also come from the environment.
#[derive(Parser)]
#[command(name = "campus-gate")]
#[command(about = "Role-gated natural-language command service for the school dashboard")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "CAMPUS_GATE_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Chat-completions endpoint of the NLU provider
    #[arg(
        long,
        env = "CAMPUS_GATE_NLU_ENDPOINT",
        default_value = "https://api.openai.com/v1/chat/completions"
    )]
    pub nlu_endpoint: String,

    /// Model name sent to the NLU provider
    #[arg(long, env = "CAMPUS_GATE_NLU_MODEL", default_value = "gpt-4o-mini")]
    pub nlu_model: String,

    /// API key for the NLU provider
    #[arg(long, env = "CAMPUS_GATE_NLU_API_KEY", hide_env_values = true)]
    pub nlu_api_key: Option<String>,

    /// Seconds before an NLU call is abandoned
    #[arg(long, env = "CAMPUS_GATE_NLU_TIMEOUT_SECS", default_value_t = 5)]
    pub nlu_timeout_secs: u64,

    /// Longest accepted query, in characters
    #[arg(long, env = "CAMPUS_GATE_MAX_QUERY_LEN", default_value_t = 512)]
    pub max_query_len: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log one JSON object per line
    #[arg(long)]
    pub log_json: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("nlu_endpoint", &self.nlu_endpoint)
            .field("nlu_model", &self.nlu_model)
            .field("nlu_api_key", &self.nlu_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("nlu_timeout_secs", &self.nlu_timeout_secs)
            .field("max_query_len", &self.max_query_len)
            .field("verbose", &self.verbose)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Config {
    /// Rejects settings the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero timeout, a zero query length, or
    /// an empty endpoint.
    pub fn validate(&self) -> Result<(), Error> {
        if self.nlu_timeout_secs == 0 {
            return Err(Error::Config("nlu timeout must be at least one second".into()));
        }
        if self.max_query_len == 0 {
            return Err(Error::Config("max query length must be positive".into()));
        }
        if self.nlu_endpoint.trim().is_empty() {
            return Err(Error::Config("nlu endpoint is empty".into()));
        }
        Ok(())
    }

    /// Bound on each NLU call.
    pub fn nlu_timeout(&self) -> Duration {
        Duration::from_secs(self.nlu_timeout_secs)
    }

    /// Builds the HTTP NLU client from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nlu`] if the HTTP client cannot be set up.
    pub fn build_nlu(&self) -> Result<HttpNlu, Error> {
        Ok(HttpNlu::new(self.nlu_config())?)
    }

    /// Connection settings for the HTTP NLU provider.
    ///
    /// The client timeout matches the per-call bound so a stalled connection
    /// is torn down rather than left behind the abandoned call.
    pub fn nlu_config(&self) -> HttpNluConfig {
        HttpNluConfig {
            endpoint: self.nlu_endpoint.clone(),
            model: self.nlu_model.clone(),
            api_key: self
                .nlu_api_key
                .as_ref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| Secret::new(k.clone())),
            timeout: self.nlu_timeout(),
        }
    }
}

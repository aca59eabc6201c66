use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::transform::{Field, Transform};

// Upper bound for --persist-queue
pub const MAX_PERSIST_QUEUE: u64 = 1 << 20;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "rproxy")]
#[command(about = "Rate limiting reverse proxy for a JSON API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "RPROXY_PORT", default_value_t = 8080)]
    pub port: u16,

    // Address to bind
    #[arg(long, env = "RPROXY_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    // Upstream JSON API every request is forwarded to
    #[arg(short, long, env = "RPROXY_UPSTREAM", default_value = "http://jsonplaceholder.typicode.com")]
    pub upstream: String,

    // Upstream timeout in seconds
    #[arg(long, env = "RPROXY_UPSTREAM_TIMEOUT", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub upstream_timeout: u64,

    // Rate limit max requests per window
    #[arg(long, env = "RPROXY_RATE_LIMIT", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RPROXY_RATE_WINDOW", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window: u64,

    // Anchor windows at their first request instead of the latest one
    #[arg(long, env = "RPROXY_STRICT_WINDOW")]
    pub strict_window: bool,

    // Seconds between sweeps of expired client windows, 0 disables
    #[arg(long, env = "RPROXY_SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    // Key clients by the first X-Forwarded-For entry when present
    #[arg(long, env = "RPROXY_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    // Field injected into every response, KEY=VALUE, repeatable
    #[arg(long = "set", value_name = "KEY=VALUE", default_value = "foo=bar")]
    pub set: Vec<Field>,

    // Directory for requests.jsonl / responses.jsonl, log only when unset
    #[arg(long, env = "RPROXY_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    // Capacity of the persistence queue
    #[arg(long, env = "RPROXY_PERSIST_QUEUE", default_value_t = 1024,
          value_parser = clap::value_parser!(u64).range(1..=MAX_PERSIST_QUEUE))]
    pub persist_queue: u64,
}

impl Args {
    pub fn transform(&self) -> Transform {
        Transform::new(self.set.iter().map(|f| (f.key.clone(), f.value.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn defaults_match_the_documented_limits() {
        let args = Args::try_parse_from(["rproxy"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.rate_limit, 10);
        assert_eq!(args.rate_window, 60);
        assert_eq!(args.upstream, "http://jsonplaceholder.typicode.com");
        assert!(!args.strict_window);
        assert!(args.store_dir.is_none());
        assert_eq!(args.transform(), Transform::default());
    }

    #[test]
    fn set_replaces_default_fields() {
        let args =
            Args::try_parse_from(["rproxy", "--set", "via=rproxy", "--set", "env=test"]).unwrap();
        let mut data = Map::new();
        args.transform().apply(&mut data);

        assert_eq!(data.get("via"), Some(&json!("rproxy")));
        assert_eq!(data.get("env"), Some(&json!("test")));
        assert!(data.get("foo").is_none());
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(Args::try_parse_from(["rproxy", "--rate-limit", "0"]).is_err());
        assert!(Args::try_parse_from(["rproxy", "--rate-window", "0"]).is_err());
        assert!(Args::try_parse_from(["rproxy", "--set", "broken"]).is_err());
    }

    #[test]
    fn persist_queue_is_bounded() {
        assert!(Args::try_parse_from(["rproxy", "--persist-queue", "0"]).is_err());
        assert!(Args::try_parse_from(["rproxy", "--persist-queue", "18446744073709551615"]).is_err());

        let max = MAX_PERSIST_QUEUE.to_string();
        let args = Args::try_parse_from(["rproxy", "--persist-queue", max.as_str()]).unwrap();
        assert_eq!(args.persist_queue, MAX_PERSIST_QUEUE);
    }
}

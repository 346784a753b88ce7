use crate::domain::account::CommandPolicy;

// ============================================================================
// Configuration
// ============================================================================
//
// Environment-driven settings with logged defaults. Unparsable values fall
// back to the default rather than aborting startup.
//
// Variables:
//   LEDGER_HTTP_ADDR               API bind address (default 127.0.0.1:8080)
//   LEDGER_METRICS_PORT            metrics server port (default 9090)
//   LEDGER_MIN_TRANSACTION_AMOUNT  minimum deposit/withdraw amount
//   LEDGER_DISALLOWED_NAME_PREFIX  rejected account holder name prefix
//   LEDGER_ALLOW_OVERDRAFT         whether balances may go negative
//   LEDGER_SEED_DEMO               seed the demo account on startup
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,
    pub metrics_port: u16,
    pub seed_demo: bool,
    pub policy: CommandPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            metrics_port: 9090,
            seed_demo: true,
            policy: CommandPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let default_policy = defaults.policy.clone();

        Self {
            http_addr: get("LEDGER_HTTP_ADDR").unwrap_or(defaults.http_addr),
            metrics_port: parse_or(get("LEDGER_METRICS_PORT"), "LEDGER_METRICS_PORT", defaults.metrics_port),
            seed_demo: parse_or(get("LEDGER_SEED_DEMO"), "LEDGER_SEED_DEMO", defaults.seed_demo),
            policy: CommandPolicy {
                min_transaction_amount: parse_or(
                    get("LEDGER_MIN_TRANSACTION_AMOUNT"),
                    "LEDGER_MIN_TRANSACTION_AMOUNT",
                    default_policy.min_transaction_amount,
                ),
                disallowed_name_prefix: get("LEDGER_DISALLOWED_NAME_PREFIX")
                    .unwrap_or(default_policy.disallowed_name_prefix),
                allow_overdraft: parse_or(
                    get("LEDGER_ALLOW_OVERDRAFT"),
                    "LEDGER_ALLOW_OVERDRAFT",
                    default_policy.allow_overdraft,
                ),
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Unparsable config value, using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.http_addr, "127.0.0.1:8080");
        assert_eq!(config.metrics_port, 9090);
        assert!(config.seed_demo);
        assert_eq!(config.policy.min_transaction_amount, 1_000);
        assert_eq!(config.policy.disallowed_name_prefix, "Cindy");
        assert!(config.policy.allow_overdraft);
    }

    #[test]
    fn test_values_are_read_from_the_environment() {
        let config = Config::from_lookup(|key| match key {
            "LEDGER_HTTP_ADDR" => Some("0.0.0.0:9000".to_string()),
            "LEDGER_METRICS_PORT" => Some("9191".to_string()),
            "LEDGER_MIN_TRANSACTION_AMOUNT" => Some("5000".to_string()),
            "LEDGER_DISALLOWED_NAME_PREFIX" => Some("Bob".to_string()),
            "LEDGER_ALLOW_OVERDRAFT" => Some("false".to_string()),
            "LEDGER_SEED_DEMO" => Some("false".to_string()),
            _ => None,
        });

        assert_eq!(config.http_addr, "0.0.0.0:9000");
        assert_eq!(config.metrics_port, 9191);
        assert!(!config.seed_demo);
        assert_eq!(config.policy.min_transaction_amount, 5_000);
        assert_eq!(config.policy.disallowed_name_prefix, "Bob");
        assert!(!config.policy.allow_overdraft);
    }

    #[test]
    fn test_unparsable_values_fall_back_to_defaults() {
        let config = Config::from_lookup(|key| match key {
            "LEDGER_METRICS_PORT" => Some("not-a-port".to_string()),
            "LEDGER_ALLOW_OVERDRAFT" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.metrics_port, 9090);
        assert!(config.policy.allow_overdraft);
    }
}

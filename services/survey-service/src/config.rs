use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

use intake_common::env_or;

const DEFAULT_STORE_PATH: &str = "data/survey.ndjson";

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub store_path: PathBuf,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        // Port 0 lets the host pick; the bound address is logged at startup.
        Self {
            bind_addr: env_or("BIND_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: env_or("PORT", 0u16),
            store_path: env_or("SURVEY_LOG_PATH", PathBuf::from(DEFAULT_STORE_PATH)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_overrides_from_env() {
        std::env::set_var("BIND_ADDR", "127.0.0.1");
        std::env::set_var("PORT", "8085");
        std::env::set_var("SURVEY_LOG_PATH", "/tmp/intake/survey.ndjson");

        let config = ServiceConfig::from_env();
        assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 8085);
        assert_eq!(config.store_path, PathBuf::from("/tmp/intake/survey.ndjson"));

        std::env::remove_var("BIND_ADDR");
        std::env::remove_var("PORT");
        std::env::remove_var("SURVEY_LOG_PATH");

        let config = ServiceConfig::from_env();
        assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 0);
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }
}

//! Runtime configuration
//!
//! Validated once at startup from the `constants` section of the settings
//! document. Placeholder credentials are a configuration error, surfaced
//! once and never retried.

use prism_auth::ProviderConfig;
use prism_store::{Constants, PLACEHOLDER_BULB_ADDR, PLACEHOLDER_CREDENTIAL};

use crate::{CoreError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub api_base_url: String,
    pub bulb_addr: String,
    pub min_brightness: u8,
}

impl Config {
    pub fn from_constants(constants: &Constants) -> Result<Self> {
        if is_placeholder(&constants.client_id, PLACEHOLDER_CREDENTIAL)
            || is_placeholder(&constants.client_secret, PLACEHOLDER_CREDENTIAL)
        {
            return Err(CoreError::Config(
                "client credentials are not filled in".to_string(),
            ));
        }
        if is_placeholder(&constants.bulb_addr, PLACEHOLDER_BULB_ADDR) {
            return Err(CoreError::Config(
                "bulb address is not filled in".to_string(),
            ));
        }

        Ok(Self {
            provider: ProviderConfig {
                client_id: constants.client_id.clone(),
                client_secret: constants.client_secret.clone(),
                redirect_uri: constants.redirect_uri.clone(),
                auth_url: constants.auth_url.clone(),
                token_url: constants.token_url.clone(),
            },
            api_base_url: constants.api_base_url.clone(),
            bulb_addr: constants.bulb_addr.clone(),
            min_brightness: constants.min_brightness,
        })
    }
}

fn is_placeholder(value: &str, placeholder: &str) -> bool {
    value.is_empty() || value == placeholder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_constants() -> Constants {
        Constants {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            bulb_addr: "192.168.1.20".to_string(),
            ..Constants::default()
        }
    }

    #[test]
    fn test_default_constants_are_rejected() {
        let result = Config::from_constants(&Constants::default());
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_placeholder_bulb_addr_is_rejected() {
        let mut constants = filled_constants();
        constants.bulb_addr = "xxx.xxx.xxx.xxx".to_string();
        assert!(matches!(
            Config::from_constants(&constants),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_filled_constants_build_a_config() {
        let config = Config::from_constants(&filled_constants()).unwrap();
        assert_eq!(config.provider.client_id, "client");
        assert_eq!(config.bulb_addr, "192.168.1.20");
        assert_eq!(config.api_base_url, "https://api.spotify.com/v1/");
        assert_eq!(config.min_brightness, 0);
    }
}

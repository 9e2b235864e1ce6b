//! Settings document schema
//!
//! The on-disk document has exactly two sections. `constants` holds values
//! the user fills in once; `session` holds state the application writes back.

use prism_color::ColorMode;
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_CREDENTIAL: &str = "None";
pub const PLACEHOLDER_BULB_ADDR: &str = "xxx.xxx.xxx.xxx";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub constants: Constants,
    #[serde(default)]
    pub session: SessionSettings,
}

/// Values fixed for the process lifetime. The credential and bulb fields
/// start out as placeholders the user must replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constants {
    pub client_id: String,
    pub client_secret: String,
    pub bulb_addr: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
    /// Brightness floor pushed to the bulb; 0 disables the floor.
    pub min_brightness: u8,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            client_id: PLACEHOLDER_CREDENTIAL.to_string(),
            client_secret: PLACEHOLDER_CREDENTIAL.to_string(),
            bulb_addr: PLACEHOLDER_BULB_ADDR.to_string(),
            redirect_uri: "http://localhost:5000/callback".to_string(),
            auth_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base_url: "https://api.spotify.com/v1/".to_string(),
            min_brightness: 0,
        }
    }
}

/// Token material and preferences written back by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds; meaningful only while `access_token` is present.
    pub expires_at: i64,
    pub mode: ColorMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            expires_at: 0,
            mode: ColorMode::default(),
        }
    }
}

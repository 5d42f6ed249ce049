use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root for stored PDFs, relative to the config directory unless absolute
    pub upload_dir: String,
    /// TOML document holding invoices, suppliers, categories and users
    pub database: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".to_string(),
            database: "archive.toml".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSettings {
    pub max_age_days: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { max_age_days: 7 }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSettings {
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { bcrypt_cost: 10 }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub currency_symbol: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: "€".to_string(),
        }
    }
}

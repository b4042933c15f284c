use crate::error::{AppError, Result};
use dotenvy::dotenv;
use std::env;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

#[derive(Clone, Debug)]
pub struct Config {
    /// May be empty; the classify path reports `MissingCredential` on use.
    pub gemini_api_key: String,
    pub model_name: String,
    /// Pointer-to-capture scale. `None` lets the overlay derive it.
    pub display_scale: Option<f32>,
    pub dev_mode: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();

        let model_name = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let display_scale = match env::var("OVERSOLVE_DISPLAY_SCALE") {
            Ok(raw) => Some(parse_scale(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            gemini_api_key: api_key,
            model_name,
            display_scale,
            dev_mode: dev_mode_from_env(),
        })
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            model_name: DEFAULT_MODEL.to_string(),
            display_scale: None,
            dev_mode: false,
        }
    }
}

/// Programmatic construction of a [`Config`], bypassing the environment.
#[derive(Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    display_scale: Option<f32>,
    dev_mode: bool,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_display_scale(mut self, scale: f32) -> Self {
        self.display_scale = Some(scale);
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn build(self) -> Result<Config> {
        if let Some(scale) = self.display_scale {
            validate_scale(scale)?;
        }

        let model_name = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Config {
            gemini_api_key: self.api_key.unwrap_or_default(),
            model_name,
            display_scale: self.display_scale,
            dev_mode: self.dev_mode,
        })
    }
}

/// Whether `OVERSOLVE_ENV=development` is set.
fn dev_mode_from_env() -> bool {
    env::var("OVERSOLVE_ENV")
        .map(|v| v.eq_ignore_ascii_case("development"))
        .unwrap_or(false)
}

fn parse_scale(raw: &str) -> Result<f32> {
    let scale: f32 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("OVERSOLVE_DISPLAY_SCALE is not a number: {raw}")))?;
    validate_scale(scale)?;
    Ok(scale)
}

fn validate_scale(scale: f32) -> Result<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(AppError::config(format!(
            "Display scale must be a positive number, got {scale}"
        )));
    }
    Ok(())
}

use std::{path::PathBuf, str::FromStr};

use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// StoreBackend
// ---------------------------------------------------------------------------

/// Where sensor readings are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "supabase" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("unknown store backend: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_table: String,
    /// ONNX regression graph.
    pub model_path: PathBuf,
    /// JSON scaler parameters.
    pub scaler_path: PathBuf,
    pub server_host: String,
    pub server_port: u16,
    /// Hours added to UTC when stamping new readings.
    pub utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let store_backend: StoreBackend = vars
            .optional("STORE_BACKEND", "supabase")
            .parse()
            .context("STORE_BACKEND must be 'supabase' or 'memory'")?;

        let (supabase_url, supabase_key) = match store_backend {
            StoreBackend::Supabase => (
                Some(vars.required("SUPABASE_URL")?),
                Some(vars.required("SUPABASE_KEY")?),
            ),
            StoreBackend::Memory => (vars.get("SUPABASE_URL"), vars.get("SUPABASE_KEY")),
        };

        let utc_offset_hours: i32 = vars
            .optional("LOCAL_UTC_OFFSET_HOURS", "7")
            .parse()
            .context("LOCAL_UTC_OFFSET_HOURS must be an integer")?;
        if !(-23..=23).contains(&utc_offset_hours) {
            bail!("LOCAL_UTC_OFFSET_HOURS must be between -23 and 23, got {utc_offset_hours}");
        }

        Ok(Self {
            store_backend,
            supabase_url,
            supabase_key,
            supabase_table: vars.optional("SUPABASE_TABLE", "sensor_data"),
            model_path: vars.optional("MODEL_PATH", "model_pmv.onnx").into(),
            scaler_path: vars.optional("SCALER_PATH", "scaler.json").into(),
            server_host: vars.optional("SERVER_HOST", "0.0.0.0"),
            server_port: vars
                .optional("PORT", "8000")
                .parse()
                .context("PORT must be a valid port number")?,
            utc_offset_hours,
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .with_context(|| format!("missing required env var: {key}"))
    }

    fn optional(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }
}

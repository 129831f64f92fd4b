use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub max_sessions: usize,
    /// Halfmove clock value at which a game is declared drawn.
    pub draw_halfmove_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            max_sessions: 1024,
            draw_halfmove_limit: 100,
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let path = Path::new("server.toml");
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings in '{}'", path.display()))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, toml::Value> = toml::from_str(raw)?;
    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("max_sessions").and_then(toml::Value::as_integer) {
        settings.max_sessions = usize::try_from(v).context("max_sessions must not be negative")?;
    }
    if let Some(v) = file_cfg
        .get("draw_halfmove_limit")
        .and_then(toml::Value::as_integer)
    {
        settings.draw_halfmove_limit =
            u32::try_from(v).context("draw_halfmove_limit out of range")?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("APP__MAX_SESSIONS") {
        settings.max_sessions = v
            .parse()
            .with_context(|| format!("APP__MAX_SESSIONS is not a count: '{v}'"))?;
    }
    if let Some(v) = var("APP__DRAW_HALFMOVE_LIMIT") {
        settings.draw_halfmove_limit = v
            .parse()
            .with_context(|| format!("APP__DRAW_HALFMOVE_LIMIT is not a count: '{v}'"))?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

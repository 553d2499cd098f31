//! Config subcommand handlers.

use std::fmt::Write as _;
use std::io::IsTerminal;

use dialoguer::Input;

use sitegrid_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the API key.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let _ = writeln!(out);
    let _ = writeln!(out, "[remote]");
    if let Some(ref url) = cfg.remote.url {
        let _ = writeln!(out, "url = \"{url}\"");
    }
    let _ = writeln!(out, "table = \"{}\"", cfg.remote.table);
    if let Some(timeout) = cfg.remote.timeout {
        let _ = writeln!(out, "timeout = {timeout}");
    }
    if cfg.remote.api_key.is_some() {
        let _ = writeln!(out, "api_key = \"****\"");
    }
    if let Some(ref env) = cfg.remote.api_key_env {
        let _ = writeln!(out, "api_key_env = \"{env}\"");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[cache]");
    let _ = writeln!(out, "dir = \"{}\"", config::data_dir(cfg).display());
    let _ = writeln!(out, "staleness_secs = {}", cfg.cache.staleness_secs);

    let v = &cfg.view;
    let _ = writeln!(out);
    let _ = writeln!(out, "[view]");
    let _ = writeln!(out, "filter_debounce_ms = {}", v.filter_debounce_ms);
    let _ = writeln!(out, "zoom_debounce_ms = {}", v.zoom_debounce_ms);
    let _ = writeln!(out, "zoom = {}", v.zoom);
    let _ = writeln!(out, "min_radius = {}", v.min_radius);
    let _ = writeln!(out, "max_radius = {}", v.max_radius);
    let _ = writeln!(out, "min_zoom = {}", v.min_zoom);
    let _ = writeln!(out, "zoom_range = {}", v.zoom_range);

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn validate_url(raw: &str) -> Result<(), CliError> {
    raw.parse::<url::Url>().map(|_| ()).map_err(|e| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL {raw:?}: {e}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { url, table, force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists (use --force to overwrite)", path.display()),
                });
            }

            let url = match url.or_else(|| global.url.clone()) {
                Some(url) => url,
                None if std::io::stdin().is_terminal() => Input::new()
                    .with_prompt("Remote server URL")
                    .default("http://localhost:5000".into())
                    .interact_text()
                    .map_err(prompt_err)?,
                None => {
                    return Err(CliError::Validation {
                        field: "url".into(),
                        reason: "pass --url when not running interactively".into(),
                    });
                }
            };
            validate_url(&url)?;

            let mut cfg = Config::default();
            cfg.remote.url = Some(url);
            if let Some(table) = table.or_else(|| global.table.clone()) {
                cfg.remote.table = table;
            }

            let written = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Config written to {}", written.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetApiKey => {
            let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "API key cannot be empty".into(),
                });
            }
            config::store_api_key(&key)?;
            if !global.quiet {
                eprintln!("API key stored in system keyring");
            }
            Ok(())
        }
    }
}

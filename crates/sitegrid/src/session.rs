//! Wires config, global flags, the file-backed store and the marker board
//! into a `SyncController` for one command invocation.

use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use tracing::debug;

use sitegrid_api::{RawSiteRecord, SiteTableClient, SiteUpdateBody};
use sitegrid_config::Config;
use sitegrid_core::{CoreError, FileStore, MarkerBoard, RemoteGateway, SiteId, SyncController};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Gateway ─────────────────────────────────────────────────────────

/// The remote table, or nothing at all under `--offline`.
pub enum Gateway {
    Remote(SiteTableClient),
    Offline,
}

fn offline_error() -> CoreError {
    CoreError::Transport {
        message: "offline mode".into(),
        status: None,
    }
}

impl RemoteGateway for Gateway {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<RawSiteRecord>, CoreError>> + Send {
        async move {
            match self {
                Self::Remote(client) => RemoteGateway::fetch_all(client).await,
                Self::Offline => Err(offline_error()),
            }
        }
    }

    fn update_one(
        &self,
        id: SiteId,
        body: &SiteUpdateBody,
    ) -> impl Future<Output = Result<RawSiteRecord, CoreError>> + Send {
        async move {
            match self {
                Self::Remote(client) => RemoteGateway::update_one(client, id, body).await,
                Self::Offline => Err(offline_error()),
            }
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

pub struct Session {
    pub ctrl: SyncController<Gateway>,
    pub board: Arc<MarkerBoard>,
    pub config: Config,
    pub data_dir: PathBuf,
    pub offline: bool,
    pub color: bool,
    quiet: bool,
}

impl Session {
    /// A session that only touches local state.
    pub fn local(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = sitegrid_config::load_config()?;
        Self::build(global, config, Gateway::Offline, true)
    }

    /// A session against the remote store, or local-only under `--offline`.
    pub fn remote(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = sitegrid_config::load_config()?;
        if global.offline {
            return Self::build(global, config, Gateway::Offline, true);
        }
        let client = build_client(global, &config)?;
        Self::build(global, config, Gateway::Remote(client), false)
    }

    fn build(global: &GlobalOpts, config: Config, gateway: Gateway, offline: bool) -> Result<Self, CliError> {
        let sync = sitegrid_config::to_sync_config(&config)?;
        let data_dir = sitegrid_config::data_dir(&config);
        debug!(data_dir = %data_dir.display(), offline, "opening session");

        let board = Arc::new(MarkerBoard::new(config.view.zoom));
        let ctrl = SyncController::new(
            gateway,
            Arc::new(FileStore::new(&data_dir)),
            board.clone(),
            sync,
        );
        Ok(Self {
            ctrl,
            board,
            config,
            data_dir,
            offline,
            color: output::should_color(&global.color),
            quiet: global.quiet,
        })
    }

    /// Populate the store: the cache always, then the remote store unless
    /// offline. A failed fetch is tolerated while cached sites exist.
    pub async fn load(&self) -> Result<usize, CliError> {
        let handle = if self.offline {
            self.ctrl.load_cached();
            None
        } else {
            Some(self.ctrl.start())
        };

        if let Some(handle) = handle {
            let spinner = self.spinner("Fetching sites");
            let joined = handle.await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            let result = joined.map_err(|e| CliError::Internal(format!("load task failed: {e}")))?;
            if let Err(e) = result {
                if self.ctrl.store().is_empty() {
                    self.ctrl.take_warnings();
                    self.board.take_notices();
                    return Err(e.into());
                }
            }
        }
        Ok(self.ctrl.store().len())
    }

    /// Flush controller warnings and adapter notices to stderr.
    pub fn report(&self) {
        for notice in self.board.take_notices() {
            output::print_warning(&notice.to_string(), self.color);
        }
        for warning in self.ctrl.take_warnings() {
            output::print_warning(&warning, self.color);
        }
    }

    /// Report, then stop background work.
    pub fn finish(&self) {
        self.report();
        self.ctrl.shutdown();
    }

    fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.quiet || !std::io::stderr().is_terminal() {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_owned());
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    }
}

/// Build the table client from config with CLI flag overrides.
fn build_client(global: &GlobalOpts, config: &Config) -> Result<SiteTableClient, CliError> {
    let raw = global
        .url
        .clone()
        .or_else(|| config.remote.url.clone())
        .ok_or_else(|| CliError::NoRemote {
            path: sitegrid_config::config_path().display().to_string(),
        })?;
    let url: url::Url = raw.parse().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;

    let mut transport = sitegrid_config::to_transport_config(config);
    if let Some(secs) = global.timeout {
        transport.timeout = Duration::from_secs(secs);
    }
    if let Some(ref key) = global.api_key {
        transport.api_key = Some(SecretString::from(key.clone()));
    }

    let table = global.table.clone().unwrap_or_else(|| config.remote.table.clone());
    SiteTableClient::new(url, table, &transport).map_err(|e| CliError::from(CoreError::from(e)))
}

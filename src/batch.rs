//! Run controller: drives search and insert for every song row.
//!
//! A run resolves the target playlist, loads the progress log, skips rows that
//! were already added in earlier runs, and then works through the remaining
//! rows strictly in input order. Quota exhaustion halts the loop but keeps the
//! counters gathered so far; every other per-row failure is counted and the
//! loop moves on.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::{
    info,
    management::{Authorizer, CredentialManager, ProgressLog},
    success,
    types::{SongRow, Token},
    utils,
    warning,
    youtube::{Catalog, CatalogError, InsertOutcome, SearchOutcome, auth::AuthError},
};

/// Pauses between remote calls, chosen by the outcome of the last call.
///
/// Inserts cost more of the API budget than searches, so the pause after a
/// successful insert is longer than after a search miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub after_not_found: Duration,
    pub after_search_error: Duration,
    pub after_added: Duration,
    pub after_insert_failure: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_not_found: Duration::from_millis(1000),
            after_search_error: Duration::from_millis(1000),
            after_added: Duration::from_millis(1500),
            after_insert_failure: Duration::from_millis(2000),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            after_not_found: Duration::ZERO,
            after_search_error: Duration::ZERO,
            after_added: Duration::ZERO,
            after_insert_failure: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub search_suffix: String,
    pub pacing: Pacing,
    /// Search only; never insert or log.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub added: usize,
    pub skipped_missing_data: usize,
    pub skipped_already_processed: usize,
    pub not_found: usize,
    pub errors: usize,
    /// Videos found during a dry run that would have been inserted.
    pub would_add: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    QuotaHalted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub counters: RunCounters,
    pub status: RunStatus,
    pub playlist_id: String,
    pub total_rows: usize,
}

impl RunSummary {
    pub fn quota_halted(&self) -> bool {
        self.status == RunStatus::QuotaHalted
    }

    /// True when the run found nothing left to do.
    pub fn nothing_to_do(&self) -> bool {
        let c = &self.counters;
        c.added == 0
            && c.errors == 0
            && c.not_found == 0
            && c.skipped_missing_data == 0
            && c.would_add == 0
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Playlist '{0}' not found among your first playlists. Ensure it exists and the name matches exactly (case-sensitive).")]
    TargetNotFound(String),
    #[error("YouTube API quota exceeded while looking up the playlist. Cannot continue.")]
    QuotaWhileResolving,
    #[error("Failed to look up the playlist: {0}")]
    Resolve(#[source] CatalogError),
    #[error("Could not authenticate the YouTube service: {0}")]
    Auth(#[from] AuthError),
    #[error("{0}. Please re-run to authorize again.")]
    Client(#[source] CatalogError),
}

impl RunError {
    /// True when the playlist lookup was rejected because of the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RunError::Resolve(e) if e.is_unauthorized())
    }
}

/// Authenticates, connects and runs the batch.
///
/// `connect` builds a catalog for an access token. When it fails the stored
/// credential is discarded. A 401 while resolving the playlist discards the
/// credential, re-authorizes once and retries with a freshly built catalog;
/// a second failure is returned as is.
pub async fn run_authorized<A, C, F>(
    credentials: &CredentialManager<A>,
    connect: F,
    playlist_name: &str,
    rows: &[SongRow],
    log: &mut ProgressLog,
    options: &BatchOptions,
) -> Result<RunSummary, RunError>
where
    A: Authorizer,
    C: Catalog,
    F: Fn(&Token) -> Result<C, CatalogError>,
{
    let token = credentials.obtain().await?;
    let catalog = connect_or_discard(credentials, &connect, &token).await?;

    match run(&catalog, playlist_name, rows, log, options).await {
        Err(e) if e.is_unauthorized() => {
            warning!("{}", e);
            info!("Re-authorizing once before giving up.");
            let token = credentials.reauthorize().await?;
            let catalog = connect_or_discard(credentials, &connect, &token).await?;
            run(&catalog, playlist_name, rows, log, options).await
        }
        result => result,
    }
}

async fn connect_or_discard<A, C, F>(
    credentials: &CredentialManager<A>,
    connect: &F,
    token: &Token,
) -> Result<C, RunError>
where
    A: Authorizer,
    F: Fn(&Token) -> Result<C, CatalogError>,
{
    match connect(token) {
        Ok(catalog) => Ok(catalog),
        Err(e) => {
            if let Err(discard_err) = credentials.discard().await {
                warning!("{}", discard_err);
            }
            Err(RunError::Client(e))
        }
    }
}

enum RowResult {
    Continue(Duration),
    Halt,
}

/// Runs the whole batch against `catalog`.
///
/// Fails only while resolving the playlist, before any row is touched.
pub async fn run<C: Catalog>(
    catalog: &C,
    playlist_name: &str,
    rows: &[SongRow],
    log: &mut ProgressLog,
    options: &BatchOptions,
) -> Result<RunSummary, RunError> {
    info!("Searching for your playlist named '{}'...", playlist_name);
    let playlist_id = match catalog.find_collection_id(playlist_name).await {
        Ok(Some(id)) => id,
        Ok(None) => return Err(RunError::TargetNotFound(playlist_name.to_string())),
        Err(e) if e.is_quota() => return Err(RunError::QuotaWhileResolving),
        Err(e) => return Err(RunError::Resolve(e)),
    };
    success!(
        "Found playlist '{}' with ID: {}",
        playlist_name,
        playlist_id
    );

    log.load().await;

    let mut counters = RunCounters::default();
    let mut pending: Vec<&SongRow> = Vec::with_capacity(rows.len());
    for row in rows {
        if !row.has_uri() {
            warning!(
                "Row {} has no track URI; it will be attempted but cannot be tracked.",
                row.line
            );
            pending.push(row);
        } else if log.contains(&row.external_uri) {
            counters.skipped_already_processed += 1;
        } else {
            pending.push(row);
        }
    }

    info!(
        "Found {} songs in the CSV. Attempting to process {} of them.",
        rows.len(),
        pending.len()
    );

    let mut status = RunStatus::Completed;
    for row in pending {
        match process_row(catalog, &playlist_id, row, log, options, &mut counters).await {
            RowResult::Continue(pause) => {
                if !pause.is_zero() {
                    sleep(pause).await;
                }
            }
            RowResult::Halt => {
                warning!("Stopping due to YouTube API quota exhaustion.");
                status = RunStatus::QuotaHalted;
                break;
            }
        }
    }

    Ok(RunSummary {
        counters,
        status,
        playlist_id,
        total_rows: rows.len(),
    })
}

async fn process_row<C: Catalog>(
    catalog: &C,
    playlist_id: &str,
    row: &SongRow,
    log: &mut ProgressLog,
    options: &BatchOptions,
    counters: &mut RunCounters,
) -> RowResult {
    if !row.is_complete() {
        info!(
            "Skipping row {}: missing track name or artist name.",
            row.line
        );
        counters.skipped_missing_data += 1;
        return RowResult::Continue(Duration::ZERO);
    }

    // An earlier row of this run may have added the same URI.
    if row.has_uri() && log.contains(&row.external_uri) {
        info!(
            "Skipping row {} ('{}'): {} was processed earlier in this run.",
            row.line, row.title, row.external_uri
        );
        counters.skipped_already_processed += 1;
        return RowResult::Continue(Duration::ZERO);
    }

    info!(
        "Processing row {}: '{}' by '{}'",
        row.line, row.title, row.artist
    );
    let query = utils::build_search_query(&row.title, &row.artist, &options.search_suffix);

    let video = match catalog.search_item(&query).await {
        SearchOutcome::Found(video) => {
            info!("  Found video: '{}' (ID: {})", video.title, video.id);
            video
        }
        SearchOutcome::NotFound => {
            info!("  No video found for query: '{}'", query);
            counters.not_found += 1;
            return RowResult::Continue(options.pacing.after_not_found);
        }
        SearchOutcome::QuotaExceeded => return RowResult::Halt,
        SearchOutcome::Failed(e) => {
            warning!("  Search failed: {}", e);
            counters.errors += 1;
            return RowResult::Continue(options.pacing.after_search_error);
        }
    };

    if options.dry_run {
        counters.would_add += 1;
        return RowResult::Continue(options.pacing.after_not_found);
    }

    match catalog.insert_item(playlist_id, &video.id).await {
        InsertOutcome::Added { title } => {
            success!("  Added '{}' to the playlist.", title);
            counters.added += 1;
            if row.has_uri() {
                if let Err(e) = log.record(&row.external_uri).await {
                    warning!("  {}", e);
                }
            } else {
                warning!("  Added, but cannot log it as processed without a track URI.");
            }
            RowResult::Continue(options.pacing.after_added)
        }
        InsertOutcome::Duplicate => {
            warning!("  Video ID {} is already in the playlist.", video.id);
            counters.errors += 1;
            RowResult::Continue(options.pacing.after_insert_failure)
        }
        InsertOutcome::QuotaExceeded => RowResult::Halt,
        InsertOutcome::Failed(e) => {
            warning!("  Error adding video ID {}: {}", video.id, e);
            counters.errors += 1;
            RowResult::Continue(options.pacing.after_insert_failure)
        }
    }
}

use tabled::Table;

use crate::{
    Res,
    batch::{self, BatchOptions, RunSummary},
    cli::auth::credential_manager,
    config::Config,
    info, input,
    management::{Authorizer, CredentialManager, ProgressLog},
    success,
    types::SummaryTableRow,
    warning,
    youtube::YouTubeClient,
};

pub async fn run(config: Config, dry_run: bool) -> Res<()> {
    let credentials = credential_manager(&config)?;
    run_with(&config, &credentials, dry_run).await?;
    Ok(())
}

/// Runs the command against the given credentials and prints the summary.
///
/// A quota halt mid-batch is a normal outcome and returns `Ok`.
pub async fn run_with<A: Authorizer>(
    config: &Config,
    credentials: &CredentialManager<A>,
    dry_run: bool,
) -> Res<RunSummary> {
    config.validate()?;
    let rows = input::read_song_rows(&config.input_file, &config.columns)?;

    let options = BatchOptions {
        search_suffix: config.search_suffix.clone(),
        pacing: config.pacing,
        dry_run,
    };
    if dry_run {
        info!("Dry run: videos are searched but not added.");
    }

    let mut log = ProgressLog::new(config.progress_log_file.clone());
    let summary = batch::run_authorized(
        credentials,
        |token| YouTubeClient::new(&config.api_url, &token.access_token),
        &config.playlist_name,
        &rows,
        &mut log,
        &options,
    )
    .await?;

    print_summary(&summary, dry_run);
    Ok(summary)
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let c = &summary.counters;
    let mut rows = vec![
        SummaryTableRow {
            outcome: "Songs skipped (missing data)".to_string(),
            count: c.skipped_missing_data,
        },
        SummaryTableRow {
            outcome: "Songs skipped (already processed)".to_string(),
            count: c.skipped_already_processed,
        },
        SummaryTableRow {
            outcome: "Videos successfully added now".to_string(),
            count: c.added,
        },
        SummaryTableRow {
            outcome: "Videos not found on YouTube".to_string(),
            count: c.not_found,
        },
        SummaryTableRow {
            outcome: "Errors during search or add (check output above)".to_string(),
            count: c.errors,
        },
    ];
    if dry_run {
        rows.push(SummaryTableRow {
            outcome: "Videos that would be added".to_string(),
            count: c.would_add,
        });
    }

    println!();
    info!("Run summary for {} rows", summary.total_rows);
    println!("{}", Table::new(rows));

    if summary.quota_halted() {
        warning!("NOTE: API quota was hit. Re-run later to continue.");
    } else if summary.nothing_to_do() {
        success!("All processable songs from the CSV were already in the log file.");
    } else {
        success!("Run complete.");
    }
}

use tabled::Table;

use crate::{
    Res,
    config::Config,
    input,
    management::ProgressLog,
    types::{SongRow, SummaryTableRow},
};

/// Counts of an input table measured against the progress log, without any remote call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backlog {
    pub total: usize,
    pub without_uri: usize,
    pub missing_data: usize,
    pub already_processed: usize,
    pub pending: usize,
}

pub fn backlog(rows: &[SongRow], log: &ProgressLog) -> Backlog {
    let mut backlog = Backlog {
        total: rows.len(),
        ..Backlog::default()
    };

    for row in rows {
        if !row.has_uri() {
            backlog.without_uri += 1;
        }

        if row.has_uri() && log.contains(&row.external_uri) {
            backlog.already_processed += 1;
        } else if !row.is_complete() {
            backlog.missing_data += 1;
        } else {
            backlog.pending += 1;
        }
    }

    backlog
}

pub async fn info(config: Config) -> Res<()> {
    let rows = input::read_song_rows(&config.input_file, &config.columns)?;

    let mut log = ProgressLog::new(config.progress_log_file.clone());
    log.load().await;

    let backlog = backlog(&rows, &log);
    let table_rows = vec![
        SummaryTableRow {
            outcome: "Rows in CSV".to_string(),
            count: backlog.total,
        },
        SummaryTableRow {
            outcome: "Rows without track URI".to_string(),
            count: backlog.without_uri,
        },
        SummaryTableRow {
            outcome: "Rows missing title or artist".to_string(),
            count: backlog.missing_data,
        },
        SummaryTableRow {
            outcome: "Rows already processed".to_string(),
            count: backlog.already_processed,
        },
        SummaryTableRow {
            outcome: "Rows pending".to_string(),
            count: backlog.pending,
        },
        SummaryTableRow {
            outcome: "URIs in progress log".to_string(),
            count: log.len(),
        },
    ];

    println!("{}", Table::new(table_rows));
    Ok(())
}

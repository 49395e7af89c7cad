use invsync_core::db::{Database, LibSqlStore};
use invsync_core::services::SyncRunner;
use invsync_core::sync::EntityKind;
use invsync_core::util::format_timestamp_ms;
use invsync_core::{SyncDirection, SyncResult, SyncService, TenantId};

use crate::cli::SyncCommands;
use crate::commands::common::SyncSettings;
use crate::error::CliError;

/// Exit status once the pass has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Clean,
    CompletedWithErrors,
    Failed,
}

impl SyncOutcome {
    pub fn from_result(result: &SyncResult) -> Self {
        if !result.success() {
            Self::Failed
        } else if result.has_errors() {
            Self::CompletedWithErrors
        } else {
            Self::Clean
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Failed => 1,
            Self::CompletedWithErrors => 2,
        }
    }
}

pub async fn run_sync(
    command: &SyncCommands,
    settings: &SyncSettings,
) -> Result<SyncOutcome, CliError> {
    tracing::info!(
        "Profile '{}': tenant {} <-> {}",
        settings.profile,
        settings.tenant,
        settings.local_path.display()
    );

    let cloud_db = Database::open_remote(&settings.cloud).await?;
    let local_db = Database::open(&settings.local_path).await?;
    let result = sync_databases(
        &cloud_db,
        &local_db,
        settings.tenant.clone(),
        command.direction(),
    )
    .await?;

    if command.json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_result_lines(&result) {
            println!("{line}");
        }
    }

    Ok(SyncOutcome::from_result(&result))
}

/// One pass between two opened databases for `tenant`
pub async fn sync_databases(
    cloud_db: &Database,
    local_db: &Database,
    tenant: TenantId,
    direction: SyncDirection,
) -> Result<SyncResult, CliError> {
    let service = SyncService::new(
        LibSqlStore::cloud(cloud_db, tenant.clone()),
        LibSqlStore::local(local_db, tenant),
    );
    Ok(SyncRunner::new(service).run(direction).await?)
}

pub fn format_result_lines(result: &SyncResult) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", result.message(), result.direction())];

    for kind in EntityKind::ALL {
        let counts = result.stats().counts(kind);
        if counts.is_empty() {
            continue;
        }
        lines.push(format!(
            "  {:<11} {:>5} new  {:>5} updated",
            kind.plural(),
            counts.inserted,
            counts.updated
        ));
    }
    if result.stats().total_operations() == 0 {
        lines.push("  no changes".to_string());
    }
    if result.stats().conflicts_resolved() > 0 {
        lines.push(format!(
            "  conflicts resolved: {}",
            result.stats().conflicts_resolved()
        ));
    }

    if result.has_errors() {
        lines.push(format!("{} error(s):", result.errors().len()));
        lines.extend(result.errors().iter().map(|error| format!("  - {error}")));
    }

    let started = format_timestamp_ms(result.started_at());
    match result.duration_ms() {
        Some(duration) => lines.push(format!("started {started}, took {duration} ms")),
        None => lines.push(format!("started {started}")),
    }
    lines
}

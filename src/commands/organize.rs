use anyhow::Result;

use crate::commands::CommandReport;
use crate::error::WarnCode;
use crate::media::audit;
use crate::media::categories::MediaCategory;
use crate::media::ledger::LoadStatus;
use crate::media::organizer::{self, OrganizeSettings, PassOutcome};
use crate::media::paths::OrganizerPaths;
use crate::media::warn::{self, WarnEvent};

#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub paths: OrganizerPaths,
    pub dry_run: bool,
}

fn describe_pass(category: MediaCategory, outcome: &PassOutcome, report: &mut CommandReport) {
    let name = category.as_str();
    report.detail(format!("{name}.ledger={}", outcome.ledger_path.display()));
    match &outcome.ledger_status {
        LoadStatus::Missing => report.detail(format!("{name}.ledger_status=new")),
        LoadStatus::Loaded => {
            report.detail(format!("{name}.ledger_status=loaded"));
            if let Some(previous) = &outcome.previous_modified_at {
                report.detail(format!("{name}.ledger_previous_modified_at={previous}"));
            }
        }
        LoadStatus::Recovered { reason } => {
            report.detail(format!("{name}.ledger_status=recovered"));
            report.detail(format!(
                "Warning... {} unable to be read successfully ({reason}). Continuing...",
                outcome.ledger_path.display()
            ));
        }
    }

    for collision in &outcome.collisions {
        report.detail(format!(
            "Collision at {}... Skipping {}",
            collision.hash,
            collision.path.display()
        ));
    }
    for failure in &outcome.failures {
        report.detail(format!(
            "skipped {}: {}",
            failure.path.display(),
            failure.error
        ));
    }

    let verb = if outcome.dry_run { "would move" } else { "moved" };
    for moved in &outcome.moved {
        report.detail(format!(
            "{name}.{verb} {} -> {} (week of {})",
            moved.from.display(),
            moved.to.display(),
            moved.bucket
        ));
    }

    report.detail(format!("{name}.scanned={}", outcome.scanned));
    report.detail(format!("{name}.ledger_hashes={}", outcome.ledger_size));
    if let Some(saved_at) = &outcome.ledger_saved_at {
        report.detail(format!("{name}.ledger_modified_at={saved_at}"));
    }
    if outcome.dry_run {
        report.detail(format!("Would move {} files", outcome.moved_count()));
    } else {
        report.detail(format!("Moved {} files", outcome.moved_count()));
    }
}

fn record_audit(
    paths: &OrganizerPaths,
    pass: &str,
    status: &str,
    message: &str,
) -> Option<String> {
    let err = audit::append_event(&paths.logs_dir, pass, status, message).err()?;
    let err_str = format!("{err:#}");
    warn::emit(WarnEvent {
        code: WarnCode::AuditFailed,
        stage: "audit",
        action: "append-event",
        path: &audit::audit_path(&paths.logs_dir).display().to_string(),
        reason: "audit-write-failed",
        err: &err_str,
    });
    Some(err_str)
}

fn run_pass(category: MediaCategory, opts: &OrganizeOptions) -> CommandReport {
    let mut report = CommandReport::new(format!("organize-{category}"));
    let dest_dir = opts.paths.dest_for(category);
    report.detail(format!("{category}.dest_dir={}", dest_dir.display()));

    let settings = OrganizeSettings {
        dry_run: opts.dry_run,
    };
    let (status, message) = match organizer::organize(
        category.extensions(),
        &opts.paths.source_dir,
        dest_dir,
        settings,
    ) {
        Ok(outcome) => {
            describe_pass(category, &outcome, &mut report);
            let status = if outcome.dry_run { "dry-run" } else { "ok" };
            let message = format!(
                "moved={} collisions={} failures={} dest={}",
                outcome.moved_count(),
                outcome.collisions.len(),
                outcome.failures.len(),
                dest_dir.display()
            );
            (status, message)
        }
        Err(failure) => {
            if let Some(partial) = &failure.partial {
                describe_pass(category, partial, &mut report);
            }
            let message = format!("{category} pass failed: {:#}", failure.error);
            report.issue(message.clone());
            ("failed", message)
        }
    };

    if let Some(err) = record_audit(&opts.paths, category.as_str(), status, &message) {
        report.detail(format!("audit.warning={err}"));
    }
    report
}

pub fn run(opts: &OrganizeOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("organize");
    report.detail(format!("source_dir={}", opts.paths.source_dir.display()));
    report.detail(format!("logs_dir={}", opts.paths.logs_dir.display()));
    if opts.dry_run {
        report.detail("dry-run: no files will be moved and no ledger will be written");
    }

    for category in MediaCategory::ALL {
        report.merge(run_pass(category, opts));
    }

    Ok(report)
}

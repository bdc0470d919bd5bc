//! Command-line probe over an experiment database.
//!
//! # Responsibility
//! - Print dashboard, listing and analytics views for quick local checks.
//! - Exercise the core crate wiring without any UI runtime.
//!
//! Database and logging locations come from `MYCO_DB_PATH`,
//! `MYCO_LOG_LEVEL` and `MYCO_LOG_DIR`.

use log::error;
use myco_core::db::open_db;
use myco_core::{
    core_version, init_logging, CoreConfig, ExperimentFilter, ExperimentService,
    ExperimentStatus, SqliteExperimentRepository, SystemClock,
};
use std::process::ExitCode;

const USAGE: &str = "usage: myco [dashboard | list [STATUS] | analytics | version]";

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CoreConfig, args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).unwrap_or("dashboard");
    if command == "version" {
        println!("myco_core version={}", core_version());
        return Ok(());
    }

    let conn = open_db(&config.db_path)
        .map_err(|err| format!("cannot open `{}`: {err}", config.db_path.display()))?;
    let repo = SqliteExperimentRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = ExperimentService::new(repo);

    match command {
        "dashboard" => print_dashboard(&service),
        "list" => print_list(&service, args.get(1).map(String::as_str)),
        "analytics" => print_analytics(&service),
        _ => Err(USAGE.to_string()),
    }
}

fn print_dashboard(
    service: &ExperimentService<SqliteExperimentRepository<'_>>,
) -> Result<(), String> {
    let dashboard = service
        .dashboard(&SystemClock)
        .map_err(|err| err.to_string())?;
    let stats = dashboard.stats;
    println!(
        "total={} active={} contaminated={} success_rate={:.1}%",
        stats.total_count, stats.active_count, stats.contaminated_count, stats.success_rate
    );
    for row in dashboard.recent {
        println!(
            "#{:<4} {:<30} {:<16} {:<13} {} ({} days)",
            row.id,
            row.experiment_name,
            row.substrate_type,
            row.status.as_str(),
            row.inoculation_date,
            row.days_elapsed
                .map_or_else(|| "?".to_string(), |days| days.to_string())
        );
    }
    Ok(())
}

fn print_list(
    service: &ExperimentService<SqliteExperimentRepository<'_>>,
    status: Option<&str>,
) -> Result<(), String> {
    let experiments = match status {
        Some(raw) => {
            let status = ExperimentStatus::parse(raw)
                .ok_or_else(|| format!("unknown status `{raw}`"))?;
            service.list_by_status(status)
        }
        None => service.list(),
    }
    .map_err(|err| err.to_string())?;

    for experiment in experiments {
        println!(
            "#{:<4} {:<30} {:<16} {:<13} {}",
            experiment.id,
            experiment.experiment_name,
            experiment.substrate_type,
            experiment.status.as_str(),
            experiment.inoculation_date
        );
    }
    Ok(())
}

fn print_analytics(
    service: &ExperimentService<SqliteExperimentRepository<'_>>,
) -> Result<(), String> {
    let report = service
        .analytics(&ExperimentFilter::default())
        .map_err(|err| err.to_string())?;

    println!(
        "analyzed={} contaminated={} success_rate={:.1}% contamination_rate={:.1}%",
        report.summary.total,
        report.summary.contaminated_count,
        report.summary.success_rate_pct,
        report.summary.contamination_rate_pct
    );
    for (status, count) in &report.status_distribution {
        println!("status {:<13} {count}", status.label());
    }
    for (substrate, group) in &report.by_substrate {
        println!(
            "substrate {:<16} total={} success_rate={:.1}% avg_colonization_days={}",
            substrate,
            group.count,
            group.success_rate_pct,
            group
                .avg_days_to_colonization
                .map_or_else(|| "N/A".to_string(), |days| format!("{days:.1}"))
        );
    }
    for point in &report.timeline {
        println!("timeline {} {}", point.date, point.cumulative_count);
    }
    Ok(())
}

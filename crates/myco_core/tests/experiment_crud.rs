use chrono::{NaiveDate, NaiveDateTime};
use myco_core::db::open_db_in_memory;
use myco_core::{
    ExperimentPatch, ExperimentRepository, ExperimentStatus, NewExperiment, RepoError,
    SqliteExperimentRepository, ValidationError,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn stamp(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn new_experiment(name: &str, substrate: &str, status: ExperimentStatus) -> NewExperiment {
    NewExperiment::new(name, substrate, date(2024, 1, 1), status)
}

#[test]
fn create_and_get_roundtrip_preserves_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let mut input = NewExperiment::new(
        "Oyster #1 - Cardboard",
        "cardboard",
        date(2024, 2, 10),
        ExperimentStatus::Contaminated,
    );
    input.substrate_details = Some("70% cardboard, 30% coffee grounds".to_string());
    input.spawn_ratio = Some(12.5);
    input.substrate_weight_kg = Some(2.0);
    input.container_type = Some("bucket".to_string());
    input.colonization_date = Some(date(2024, 2, 28));
    input.first_pin_date = Some(date(2024, 3, 5));
    input.contamination_type = Some("trichoderma".to_string());
    input.contamination_notes = Some("green patches near lid".to_string());
    input.notes = Some("pasteurized 1h".to_string());

    let id = repo.create_experiment(&input).unwrap();
    let loaded = repo.get_experiment(id).unwrap().unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.experiment_name, input.experiment_name);
    assert_eq!(loaded.substrate_type, "cardboard");
    assert_eq!(loaded.substrate_details, input.substrate_details);
    assert_eq!(loaded.spawn_ratio, Some(12.5));
    assert_eq!(loaded.substrate_weight_kg, Some(2.0));
    assert_eq!(loaded.container_type.as_deref(), Some("bucket"));
    assert_eq!(loaded.inoculation_date, date(2024, 2, 10));
    assert_eq!(loaded.colonization_date, Some(date(2024, 2, 28)));
    assert_eq!(loaded.first_pin_date, Some(date(2024, 3, 5)));
    assert_eq!(loaded.status, ExperimentStatus::Contaminated);
    assert_eq!(loaded.contamination_type.as_deref(), Some("trichoderma"));
    assert_eq!(loaded.contamination_notes, input.contamination_notes);
    assert_eq!(loaded.notes.as_deref(), Some("pasteurized 1h"));
}

#[test]
fn create_assigns_novel_ids_and_stamps_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let mut ids = HashSet::new();
    for index in 0..5 {
        let id = repo
            .create_experiment(&new_experiment(
                &format!("run {index}"),
                "straw",
                ExperimentStatus::Inoculating,
            ))
            .unwrap();
        assert!(ids.insert(id), "id {id} was handed out twice");
    }

    let id = *ids.iter().next().unwrap();
    let loaded = repo.get_experiment(id).unwrap().unwrap();
    assert!(loaded.created_at.and_utc().timestamp() > 0);
}

#[test]
fn create_rejects_blank_required_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let err = repo
        .create_experiment(&new_experiment("   ", "straw", ExperimentStatus::Colonizing))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingField("experiment_name"))
    ));

    let err = repo
        .create_experiment(&new_experiment("run", "", ExperimentStatus::Colonizing))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingField("substrate_type"))
    ));

    assert!(repo.list_experiments().unwrap().is_empty());
}

#[test]
fn list_is_newest_first_with_id_tiebreak() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let mut oldest = new_experiment("oldest", "straw", ExperimentStatus::Done);
    oldest.created_at = Some(stamp("2024-01-01 08:00:00"));
    let mut newest = new_experiment("newest", "straw", ExperimentStatus::Done);
    newest.created_at = Some(stamp("2024-03-01 08:00:00"));
    let mut tie_a = new_experiment("tie a", "straw", ExperimentStatus::Done);
    tie_a.created_at = Some(stamp("2024-02-01 08:00:00"));
    let mut tie_b = new_experiment("tie b", "straw", ExperimentStatus::Done);
    tie_b.created_at = Some(stamp("2024-02-01 08:00:00"));

    let oldest_id = repo.create_experiment(&oldest).unwrap();
    let newest_id = repo.create_experiment(&newest).unwrap();
    let tie_a_id = repo.create_experiment(&tie_a).unwrap();
    let tie_b_id = repo.create_experiment(&tie_b).unwrap();

    let ids = repo
        .list_experiments()
        .unwrap()
        .into_iter()
        .map(|experiment| experiment.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![newest_id, tie_b_id, tie_a_id, oldest_id]);

    let recent = repo.recent_experiments(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, newest_id);
    assert_eq!(recent[1].id, tie_b_id);

    let loaded = repo.get_experiment(oldest_id).unwrap().unwrap();
    assert_eq!(loaded.created_at, stamp("2024-01-01 08:00:00"));
}

#[test]
fn update_applies_only_supplied_columns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let mut input = new_experiment("bag 7", "sawdust pellets", ExperimentStatus::Colonizing);
    input.notes = Some("left on shelf".to_string());
    input.container_type = Some("bag".to_string());
    let id = repo.create_experiment(&input).unwrap();
    let before = repo.get_experiment(id).unwrap().unwrap();

    let patch = ExperimentPatch {
        status: Some(ExperimentStatus::Pinning),
        colonization_date: Some(Some(date(2024, 1, 20))),
        notes: Some(None),
        ..ExperimentPatch::default()
    };
    assert!(repo.update_experiment(id, &patch).unwrap());

    let after = repo.get_experiment(id).unwrap().unwrap();
    assert_eq!(after.status, ExperimentStatus::Pinning);
    assert_eq!(after.colonization_date, Some(date(2024, 1, 20)));
    assert_eq!(after.notes, None);
    assert_eq!(after.container_type.as_deref(), Some("bag"));
    assert_eq!(after.experiment_name, before.experiment_name);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn update_allows_arbitrary_status_transitions() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let id = repo
        .create_experiment(&new_experiment("jar", "mix", ExperimentStatus::Fruiting))
        .unwrap();
    let patch = ExperimentPatch {
        status: Some(ExperimentStatus::Inoculating),
        ..ExperimentPatch::default()
    };
    assert!(repo.update_experiment(id, &patch).unwrap());
    assert_eq!(
        repo.get_experiment(id).unwrap().unwrap().status,
        ExperimentStatus::Inoculating
    );
}

#[test]
fn empty_patch_and_unknown_id_report_no_effect() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let id = repo
        .create_experiment(&new_experiment("steady", "straw", ExperimentStatus::Colonizing))
        .unwrap();
    let before = repo.get_experiment(id).unwrap().unwrap();

    assert!(!repo.update_experiment(id, &ExperimentPatch::default()).unwrap());
    assert_eq!(repo.get_experiment(id).unwrap().unwrap(), before);

    let patch = ExperimentPatch {
        notes: Some(Some("ghost".to_string())),
        ..ExperimentPatch::default()
    };
    assert!(!repo.update_experiment(id + 1000, &patch).unwrap());
}

#[test]
fn update_rejects_blanking_required_text() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let id = repo
        .create_experiment(&new_experiment("named", "straw", ExperimentStatus::Colonizing))
        .unwrap();
    let patch = ExperimentPatch {
        experiment_name: Some(" ".to_string()),
        ..ExperimentPatch::default()
    };
    let err = repo.update_experiment(id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(
        repo.get_experiment(id).unwrap().unwrap().experiment_name,
        "named"
    );
}

#[test]
fn delete_removes_row_permanently() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let id = repo
        .create_experiment(&new_experiment("gone", "straw", ExperimentStatus::Done))
        .unwrap();
    assert!(repo.delete_experiment(id).unwrap());
    assert!(repo.get_experiment(id).unwrap().is_none());
    assert!(!repo.delete_experiment(id).unwrap());
}

#[test]
fn list_by_status_keeps_listing_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let first = repo
        .create_experiment(&new_experiment("a", "straw", ExperimentStatus::Pinning))
        .unwrap();
    repo.create_experiment(&new_experiment("b", "straw", ExperimentStatus::Done))
        .unwrap();
    let third = repo
        .create_experiment(&new_experiment("c", "mix", ExperimentStatus::Pinning))
        .unwrap();

    let pinning = repo.list_by_status(ExperimentStatus::Pinning).unwrap();
    let ids = pinning.iter().map(|item| item.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![third, first]);
    assert!(repo
        .list_by_status(ExperimentStatus::Fruiting)
        .unwrap()
        .is_empty());
}

#[test]
fn summary_stats_counts_and_rate() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let empty = repo.summary_stats().unwrap();
    assert_eq!(empty.total_count, 0);
    assert_eq!(empty.success_rate, 0.0);

    for status in [
        ExperimentStatus::Inoculating,
        ExperimentStatus::Colonizing,
        ExperimentStatus::Fruiting,
        ExperimentStatus::Done,
        ExperimentStatus::Contaminated,
        ExperimentStatus::Contaminated,
    ] {
        repo.create_experiment(&new_experiment("run", "straw", status))
            .unwrap();
    }

    let stats = repo.summary_stats().unwrap();
    assert_eq!(stats.total_count, 6);
    assert_eq!(stats.active_count, 3);
    assert_eq!(stats.contaminated_count, 2);
    assert_eq!(stats.done_count(), 1);
    assert_eq!(
        stats.active_count + stats.done_count() + stats.contaminated_count,
        stats.total_count
    );
    assert_eq!(stats.success_rate, 66.7);
}

#[test]
fn undecodable_status_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let id = repo
        .create_experiment(&new_experiment("odd", "straw", ExperimentStatus::Done))
        .unwrap();
    conn.execute(
        "UPDATE experiments SET status = 'sleeping' WHERE id = ?1;",
        [id],
    )
    .unwrap();

    let err = repo.get_experiment(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("sleeping")));

    assert!(matches!(
        repo.list_experiments(),
        Err(RepoError::InvalidData(_))
    ));
    let stats = repo.summary_stats().unwrap();
    assert_eq!(stats.total_count, 1);
    assert_eq!(stats.active_count, 1);
}

#[test]
fn failed_statement_rolls_back_and_surfaces_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();
    repo.create_experiment(&new_experiment("kept", "straw", ExperimentStatus::Done))
        .unwrap();

    conn.execute_batch(
        "CREATE TRIGGER reject_insert BEFORE INSERT ON experiments
         BEGIN SELECT RAISE(ABORT, 'insert rejected'); END;",
    )
    .unwrap();

    let err = repo
        .create_experiment(&new_experiment("lost", "straw", ExperimentStatus::Done))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(conn.is_autocommit(), "transaction must not stay open");

    let names = repo
        .list_experiments()
        .unwrap()
        .into_iter()
        .map(|experiment| experiment.experiment_name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["kept".to_string()]);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteExperimentRepository::try_new(&conn) {
        Err(RepoError::MissingRequiredTable(table)) => assert_eq!(table, "experiments"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected missing table error"),
    }
}

#[test]
fn repository_rejects_table_missing_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE experiments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            experiment_name TEXT NOT NULL
        );",
    )
    .unwrap();

    assert!(matches!(
        SqliteExperimentRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "experiments",
            column: "substrate_type"
        })
    ));
}

#[test]
fn serialized_record_uses_snake_case_status_and_iso_dates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();

    let id = repo
        .create_experiment(&new_experiment("json", "straw", ExperimentStatus::Contaminated))
        .unwrap();
    let loaded = repo.get_experiment(id).unwrap().unwrap();
    let value = serde_json::to_value(&loaded).unwrap();

    assert_eq!(value["status"], "contaminated");
    assert_eq!(value["inoculation_date"], "2024-01-01");
    assert!(value["colonization_date"].is_null());
}

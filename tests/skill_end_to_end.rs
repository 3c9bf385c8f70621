mod common;

use camino::Utf8Path;
use driftskill::constants::DrifterId;
use driftskill::simulation::{RunId, SimulationRun};
use driftskill::skill::{run_skill_analysis, SkillAnalysis, SkillField, SkillParams};
use driftskill::skill_errors::AlignmentError;
use driftskill::time::DateRange;
use driftskill::SkillError;

use common::*;

fn first_day() -> Vec<hifitime::Epoch> {
    DateRange::hourly(at(0), at(23)).unwrap().epochs()
}

#[test]
fn test_reference_scenario() {
    init_tracing();
    let observed = drifter_at_origin(&[0, 1, 2, 3]);
    let run = equatorial_run("run_00", &[0.0, 1.0, 2.0, 3.0], &[vec![0.0, 0.01, 0.02, 0.01]]);

    let table = observed
        .evaluate_runs(&[run], &first_day(), &SkillParams::default())
        .unwrap();

    assert_eq!(table.num_particles, 1);
    let skill = table.runs[0].as_ref().unwrap();
    assert_eq!(skill.aligned, 4);
    assert_eq!(skill.records[0].start_time, at(0));
    assert_record_close(&skill.records[0], 3.0 * EQUATOR_STEP, EQUATOR_STEP, 2.0 / 3.0);

    let array = table.to_array();
    assert_eq!(array.shape(), (1, 1, 4));
    assert!((array[(0, 0, SkillField::TrajectoryLength)] - 3339.585).abs() < 1e-2);
    assert!((array[(0, 0, SkillField::SeparationDistance)] - 1113.195).abs() < 1e-2);
    assert!((array[(0, 0, SkillField::SkillScore)] - 0.667).abs() < 1e-3);
    assert!(array.failed_runs().is_empty());
}

#[test]
fn test_gapped_observations_align_on_common_hours() {
    // drifter missing hour 2, model has an extra hour 4
    let observed = drifter_at_origin(&[0, 1, 3]);
    let run = equatorial_run(
        "run_00",
        &[0.0, 1.0, 2.0, 3.0, 4.0],
        &[vec![0.0, 0.01, 0.5, 0.02, 0.9]],
    );

    let table = observed
        .evaluate_runs(&[run], &first_day(), &SkillParams::default())
        .unwrap();
    let skill = table.runs[0].as_ref().unwrap();
    assert_eq!(skill.aligned, 3);
    // length over hours 0, 1, 3 only
    assert_record_close(&skill.records[0], 2.0 * EQUATOR_STEP, 2.0 * EQUATOR_STEP, 0.0);
}

#[test]
fn test_single_common_timestamp_gives_nan_skill() {
    let observed = drifter_at_origin(&[3, 10, 11]);
    let run = equatorial_run("run_00", &[0.0, 1.0, 2.0, 3.0], &[vec![0.0, 0.01, 0.02, 0.03]]);

    let table = observed
        .evaluate_runs(&[run], &first_day(), &SkillParams::default())
        .unwrap();
    let record = &table.runs[0].as_ref().unwrap().records[0];
    assert_eq!(record.trajectory_length, 0.0);
    assert!(record.skill_score.is_nan());
    assert_eq!(record.start_time, at(3));
}

#[test]
fn test_particle_ending_on_drifter_has_full_skill() {
    let observed = drifter_at_origin(&[0, 1, 2]);
    let run = equatorial_run("run_00", &[0.0, 1.0, 2.0], &[vec![0.0, 0.05, 0.0]]);

    let table = observed
        .evaluate_runs(&[run], &first_day(), &SkillParams::default())
        .unwrap();
    let record = &table.runs[0].as_ref().unwrap().records[0];
    assert!(record.trajectory_length > 0.0);
    assert_eq!(record.separation_distance, 0.0);
    assert_eq!(record.skill_score, 1.0);
}

#[test]
fn test_disjoint_grids_fail_the_run_only() {
    init_tracing();
    let observed = drifter_at_origin(&[0, 1, 2, 3]);
    let runs = vec![
        equatorial_run("run_00", &[0.0, 1.0, 2.0, 3.0], &[vec![0.0, 0.01, 0.02, 0.01]]),
        equatorial_run("run_01", &[10.0, 11.0, 12.0, 13.0], &[vec![0.0, 0.01, 0.02, 0.01]]),
    ];

    let table = observed
        .evaluate_runs(&runs, &first_day(), &SkillParams::default())
        .unwrap();

    assert_eq!(table.successful_runs().count(), 1);
    let failed = table.failed_runs();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, &RunId::new(1, "run_01"));
    assert_eq!(
        failed[0].1,
        &SkillError::Alignment {
            run: RunId::new(1, "run_01"),
            source: AlignmentError::NoCommonTimestamps,
        }
    );

    let array = table.to_array();
    assert_eq!(array.shape(), (2, 1, 4));
    assert!(array.row(1, 0).unwrap().iter().all(|v| v.is_nan()));
    assert!(!array[(0, 0, SkillField::SkillScore)].is_nan());
}

#[test]
fn test_unreadable_run_is_reported_with_its_id() {
    let observed = drifter_at_origin(&[0, 1, 2, 3]);
    let sources = vec![
        TestSource::Unreadable(UnreadableRun("run_00")),
        TestSource::Run(equatorial_run(
            "run_01",
            &[0.0, 1.0, 2.0, 3.0],
            &[vec![0.0, 0.01, 0.02, 0.01], vec![0.0, 0.0, 0.0, 0.0]],
        )),
    ];

    let table = observed
        .evaluate_runs(&sources, &first_day(), &SkillParams::default())
        .unwrap();

    assert_eq!(table.num_particles, 2);
    match &table.runs[0] {
        Err(SkillError::RunRead { run, reason }) => {
            assert_eq!(run, &RunId::new(0, "run_00"));
            assert!(reason.contains("variable 'lat' not found"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    let skill = table.runs[1].as_ref().unwrap();
    assert_record_close(&skill.records[0], 3.0 * EQUATOR_STEP, EQUATOR_STEP, 2.0 / 3.0);
    // motionless particle: zero length
    assert!(skill.records[1].skill_score.is_nan());
}

#[test]
fn test_particle_count_mismatch() {
    let observed = drifter_at_origin(&[0, 1]);
    let runs = vec![
        equatorial_run("run_00", &[0.0, 1.0], &[vec![0.0, 0.01], vec![0.0, 0.02]]),
        equatorial_run(
            "run_01",
            &[0.0, 1.0],
            &[vec![0.0, 0.01], vec![0.0, 0.02], vec![0.0, 0.03]],
        ),
    ];

    let table = observed
        .evaluate_runs(&runs, &first_day(), &SkillParams::default())
        .unwrap();
    assert!(table.runs[0].is_ok());
    assert!(matches!(
        &table.runs[1],
        Err(SkillError::RunRead { run, .. }) if run.index == 1
    ));
    assert_eq!(table.to_array().shape(), (2, 2, 4));
}

#[test]
fn test_bad_time_units_abort_the_evaluation() {
    let observed = drifter_at_origin(&[0, 1]);
    let runs = vec![
        equatorial_run("run_00", &[0.0, 1.0], &[vec![0.0, 0.01]]),
        SimulationRun::from_rows(
            "run_01",
            vec![0.0, 1.0],
            "hours since launch",
            &[vec![0.0, 0.0]],
            &[vec![0.0, 0.01]],
        )
        .unwrap(),
    ];

    let err = observed
        .evaluate_runs(&runs, &first_day(), &SkillParams::default())
        .unwrap_err();
    assert!(matches!(err, SkillError::TimeUnits(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_run_skill_analysis_from_file() {
    init_tracing();
    let runs = vec![equatorial_run(
        "run_00",
        &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        &[vec![0.0, 0.01, 0.02, 0.01, 0.3, 0.4]],
    )];
    let dates = DateRange::hourly(at(0), at(3)).unwrap().epochs();

    let table = run_skill_analysis(
        Utf8Path::new("tests/data/drifters.csv"),
        &DrifterId::Int(44),
        &runs,
        &dates,
        &SkillParams::builder().parallel(false).build().unwrap(),
    )
    .unwrap();

    let skill = table.runs[0].as_ref().unwrap();
    assert_eq!(skill.aligned, 4);
    assert_record_close(&skill.records[0], 3.0 * EQUATOR_STEP, EQUATOR_STEP, 2.0 / 3.0);
}

#[test]
fn test_unknown_drifter_fails_every_run() {
    let runs = vec![equatorial_run("run_00", &[0.0, 1.0], &[vec![0.0, 0.01]])];
    let table = run_skill_analysis(
        Utf8Path::new("tests/data/drifters.csv"),
        &DrifterId::from("no-such-buoy"),
        &runs,
        &first_day(),
        &SkillParams::default(),
    )
    .unwrap();
    assert_eq!(table.failed_runs().len(), 1);
}

#[test]
fn test_summary_over_particles() {
    let observed = drifter_at_origin(&[0, 1, 2]);
    let run = equatorial_run(
        "run_00",
        &[0.0, 1.0, 2.0],
        &[
            vec![0.0, 0.05, 0.0],
            // starts away from the drifter and keeps drifting off
            vec![0.1, 0.1, 0.11],
            vec![0.0, 0.0, 0.0],
        ],
    );
    let table = observed
        .evaluate_runs(&[run], &first_day(), &SkillParams::default())
        .unwrap();
    let summary = table.runs[0].as_ref().unwrap().summary();
    assert_eq!(summary.particles, 3);
    assert_eq!(summary.defined, 2);
    assert_eq!(summary.max, 1.0);
    assert_eq!(summary.min, 0.0);
}

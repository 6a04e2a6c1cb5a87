// ABOUTME: Integration tests for the workout session lifecycle against SQLite
// ABOUTME: Start/resume, completion aggregates, guarded completion, and store triggers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;
use vlife_server::{
    database::{WorkoutCompletion, WorkoutStore},
    errors::ErrorCode,
    models::{CompletionFeedback, ExerciseLog, PlanStatus, SetEntry, WorkoutLog},
    services::workout_session::{ExerciseEntry, WorkoutSessionService},
};

use common::{create_test_store, manual_clock, seed_library, seed_plan_week};

fn sets(weights_reps_rpe: &[(f64, u32, Option<f64>)]) -> Vec<SetEntry> {
    weights_reps_rpe
        .iter()
        .map(|&(weight, reps, rpe)| SetEntry {
            weight,
            reps,
            rpe,
            completed: true,
        })
        .collect()
}

#[tokio::test]
async fn test_double_start_resumes_same_log() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let first = service.start(user_id, workouts[0].id).await?;
    assert!(!first.is_resume);

    let second = service.start(user_id, workouts[0].id).await?;
    assert!(second.is_resume);
    assert_eq!(second.log.id, first.log.id);
    assert_eq!(second.log.started_at, first.log.started_at);

    let active = service.active(user_id, workouts[0].id).await?;
    assert_eq!(active.map(|log| log.id), Some(first.log.id));
    Ok(())
}

#[tokio::test]
async fn test_start_unknown_workout_is_not_found() -> Result<()> {
    let store = create_test_store().await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let err = service
        .start(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_conditional_insert_resolves_to_existing_row() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;

    // Two racers that both missed the in-progress lookup
    let winner = WorkoutLog::start(user_id, workouts[0].id, Utc::now());
    let loser = WorkoutLog::start(user_id, workouts[0].id, Utc::now());

    let first = store.insert_in_progress_log(&winner).await?;
    let second = store.insert_in_progress_log(&loser).await?;

    assert_eq!(first.id, winner.id);
    assert_eq!(second.id, winner.id);
    assert!(store.get_workout_log(loser.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_completion_aggregates_equal_exercise_sums() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 2, library[0].id).await?;
    let clock = manual_clock();
    let service = WorkoutSessionService::new(store.clone(), clock.clone());

    let started = service.start(user_id, workouts[0].id).await?;

    let squat = service
        .record_exercise(
            started.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: Some(3),
                sets: sets(&[
                    (225.0, 5, Some(7.0)),
                    (225.0, 5, Some(7.0)),
                    (225.0, 5, Some(7.0)),
                ]),
            },
        )
        .await?;
    let mut bench_sets = sets(&[(185.0, 8, Some(9.0)), (185.0, 6, Some(9.0))]);
    bench_sets.push(SetEntry {
        weight: 185.0,
        reps: 2,
        rpe: None,
        completed: false,
    });
    let bench = service
        .record_exercise(
            started.log.id,
            ExerciseEntry {
                exercise_id: library[1].id,
                sets_planned: None,
                sets: bench_sets,
            },
        )
        .await?;
    assert_eq!(bench.sets_planned, 3);
    assert_eq!(bench.sets_completed, 2);

    clock.advance(Duration::from_secs(47 * 60 + 30));
    let completed = service
        .complete(
            started.log.id,
            CompletionFeedback {
                notes: Some("Felt strong".to_owned()),
                perceived_difficulty: Some(8),
                energy_level: Some(6),
            },
        )
        .await?;

    assert!(completed.is_completed());
    assert_eq!(completed.duration_minutes, Some(47));
    assert_eq!(completed.total_exercises, Some(2));
    assert_eq!(
        completed.total_sets,
        Some(i64::from(squat.sets_completed + bench.sets_completed))
    );
    assert_eq!(
        completed.total_reps,
        Some(i64::from(squat.total_reps + bench.total_reps))
    );
    let volume = completed.total_volume.unwrap();
    assert!((volume - (squat.total_volume_lbs + bench.total_volume_lbs)).abs() < 1e-9);
    assert_eq!(completed.avg_rpe, Some(8.0));
    assert_eq!(completed.notes.as_deref(), Some("Felt strong"));
    assert_eq!(completed.perceived_difficulty, Some(8));

    let workout = store.get_planned_workout(workouts[0].id).await?.unwrap();
    assert!(workout.completed);
    assert_eq!(workout.completed_at, completed.completed_at);
    Ok(())
}

#[tokio::test]
async fn test_avg_rpe_null_without_rpe() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let started = service.start(user_id, workouts[0].id).await?;
    service
        .record_exercise(
            started.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: Some(1),
                sets: sets(&[(100.0, 10, None)]),
            },
        )
        .await?;
    let completed = service
        .complete(started.log.id, CompletionFeedback::default())
        .await?;

    assert_eq!(completed.avg_rpe, None);
    assert_eq!(completed.duration_minutes, Some(0));
    Ok(())
}

#[tokio::test]
async fn test_completing_twice_is_rejected_without_mutation() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let clock = manual_clock();
    let service = WorkoutSessionService::new(store.clone(), clock.clone());

    let started = service.start(user_id, workouts[0].id).await?;
    service
        .record_exercise(
            started.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: Some(2),
                sets: sets(&[(135.0, 10, Some(6.0)), (135.0, 10, Some(7.0))]),
            },
        )
        .await?;
    clock.advance(Duration::from_secs(30 * 60));
    let first = service
        .complete(started.log.id, CompletionFeedback::default())
        .await?;

    clock.advance(Duration::from_secs(30 * 60));
    let err = service
        .complete(
            started.log.id,
            CompletionFeedback {
                notes: Some("again".to_owned()),
                ..CompletionFeedback::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StateConflict);
    assert_eq!(err.http_status(), 400);

    let after = store.get_workout_log(started.log.id).await?.unwrap();
    assert_eq!(after.duration_minutes, first.duration_minutes);
    assert_eq!(after.total_volume, first.total_volume);
    assert_eq!(after.completed_at, first.completed_at);
    assert_eq!(after.notes, None);

    let err = service
        .record_exercise(
            started.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: None,
                sets: sets(&[(135.0, 10, None)]),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StateConflict);
    Ok(())
}

fn exercise_log(workout_log_id: Uuid, exercise_id: Uuid, reps: u32) -> ExerciseLog {
    ExerciseLog {
        id: Uuid::new_v4(),
        workout_log_id,
        exercise_id,
        sets_planned: 1,
        sets_completed: 1,
        sets: sets(&[(100.0, reps, Some(8.0))]),
        total_volume_lbs: 100.0 * f64::from(reps),
        total_reps: reps,
        avg_weight: Some(100.0),
        max_weight: Some(100.0),
        avg_reps: Some(f64::from(reps)),
        max_reps: Some(reps),
        avg_rpe: Some(8.0),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_guarded_completion_applies_once() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let log = store
        .insert_in_progress_log(&WorkoutLog::start(user_id, workouts[0].id, Utc::now()))
        .await?;

    let completion = |minutes: i64| WorkoutCompletion {
        log_id: log.id,
        planned_workout_id: workouts[0].id,
        started_at: log.started_at,
        completed_at: log.started_at + chrono::Duration::minutes(minutes),
        feedback: CompletionFeedback::default(),
    };

    let first = store.complete_workout_log(&completion(10)).await?;
    assert_eq!(first.map(|totals| totals.duration_minutes), Some(10));
    assert!(store.complete_workout_log(&completion(99)).await?.is_none());

    let stored = store.get_workout_log(log.id).await?.unwrap();
    assert_eq!(stored.duration_minutes, Some(10));
    Ok(())
}

#[tokio::test]
async fn test_completion_totals_read_entries_inside_transaction() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let log = store
        .insert_in_progress_log(&WorkoutLog::start(user_id, workouts[0].id, Utc::now()))
        .await?;

    // Entries written straight to the store, after any service-level read
    let squat = exercise_log(log.id, library[0].id, 5);
    let bench = exercise_log(log.id, library[1].id, 7);
    assert!(store.insert_exercise_log(&squat).await?);
    assert!(store.insert_exercise_log(&bench).await?);

    let totals = store
        .complete_workout_log(&WorkoutCompletion {
            log_id: log.id,
            planned_workout_id: workouts[0].id,
            started_at: log.started_at,
            completed_at: log.started_at,
            feedback: CompletionFeedback::default(),
        })
        .await?
        .unwrap();

    assert_eq!(totals.total_exercises, 2);
    assert_eq!(totals.total_sets, 2);
    assert_eq!(totals.total_reps, 12);
    assert!((totals.total_volume - 1200.0).abs() < f64::EPSILON);

    let stored = store.get_workout_log(log.id).await?.unwrap();
    assert_eq!(stored.total_sets, Some(2));
    assert_eq!(stored.total_reps, Some(12));
    Ok(())
}

#[tokio::test]
async fn test_entry_for_completed_log_is_not_inserted() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let started = service.start(user_id, workouts[0].id).await?;
    let completed = service
        .complete(started.log.id, CompletionFeedback::default())
        .await?;

    // A request that passed its status check before completion committed
    let late = exercise_log(started.log.id, library[0].id, 10);
    assert!(!store.insert_exercise_log(&late).await?);
    assert!(store.list_exercise_logs(started.log.id).await?.is_empty());
    assert!(service.personal_records(user_id, None).await?.is_empty());

    let stored = store.get_workout_log(started.log.id).await?.unwrap();
    assert_eq!(stored.total_sets, completed.total_sets);
    assert_eq!(stored.total_sets, Some(0));
    Ok(())
}

#[tokio::test]
async fn test_oversized_reps_rejected_before_insert() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let started = service.start(user_id, workouts[0].id).await?;
    let err = service
        .record_exercise(
            started.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: None,
                sets: sets(&[(1.0, 3_000_000_000, None), (1.0, 3_000_000_000, None)]),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    assert!(store.list_exercise_logs(started.log.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_personal_records_follow_best_sets() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 2, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let day_one = service.start(user_id, workouts[0].id).await?;
    service
        .record_exercise(
            day_one.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: Some(2),
                sets: sets(&[(200.0, 5, None), (210.0, 3, None)]),
            },
        )
        .await?;

    let day_two = service.start(user_id, workouts[1].id).await?;
    service
        .record_exercise(
            day_two.log.id,
            ExerciseEntry {
                exercise_id: library[0].id,
                sets_planned: Some(1),
                sets: sets(&[(180.0, 12, None)]),
            },
        )
        .await?;

    let records = service.personal_records(user_id, None).await?;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.exercise_id, library[0].id);
    assert_eq!(
        record.exercise_name.as_deref(),
        Some(library[0].name.as_str())
    );
    assert!((record.max_weight - 210.0).abs() < f64::EPSILON);
    assert_eq!(record.max_reps, 12);
    assert!((record.max_volume - 2160.0).abs() < f64::EPSILON);

    assert!(service
        .personal_records(Uuid::new_v4(), Some(10))
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_week_advances_when_all_workouts_completed() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (plan, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 2, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let first = service.start(user_id, workouts[0].id).await?;
    service
        .complete(first.log.id, CompletionFeedback::default())
        .await?;
    assert_eq!(store.get_plan(plan.id).await?.unwrap().current_week, 1);

    let second = service.start(user_id, workouts[1].id).await?;
    service
        .complete(second.log.id, CompletionFeedback::default())
        .await?;
    let advanced = store.get_plan(plan.id).await?.unwrap();
    assert_eq!(advanced.current_week, 2);
    assert_eq!(advanced.status, PlanStatus::Active);
    Ok(())
}

#[tokio::test]
async fn test_finishing_week_four_completes_plan() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (plan, workouts) = seed_plan_week(store.as_ref(), user_id, 4, 1, library[0].id).await?;
    let service = WorkoutSessionService::new(store.clone(), manual_clock());

    let session = service.start(user_id, workouts[0].id).await?;
    service
        .complete(session.log.id, CompletionFeedback::default())
        .await?;

    let finished = store.get_plan(plan.id).await?.unwrap();
    assert_eq!(finished.current_week, 4);
    assert_eq!(finished.status, PlanStatus::Completed);
    assert!(store.get_active_plan(user_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_logs_listed_newest_first_with_limit() -> Result<()> {
    let store = create_test_store().await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 3, library[0].id).await?;
    let clock = manual_clock();
    let service = WorkoutSessionService::new(store.clone(), clock.clone());

    let mut started = Vec::new();
    for workout in &workouts {
        started.push(service.start(user_id, workout.id).await?.log.id);
        clock.advance(Duration::from_secs(3600));
    }

    let logs = service.list_logs(user_id, Some(2)).await?;
    let ids: Vec<Uuid> = logs.iter().map(|log| log.id).collect();
    assert_eq!(ids, vec![started[2], started[1]]);

    let detail = service.detail(started[0]).await?;
    assert_eq!(detail.log.id, started[0]);
    assert!(detail.exercises.is_empty());

    let store_dyn: Arc<dyn WorkoutStore> = store;
    assert_eq!(store_dyn.list_workout_logs(user_id, 100).await?.len(), 3);
    Ok(())
}

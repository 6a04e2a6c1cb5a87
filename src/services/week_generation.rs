// ABOUTME: AI week generation - prompt building, response parsing, and id membership checks
// ABOUTME: Turns a candidate exercise list plus preferences into persisted planned workouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Week Generation
//!
//! One progression week is generated per LLM call. The model answers in JSON
//! mode against a fixed schema; every `exerciseId` it returns must come from
//! the candidate list sent in the prompt. Responses that reference unknown
//! ids are discarded and the request is re-issued, up to the configured
//! attempt budget. A response that is not valid JSON is fatal.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::plan_generation::{
    FINISH_REASON_LENGTH, MAX_TOKENS, MIN_CANDIDATE_EXERCISES, TEMPERATURE, WEEKS_PER_BLOCK,
};
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::{
    ExerciseSummary, GeneratedWeek, PlannedExercise, PlannedWorkout, TrainingPreferences,
    WeekType,
};

const SYSTEM_PROMPT: &str = "You are an expert strength and conditioning coach. \
You design safe, progressive training weeks and always answer with a single JSON object \
that matches the requested schema exactly.";

/// JSON shape the model must return
const OUTPUT_SCHEMA: &str = r#"{
  "weekNumber": 1,
  "weekType": "baseline",
  "workouts": [
    {
      "name": "Upper Body Strength",
      "dayOfWeek": 1,
      "targetMuscles": ["chest", "back", "shoulders"],
      "estimatedDuration": 45,
      "exercises": [
        {
          "exerciseId": "<id copied from the exercise list>",
          "sets": 3,
          "reps": "8-10",
          "restSeconds": 90,
          "tempo": "2-0-1-0",
          "rpe": 7,
          "notes": "Short coaching cue"
        }
      ]
    }
  ]
}"#;

/// Reject inputs that cannot produce a sensible week before spending tokens
///
/// # Errors
///
/// Returns a validation error when the week is outside the block or there
/// are too few candidate exercises
pub fn validate_generation_input(
    week_number: u32,
    exercises: &[ExerciseSummary],
) -> AppResult<()> {
    if !(1..=WEEKS_PER_BLOCK).contains(&week_number) {
        return Err(AppError::out_of_range(format!(
            "Week number must be between 1 and {WEEKS_PER_BLOCK}, got {week_number}"
        )));
    }
    if exercises.len() < MIN_CANDIDATE_EXERCISES {
        return Err(AppError::invalid_input(format!(
            "At least {MIN_CANDIDATE_EXERCISES} exercises are required to generate a week, got {}",
            exercises.len()
        )));
    }
    Ok(())
}

/// Build the user prompt for one progression week
#[must_use]
pub fn build_week_prompt(
    week_number: u32,
    exercises: &[ExerciseSummary],
    preferences: &TrainingPreferences,
) -> String {
    let week_type = WeekType::for_week(week_number);
    let mut prompt = String::with_capacity(2048 + exercises.len() * 96);

    let _ = writeln!(
        prompt,
        "Create week {week_number} of a {WEEKS_PER_BLOCK}-week {} program.",
        preferences.training_style
    );
    let _ = writeln!(
        prompt,
        "This is a {week_type} week; keep the overall intensity {}.",
        week_type.intensity()
    );
    let _ = writeln!(
        prompt,
        "Schedule exactly {} workouts, each about {} minutes long with {} exercises.",
        preferences.days_per_week, preferences.session_minutes, preferences.exercises_per_workout
    );

    prompt.push_str("\nAvailable exercises (id | name | category | target muscles):\n");
    for exercise in exercises {
        let _ = writeln!(
            prompt,
            "- {} | {} | {} | {}",
            exercise.id,
            exercise.name,
            exercise.category.as_deref().unwrap_or("general"),
            if exercise.target_muscles.is_empty() {
                "unspecified".to_owned()
            } else {
                exercise.target_muscles.join(", ")
            }
        );
    }

    prompt.push_str("\nRules:\n");
    prompt.push_str(
        "- Use only exercises from the list above and copy each exerciseId exactly as written.\n",
    );
    prompt.push_str("- dayOfWeek is 1 (Monday) through 7 (Sunday); do not repeat a day.\n");
    prompt.push_str("- Order exercises from compound to isolation within each workout.\n");
    let _ = writeln!(
        prompt,
        "- Set weekNumber to {week_number} and weekType to \"{week_type}\"."
    );

    prompt.push_str("\nRespond with JSON in exactly this shape:\n");
    prompt.push_str(OUTPUT_SCHEMA);
    prompt.push('\n');

    prompt
}

/// Parse the model's JSON answer into a [`GeneratedWeek`]
///
/// Truncated output (`finish_reason == "length"`) is logged and still parsed;
/// it usually fails, but a response cut after the closing brace is usable.
///
/// # Errors
///
/// Returns an external service error starting with `Failed to parse generated week`
pub fn parse_generated_week(
    content: &str,
    finish_reason: Option<&str>,
) -> AppResult<GeneratedWeek> {
    let truncated = finish_reason == Some(FINISH_REASON_LENGTH);
    if truncated {
        warn!(
            content_len = content.len(),
            "Week generation hit the token limit; response may be truncated"
        );
    }

    let body = strip_code_fence(content.trim());
    serde_json::from_str::<GeneratedWeek>(body).map_err(|e| {
        let suffix = if truncated {
            " (response was truncated at the token limit)"
        } else {
            ""
        };
        AppError::external_service(
            "LLM",
            format!("Failed to parse generated week{suffix}: {e}"),
        )
    })
}

/// Models occasionally wrap JSON-mode output in a markdown fence
fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Ids in `week` that are not candidate exercise ids, in order, deduplicated
#[must_use]
pub fn unknown_exercise_ids(week: &GeneratedWeek, candidates: &HashSet<Uuid>) -> Vec<String> {
    let mut seen = HashSet::new();
    week.exercise_ids()
        .filter(|id| {
            Uuid::parse_str(id.trim())
                .map_or(true, |parsed| !candidates.contains(&parsed))
        })
        .filter(|id| seen.insert(*id))
        .map(str::to_owned)
        .collect()
}

/// Convert a validated generated week into rows for `plan_id`
///
/// # Errors
///
/// Returns a validation error if an exercise id is not a UUID
pub fn to_planned_workouts(
    plan_id: Uuid,
    week_number: u32,
    week: &GeneratedWeek,
) -> AppResult<Vec<PlannedWorkout>> {
    week.workouts
        .iter()
        .map(|workout| {
            let exercises = workout
                .exercises
                .iter()
                .enumerate()
                .map(|(index, exercise)| {
                    let exercise_id = Uuid::parse_str(exercise.exercise_id.trim()).map_err(|_| {
                        AppError::invalid_input(format!(
                            "Generated exercise id is not a UUID: {}",
                            exercise.exercise_id
                        ))
                    })?;
                    Ok(PlannedExercise {
                        id: Uuid::new_v4(),
                        exercise_id,
                        exercise_name: None,
                        order_index: u32::try_from(index).unwrap_or(u32::MAX),
                        target_sets: exercise.sets,
                        target_reps: exercise.reps.clone(),
                        rest_seconds: exercise.rest_seconds,
                        tempo: exercise.tempo.clone(),
                        target_rpe: exercise.rpe,
                        notes: exercise.notes.clone(),
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;

            Ok(PlannedWorkout {
                id: Uuid::new_v4(),
                plan_id,
                week_number,
                day_of_week: workout.day_of_week,
                name: workout.name.clone(),
                target_muscles: workout.target_muscles.clone(),
                estimated_duration_minutes: workout.estimated_duration,
                completed: false,
                completed_at: None,
                exercises,
            })
        })
        .collect()
}

/// Generates progression weeks through an [`LlmProvider`]
#[derive(Clone)]
pub struct WeekGenerator {
    llm: Arc<dyn LlmProvider>,
    model: String,
    max_attempts: u32,
}

impl WeekGenerator {
    /// Create a generator; `max_attempts` is clamped to at least one
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            llm,
            model: model.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Provider name, for logs
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.llm.name()
    }

    /// Generate one week from `exercises`
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input or when every attempt
    /// referenced unknown exercise ids, a parse error when the response is
    /// not the expected JSON, or the provider's error
    pub async fn generate_week(
        &self,
        week_number: u32,
        exercises: &[ExerciseSummary],
        preferences: &TrainingPreferences,
    ) -> AppResult<GeneratedWeek> {
        validate_generation_input(week_number, exercises)?;

        let capabilities = self.llm.capabilities();
        if !capabilities.supports_json_mode() {
            warn!(
                provider = self.llm.name(),
                "Provider does not advertise JSON mode; relying on the prompt alone"
            );
        }

        let prompt = build_week_prompt(week_number, exercises, preferences);
        let candidates: HashSet<Uuid> = exercises.iter().map(|e| e.id).collect();
        let mut unknown = Vec::new();

        for attempt in 1..=self.max_attempts {
            let messages = if capabilities.supports_system_messages() {
                vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(prompt.as_str()),
                ]
            } else {
                vec![ChatMessage::user(format!("{SYSTEM_PROMPT}\n\n{prompt}"))]
            };
            let request = ChatRequest::new(messages)
                .with_model(self.model.as_str())
                .with_temperature(TEMPERATURE)
                .with_max_tokens(MAX_TOKENS)
                .with_json_mode();

            debug!(
                week_number,
                attempt,
                provider = self.llm.name(),
                prompt_len = prompt.len(),
                "Requesting generated week"
            );
            let response = self.llm.complete(&request).await?;
            let mut week =
                parse_generated_week(&response.content, response.finish_reason.as_deref())?;

            unknown = unknown_exercise_ids(&week, &candidates);
            if unknown.is_empty() {
                if week.week_number != week_number {
                    warn!(
                        requested = week_number,
                        returned = week.week_number,
                        "Model returned a different week number; using the requested one"
                    );
                    week.week_number = week_number;
                }
                info!(
                    week_number,
                    attempt,
                    workouts = week.workouts.len(),
                    "Generated week accepted"
                );
                return Ok(week);
            }

            warn!(
                week_number,
                attempt,
                max_attempts = self.max_attempts,
                unknown_ids = ?unknown,
                "Generated week referenced exercises outside the candidate list"
            );
        }

        Err(AppError::invalid_input(format!(
            "Generated week referenced unknown exercise ids after {} attempts: {}",
            self.max_attempts,
            unknown.join(", ")
        ))
        .with_details(json!({ "unknownExerciseIds": unknown })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn library(count: usize) -> Vec<ExerciseSummary> {
        (0..count)
            .map(|i| ExerciseSummary {
                id: Uuid::new_v4(),
                name: format!("Exercise {i}"),
                category: Some("push".to_owned()),
                target_muscles: vec!["chest".to_owned()],
            })
            .collect()
    }

    fn preferences() -> TrainingPreferences {
        TrainingPreferences {
            training_style: "hypertrophy".to_owned(),
            days_per_week: 3,
            session_minutes: 45,
            exercises_per_workout: 5,
        }
    }

    fn week_json(week_number: u32, ids: &[String]) -> String {
        let exercises: Vec<_> = ids
            .iter()
            .map(|id| json!({ "exerciseId": id, "sets": 3, "reps": 10 }))
            .collect();
        json!({
            "weekNumber": week_number,
            "weekType": "build",
            "workouts": [{ "name": "Push", "dayOfWeek": 1, "exercises": exercises }]
        })
        .to_string()
    }

    #[test]
    fn test_prompt_names_week_type_and_exact_ids() {
        let exercises = library(5);
        let prompt = build_week_prompt(4, &exercises, &preferences());

        assert!(prompt.contains("deload week"));
        assert!(prompt.contains("intensity light"));
        assert!(prompt.contains("exactly 3 workouts"));
        assert!(prompt.contains("copy each exerciseId exactly"));
        assert!(prompt.contains("\"exerciseId\""));
        for exercise in &exercises {
            assert!(prompt.contains(&exercise.id.to_string()));
        }
    }

    #[test]
    fn test_validation_rejects_small_library_and_bad_week() {
        let err = validate_generation_input(1, &library(4)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err = validate_generation_input(5, &library(5)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        assert!(validate_generation_input(0, &library(5)).is_err());
        assert!(validate_generation_input(2, &library(5)).is_ok());
    }

    #[test]
    fn test_parse_valid_week_with_truncation_flag() {
        let id = Uuid::new_v4().to_string();
        let content = week_json(2, &[id.clone()]);
        let week = parse_generated_week(&content, Some("length")).unwrap();
        assert_eq!(week.week_number, 2);
        assert_eq!(week.workouts[0].exercises[0].exercise_id, id);
        assert_eq!(week.workouts[0].exercises[0].reps, "10");
    }

    #[test]
    fn test_parse_truncated_garbage_is_descriptive() {
        let err = parse_generated_week(r#"{"weekNumber": 1, "workouts": [{"na"#, Some("length"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert!(err.message.contains("Failed to parse generated week"));
        assert!(err.message.contains("truncated"));
    }

    #[test]
    fn test_parse_accepts_fenced_json() {
        let id = Uuid::new_v4().to_string();
        let fenced = format!("```json\n{}\n```", week_json(1, &[id]));
        assert!(parse_generated_week(&fenced, Some("stop")).is_ok());
    }

    #[test]
    fn test_unknown_ids_are_reported_once() {
        let exercises = library(5);
        let candidates: HashSet<Uuid> = exercises.iter().map(|e| e.id).collect();
        let known = exercises[0].id.to_string();
        let week = parse_generated_week(
            &week_json(
                1,
                &[known, "bench-press".to_owned(), "bench-press".to_owned()],
            ),
            None,
        )
        .unwrap();

        assert_eq!(
            unknown_exercise_ids(&week, &candidates),
            vec!["bench-press"]
        );
    }

    #[test]
    fn test_planned_workouts_keep_exercise_order() {
        let exercises = library(5);
        let ids: Vec<String> = exercises.iter().map(|e| e.id.to_string()).collect();
        let week = parse_generated_week(&week_json(3, &ids), None).unwrap();
        let plan_id = Uuid::new_v4();

        let workouts = to_planned_workouts(plan_id, 3, &week).unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].plan_id, plan_id);
        assert_eq!(workouts[0].week_number, 3);
        let order: Vec<Uuid> = workouts[0]
            .exercises
            .iter()
            .map(|e| e.exercise_id)
            .collect();
        let expected: Vec<Uuid> = exercises.iter().map(|e| e.id).collect();
        assert_eq!(order, expected);
        assert_eq!(workouts[0].exercises[4].order_index, 4);
    }
}

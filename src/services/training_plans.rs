// ABOUTME: Training plan orchestration - current plan reads and week generation requests
// ABOUTME: Resolves preferences and plan, calls the week generator, persists the result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::week_generation::{to_planned_workouts, validate_generation_input, WeekGenerator};
use crate::cache::Clock;
use crate::constants::plan_generation::WEEKS_PER_BLOCK;
use crate::database::WorkoutStore;
use crate::errors::{AppError, AppResult};
use crate::models::{PlanStatus, PlannedWorkout, TrainingPreferences, WeekType, WorkoutPlan};

/// Active plan with its current-week workouts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPlan {
    /// The active plan
    pub plan: WorkoutPlan,
    /// Week the workouts belong to
    pub week_number: u32,
    /// Workouts with ordered exercises
    pub workouts: Vec<PlannedWorkout>,
}

/// Body of `POST /api/workouts/generate-week`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWeekRequest {
    /// Plan owner
    pub user_id: Uuid,
    /// Target plan; the active plan (or a new one) when absent
    #[serde(default)]
    pub plan_id: Option<Uuid>,
    /// Week to generate; the plan's current week when absent
    #[serde(default)]
    pub week_number: Option<u32>,
    /// Overrides the stored profile preferences
    #[serde(default)]
    pub preferences: Option<TrainingPreferences>,
}

/// Persisted week returned to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWeekResult {
    /// Plan the week was added to
    pub plan_id: Uuid,
    /// Week number
    pub week_number: u32,
    /// Classified week type
    pub week_type: WeekType,
    /// Inserted workouts
    pub workouts: Vec<PlannedWorkout>,
}

fn validate_preferences(preferences: &TrainingPreferences) -> AppResult<()> {
    if preferences.training_style.trim().is_empty() {
        return Err(AppError::missing_field("preferences.trainingStyle"));
    }
    if !(1..=7).contains(&preferences.days_per_week) {
        return Err(AppError::out_of_range(
            "daysPerWeek must be between 1 and 7",
        ));
    }
    if preferences.session_minutes == 0 || preferences.exercises_per_workout == 0 {
        return Err(AppError::out_of_range(
            "sessionMinutes and exercisesPerWorkout must be positive",
        ));
    }
    Ok(())
}

/// Plan reads and week generation
#[derive(Clone)]
pub struct TrainingPlanService {
    store: Arc<dyn WorkoutStore>,
    generator: Option<WeekGenerator>,
    clock: Arc<dyn Clock>,
}

impl TrainingPlanService {
    /// Create a plan service; generation is unavailable without a generator
    #[must_use]
    pub fn new(
        store: Arc<dyn WorkoutStore>,
        generator: Option<WeekGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            generator,
            clock,
        }
    }

    /// The user's active plan with its current-week workouts
    ///
    /// # Errors
    ///
    /// Returns not found when the user has no active plan
    pub async fn current_plan(&self, user_id: Uuid) -> AppResult<CurrentPlan> {
        let plan = self
            .store
            .get_active_plan(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Active workout plan"))?;
        let workouts = self
            .store
            .list_plan_workouts(plan.id, plan.current_week)
            .await?;

        Ok(CurrentPlan {
            week_number: plan.current_week,
            plan,
            workouts,
        })
    }

    /// Generate one week with the LLM and persist it
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` without an LLM, a validation error for bad
    /// input or missing preferences, not found for an unknown plan, a state
    /// conflict when the week already exists, or the generator's error
    pub async fn generate_week(
        &self,
        request: GenerateWeekRequest,
    ) -> AppResult<GeneratedWeekResult> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| AppError::config_missing("LLM API key is not configured"))?;

        let preferences = match request.preferences {
            Some(preferences) => preferences,
            None => self
                .store
                .get_training_preferences(request.user_id)
                .await?
                .ok_or_else(|| AppError::missing_field("preferences"))?,
        };
        validate_preferences(&preferences)?;

        let existing_plan = match request.plan_id {
            Some(plan_id) => {
                let plan = self
                    .store
                    .get_plan(plan_id)
                    .await?
                    .filter(|plan| plan.user_id == request.user_id)
                    .ok_or_else(|| AppError::not_found("Workout plan"))?;
                Some(plan)
            }
            None => self.store.get_active_plan(request.user_id).await?,
        };
        if let Some(plan) = &existing_plan {
            if plan.status != PlanStatus::Active {
                return Err(AppError::state_conflict(format!(
                    "Cannot generate weeks for a {} plan",
                    plan.status
                )));
            }
        }

        let week_number = request
            .week_number
            .or_else(|| existing_plan.as_ref().map(|plan| plan.current_week))
            .unwrap_or(1);

        if let Some(plan) = &existing_plan {
            if !self
                .store
                .list_plan_workouts(plan.id, week_number)
                .await?
                .is_empty()
            {
                return Err(AppError::state_conflict(format!(
                    "Week {week_number} has already been generated for this plan"
                )));
            }
        }

        let exercises = self.store.list_exercise_library().await?;
        validate_generation_input(week_number, &exercises)?;

        let week = generator
            .generate_week(week_number, &exercises, &preferences)
            .await?;

        // Plans are created only once a week was generated successfully
        let plan = match existing_plan {
            Some(plan) => plan,
            None => {
                let plan = self.new_plan(request.user_id, &preferences);
                self.store.create_plan(&plan).await?;
                info!(plan_id = %plan.id, user_id = %plan.user_id, "Created workout plan");
                plan
            }
        };

        let workouts = to_planned_workouts(plan.id, week_number, &week)?;
        self.store
            .insert_planned_week(plan.id, week_number, &workouts)
            .await?;

        info!(
            plan_id = %plan.id,
            week_number,
            workouts = workouts.len(),
            provider = generator.provider_name(),
            "Persisted generated week"
        );

        Ok(GeneratedWeekResult {
            plan_id: plan.id,
            week_number,
            week_type: WeekType::for_week(week_number),
            workouts,
        })
    }

    fn new_plan(&self, user_id: Uuid, preferences: &TrainingPreferences) -> WorkoutPlan {
        let now = self.clock.utc_now();
        let start_date = now.date_naive();
        let block_days = i64::from(WEEKS_PER_BLOCK) * 7 - 1;
        let style = preferences.training_style.trim();

        WorkoutPlan {
            id: Uuid::new_v4(),
            user_id,
            name: format!("{WEEKS_PER_BLOCK}-Week {} Program", title_case(style)),
            plan_type: style.to_lowercase(),
            start_date,
            end_date: start_date.checked_add_signed(Duration::days(block_days)),
            days_per_week: preferences.days_per_week,
            split_pattern: None,
            status: PlanStatus::Active,
            current_week: 1,
            created_at: now,
        }
    }
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

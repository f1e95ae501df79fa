//! Result reconciliation for one athlete's day.
//!
//! Storage allows at most one result per athlete per date, so before every
//! submission the engine has to know which existing row (if any) the edit
//! belongs to. That knowledge lives in `EditState` and is never re-derived at
//! submit time.
//!
//! ## Day-of rules
//!
//! | displayed workout | today's stored result        | state                          |
//! |-------------------|------------------------------|--------------------------------|
//! | W                 | none                         | `CatalogWorkout`, new row      |
//! | W                 | logged against W             | `CatalogWorkout`, update row   |
//! | W                 | other workout or custom      | `MismatchedWorkout`, update row|
//! | none              | custom                       | `CustomWorkout`, update row    |
//! | none              | none / catalog               | `Idle`                         |
//!
//! In the mismatched case the athlete sees W as not yet logged, but the
//! stale row's id is kept so submitting overwrites it instead of inserting a
//! second row for the day.
//!
//! After a successful submission the engine reloads everything from storage
//! and goes back to `Idle`.

use crate::catalog::{category_for_result, find_workout, workout_for_date, WorkoutCatalog};
use crate::classify::classify;
use crate::custom::CustomWorkoutBuilder;
use crate::editor::ScoreEditor;
use crate::store::ResultStore;
use crate::{
    CatalogWorkout, Error, Result, ResultPayload, ScoreCategory, ScoreMode, WorkoutResult,
};
use chrono::NaiveDate;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// State
// ============================================================================

/// What the athlete is currently editing and which row a submit will touch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditState {
    Idle,
    /// The displayed workout; `existing_id` is set when it is already logged
    CatalogWorkout {
        workout_id: String,
        existing_id: Option<Uuid>,
    },
    /// The displayed workout, while today's row belongs to something else
    MismatchedWorkout { workout_id: String, stale_id: Uuid },
    CustomWorkout { existing_id: Option<Uuid> },
    PastResult { result_id: Uuid },
}

impl EditState {
    pub fn tag(&self) -> StateTag {
        match self {
            EditState::Idle => StateTag::Idle,
            EditState::CatalogWorkout { .. } => StateTag::EditingCatalogMatching,
            EditState::MismatchedWorkout { .. } => StateTag::EditingCatalogMismatched,
            EditState::CustomWorkout { .. } => StateTag::EditingCustom,
            EditState::PastResult { .. } => StateTag::EditingPast,
        }
    }

    /// Row a submit would update; `None` means it would create one
    pub fn target_id(&self) -> Option<Uuid> {
        match self {
            EditState::Idle => None,
            EditState::CatalogWorkout { existing_id, .. } => *existing_id,
            EditState::MismatchedWorkout { stale_id, .. } => Some(*stale_id),
            EditState::CustomWorkout { existing_id } => *existing_id,
            EditState::PastResult { result_id } => Some(*result_id),
        }
    }
}

/// Plain state label for display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateTag {
    Idle,
    EditingCatalogMatching,
    EditingCatalogMismatched,
    EditingCustom,
    EditingPast,
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StateTag::Idle => "idle",
            StateTag::EditingCatalogMatching => "editing workout",
            StateTag::EditingCatalogMismatched => "editing workout (replaces today's other result)",
            StateTag::EditingCustom => "editing custom workout",
            StateTag::EditingPast => "editing past result",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Draft
// ============================================================================

/// In-memory edits for the result being worked on
#[derive(Clone, Debug, PartialEq)]
pub struct ResultDraft {
    score: ScoreEditor,
    pub mode: ScoreMode,
    pub notes: String,
    pub photo: Option<String>,
    movement_loads: Vec<String>,
    custom: Option<CustomWorkoutBuilder>,
}

impl ResultDraft {
    /// Empty draft for a catalog workout, one blank load per movement
    fn for_workout(workout: &CatalogWorkout) -> Self {
        Self {
            score: ScoreEditor::blank(classify(&workout.workout_type)),
            mode: ScoreMode::default(),
            notes: String::new(),
            photo: None,
            movement_loads: vec![String::new(); workout.movements.len()],
            custom: None,
        }
    }

    fn for_custom(builder: CustomWorkoutBuilder) -> Self {
        Self {
            score: ScoreEditor::blank(builder.category()),
            mode: ScoreMode::default(),
            notes: String::new(),
            photo: None,
            movement_loads: vec![String::new(); builder.movements().len()],
            custom: Some(builder),
        }
    }

    /// Pre-filled from a stored row
    fn from_result(
        result: &WorkoutResult,
        category: ScoreCategory,
        movement_count: usize,
        custom: Option<CustomWorkoutBuilder>,
    ) -> Self {
        let payload = &result.payload;
        let mut movement_loads = payload.movement_loads.clone();
        movement_loads.resize(movement_count, String::new());

        Self {
            score: ScoreEditor::new(payload.score.clone(), category),
            mode: payload.mode,
            notes: payload.notes.clone(),
            photo: payload.photo.clone(),
            movement_loads,
            custom,
        }
    }

    pub fn score(&self) -> &ScoreEditor {
        &self.score
    }

    pub fn score_mut(&mut self) -> &mut ScoreEditor {
        &mut self.score
    }

    pub fn movement_loads(&self) -> &[String] {
        &self.movement_loads
    }

    /// Annotate the load used for one movement; false when out of range
    pub fn set_load(&mut self, index: usize, load: impl Into<String>) -> bool {
        match self.movement_loads.get_mut(index) {
            Some(slot) => {
                *slot = load.into();
                true
            }
            None => false,
        }
    }

    /// Custom workout definition, when editing one
    pub fn custom(&self) -> Option<&CustomWorkoutBuilder> {
        self.custom.as_ref()
    }

    pub fn set_custom_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.custom_builder()?.set_name(name);
        Ok(())
    }

    /// Change the custom type; the score follows the new category
    pub fn set_custom_type(&mut self, workout_type: impl Into<String>) -> Result<()> {
        self.custom_builder()?;
        let workout_type = workout_type.into();
        self.score.recategorize(classify(&workout_type))?;
        self.custom_builder()?.set_type(workout_type);
        Ok(())
    }

    /// Replace the custom movement list, keeping loads aligned with it
    pub fn set_custom_movements(&mut self, movements: Vec<String>) -> Result<()> {
        let builder = self.custom_builder()?;
        builder.set_movements(movements);
        let count = builder.movements().len();
        self.movement_loads.resize(count, String::new());
        Ok(())
    }

    fn custom_builder(&mut self) -> Result<&mut CustomWorkoutBuilder> {
        self.custom
            .as_mut()
            .ok_or_else(|| Error::State("not editing a custom workout".into()))
    }

    fn payload(&self, athlete_id: &str, date: NaiveDate) -> Result<ResultPayload> {
        Ok(ResultPayload {
            athlete_id: athlete_id.to_string(),
            date,
            workout_id: None,
            custom_name: None,
            custom_type: None,
            custom_movements: Vec::new(),
            score: self.score.encoded()?,
            mode: self.mode,
            notes: self.notes.clone(),
            photo: self.photo.clone(),
            movement_loads: self.movement_loads.clone(),
        })
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Decides create vs. update for one athlete and day
pub struct ReconcileEngine {
    athlete_id: String,
    today: NaiveDate,
    benchmarks: Vec<String>,
    workouts: Vec<CatalogWorkout>,
    displayed: Option<String>,
    results: Vec<WorkoutResult>,
    day_results: Vec<WorkoutResult>,
    state: EditState,
    draft: Option<ResultDraft>,
}

impl ReconcileEngine {
    pub fn new(athlete_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            athlete_id: athlete_id.into(),
            today,
            benchmarks: Vec::new(),
            workouts: Vec::new(),
            displayed: None,
            results: Vec::new(),
            day_results: Vec::new(),
            state: EditState::Idle,
            draft: None,
        }
    }

    /// Benchmark names checked against custom workout names
    pub fn with_benchmarks(mut self, benchmarks: Vec<String>) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetch everything, show today's programmed workout and enter the day state
    pub fn load<S, C>(&mut self, store: &S, catalog: &C) -> Result<()>
    where
        S: ResultStore + ?Sized,
        C: WorkoutCatalog + ?Sized,
    {
        self.reload(store, catalog)?;
        self.displayed = workout_for_date(&self.workouts, self.today).map(|w| w.id.clone());
        self.begin_day();
        Ok(())
    }

    /// Replace cached workouts and results with what storage holds now
    pub fn reload<S, C>(&mut self, store: &S, catalog: &C) -> Result<()>
    where
        S: ResultStore + ?Sized,
        C: WorkoutCatalog + ?Sized,
    {
        self.workouts = catalog.list_workouts()?;
        self.results = store.list_results_for_athlete(&self.athlete_id)?;
        self.day_results = store.list_results_for_date(self.today)?;
        tracing::debug!(
            "Reloaded {} workouts, {} results for {}, {} results on {}",
            self.workouts.len(),
            self.results.len(),
            self.athlete_id,
            self.day_results.len(),
            self.today
        );
        Ok(())
    }

    /// Show a different catalog workout (or none) and recompute the day state
    pub fn display_workout(&mut self, workout_id: Option<&str>) -> Result<()> {
        if let Some(id) = workout_id {
            if find_workout(&self.workouts, id).is_none() {
                return Err(Error::NotFound(format!("workout {}", id)));
            }
        }
        self.displayed = workout_id.map(str::to_string);
        self.begin_day();
        Ok(())
    }

    /// Compute the day-of editing state from the cached results
    pub fn begin_day(&mut self) {
        let today = self.today_result().cloned();
        let displayed = self.displayed_workout().cloned();

        let (state, draft) = match (displayed, today) {
            (Some(workout), None) => (
                EditState::CatalogWorkout {
                    workout_id: workout.id.clone(),
                    existing_id: None,
                },
                Some(ResultDraft::for_workout(&workout)),
            ),
            (Some(workout), Some(result)) if result.workout_id() == Some(workout.id.as_str()) => {
                let draft = ResultDraft::from_result(
                    &result,
                    classify(&workout.workout_type),
                    workout.movements.len(),
                    None,
                );
                (
                    EditState::CatalogWorkout {
                        workout_id: workout.id.clone(),
                        existing_id: Some(result.id),
                    },
                    Some(draft),
                )
            }
            (Some(workout), Some(result)) => {
                tracing::info!(
                    "Today's result {} is not for workout {}; submitting will replace it",
                    result.id,
                    workout.id
                );
                (
                    EditState::MismatchedWorkout {
                        workout_id: workout.id.clone(),
                        stale_id: result.id,
                    },
                    Some(ResultDraft::for_workout(&workout)),
                )
            }
            (None, Some(result)) if result.is_custom() => {
                let draft = self.draft_for_custom_result(&result);
                (
                    EditState::CustomWorkout {
                        existing_id: Some(result.id),
                    },
                    Some(draft),
                )
            }
            (None, _) => (EditState::Idle, None),
        };

        self.transition(state);
        self.draft = draft;
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Log an ad-hoc workout today instead of the displayed one
    ///
    /// Submitting updates today's row if there is one, whatever it was
    /// logged against.
    pub fn start_custom_workout(&mut self) {
        let today = self.today_result().cloned();

        let draft = match &today {
            Some(result) if result.is_custom() => self.draft_for_custom_result(result),
            _ => ResultDraft::for_custom(CustomWorkoutBuilder::new()),
        };

        self.transition(EditState::CustomWorkout {
            existing_id: today.map(|r| r.id),
        });
        self.draft = Some(draft);
    }

    /// Edit a specific stored row, whatever its date
    pub fn start_editing_past(&mut self, result_id: Uuid) -> Result<()> {
        let result = self
            .results
            .iter()
            .find(|r| r.id == result_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("result {}", result_id)))?;

        let draft = if result.is_custom() {
            self.draft_for_custom_result(&result)
        } else {
            let workout = result.workout_id().and_then(|id| find_workout(&self.workouts, id));
            let category = self.category_of(&result);
            let count = workout
                .map(|w| w.movements.len())
                .unwrap_or(result.payload.movement_loads.len());
            ResultDraft::from_result(&result, category, count, None)
        };

        self.transition(EditState::PastResult { result_id });
        self.draft = Some(draft);
        Ok(())
    }

    /// Drop in-progress edits and return to the day-of state
    pub fn cancel(&mut self) {
        tracing::debug!("Discarding edits in state {}", self.state.tag());
        self.begin_day();
    }

    /// Persist the draft: exactly one create or one update
    ///
    /// On a validation or store failure nothing in memory changes, so the
    /// athlete's input survives and the caller may retry. On success the
    /// engine goes back to `Idle` and every cached result set is reloaded; a
    /// failed reload after a successful write is logged, not returned, since
    /// the row is already stored.
    pub fn submit<S, C>(&mut self, store: &mut S, catalog: &C) -> Result<WorkoutResult>
    where
        S: ResultStore + ?Sized,
        C: WorkoutCatalog + ?Sized,
    {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| Error::State("nothing is being edited".into()))?;

        let payload = match &self.state {
            EditState::Idle => return Err(Error::State("nothing is being edited".into())),
            EditState::CatalogWorkout { workout_id, .. }
            | EditState::MismatchedWorkout { workout_id, .. } => {
                let mut payload = draft.payload(&self.athlete_id, self.today)?;
                payload.workout_id = Some(workout_id.clone());
                payload
            }
            EditState::CustomWorkout { .. } => self.custom_payload(draft, self.today)?,
            EditState::PastResult { result_id } => {
                let original = self
                    .results
                    .iter()
                    .find(|r| r.id == *result_id)
                    .ok_or_else(|| Error::NotFound(format!("result {}", result_id)))?;
                if original.is_custom() {
                    self.custom_payload(draft, original.date())?
                } else {
                    let mut payload = draft.payload(&self.athlete_id, original.date())?;
                    payload.workout_id = original.payload.workout_id.clone();
                    payload
                }
            }
        };

        let saved = match self.state.target_id() {
            Some(id) => store.update_result(id, &payload)?,
            None => store.create_result(&payload)?,
        };
        tracing::info!(
            "Saved result {} ({}) for {} on {}",
            saved.id,
            self.state.tag(),
            self.athlete_id,
            saved.date()
        );

        self.transition(EditState::Idle);
        self.draft = None;
        if let Err(e) = self.reload(&*store, catalog) {
            tracing::warn!("Saved result {} but reloading results failed: {}", saved.id, e);
        }
        Ok(saved)
    }

    /// Remove a stored row, reload, and recompute the day state
    pub fn delete_result<S, C>(&mut self, result_id: Uuid, store: &mut S, catalog: &C) -> Result<()>
    where
        S: ResultStore + ?Sized,
        C: WorkoutCatalog + ?Sized,
    {
        store.delete_result(result_id)?;
        tracing::info!("Deleted result {}", result_id);
        self.reload(&*store, catalog)?;
        self.begin_day();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn tag(&self) -> StateTag {
        self.state.tag()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn draft(&self) -> Option<&ResultDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ResultDraft> {
        self.draft.as_mut()
    }

    /// This athlete's results, most recent first
    pub fn results(&self) -> &[WorkoutResult] {
        &self.results
    }

    /// Every athlete's results for today
    pub fn day_results(&self) -> &[WorkoutResult] {
        &self.day_results
    }

    pub fn workouts(&self) -> &[CatalogWorkout] {
        &self.workouts
    }

    pub fn displayed_workout(&self) -> Option<&CatalogWorkout> {
        self.displayed
            .as_deref()
            .and_then(|id| find_workout(&self.workouts, id))
    }

    /// The athlete's stored result dated today
    pub fn today_result(&self) -> Option<&WorkoutResult> {
        let mut on_day = self.results.iter().filter(|r| r.date() == self.today);
        let first = on_day.next();
        if on_day.next().is_some() {
            tracing::warn!(
                "Found more than one result for {} on {}, using the latest",
                self.athlete_id,
                self.today
            );
        }
        first
    }

    /// Score category a stored result is encoded under
    pub fn category_of(&self, result: &WorkoutResult) -> ScoreCategory {
        category_for_result(result, &self.workouts)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition(&mut self, next: EditState) {
        if self.state != next {
            tracing::debug!("Reconcile state {} -> {}", self.state.tag(), next.tag());
        }
        self.state = next;
    }

    fn draft_for_custom_result(&self, result: &WorkoutResult) -> ResultDraft {
        let builder = CustomWorkoutBuilder::from_result(result);
        let count = builder.movements().len();
        ResultDraft::from_result(result, builder.category(), count, Some(builder))
    }

    fn custom_payload(&self, draft: &ResultDraft, date: NaiveDate) -> Result<ResultPayload> {
        let builder = draft
            .custom
            .as_ref()
            .ok_or_else(|| Error::State("custom workout draft has no definition".into()))?;
        let workout = builder.validate(&self.benchmarks)?;

        // Loads stay aligned with the movements that survived validation
        let loads = builder
            .movements()
            .iter()
            .zip(draft.movement_loads.iter())
            .filter(|(movement, _)| !movement.trim().is_empty())
            .map(|(_, load)| load.clone())
            .collect();

        let mut payload = draft.payload(&self.athlete_id, date)?;
        payload.custom_name = Some(workout.name);
        payload.custom_type = Some(workout.workout_type);
        payload.custom_movements = workout.movements;
        payload.movement_loads = loads;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::store::{sort_most_recent_first, StoreError, StoreResult};
    use chrono::Utc;

    /// In-memory store that can be told to fail writes
    #[derive(Default)]
    struct MemoryStore {
        rows: Vec<WorkoutResult>,
        fail_writes: bool,
        fail_reads: bool,
        creates: usize,
        updates: usize,
    }

    impl MemoryStore {
        fn insert(&mut self, payload: ResultPayload) -> Uuid {
            let row = WorkoutResult {
                id: Uuid::new_v4(),
                payload,
                logged_at: Utc::now(),
            };
            let id = row.id;
            self.rows.push(row);
            id
        }
    }

    impl ResultStore for MemoryStore {
        fn list_results_for_athlete(&self, athlete_id: &str) -> StoreResult<Vec<WorkoutResult>> {
            if self.fail_reads {
                return Err(StoreError::Unavailable("offline".into()));
            }
            let mut rows: Vec<_> = self
                .rows
                .iter()
                .filter(|r| r.payload.athlete_id == athlete_id)
                .cloned()
                .collect();
            sort_most_recent_first(&mut rows);
            Ok(rows)
        }

        fn list_results_for_date(&self, date: NaiveDate) -> StoreResult<Vec<WorkoutResult>> {
            if self.fail_reads {
                return Err(StoreError::Unavailable("offline".into()));
            }
            Ok(self.rows.iter().filter(|r| r.date() == date).cloned().collect())
        }

        fn create_result(&mut self, payload: &ResultPayload) -> StoreResult<WorkoutResult> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("offline".into()));
            }
            if self
                .rows
                .iter()
                .any(|r| r.payload.athlete_id == payload.athlete_id && r.date() == payload.date)
            {
                return Err(StoreError::DuplicateDay {
                    athlete_id: payload.athlete_id.clone(),
                    date: payload.date,
                });
            }
            self.creates += 1;
            let id = self.insert(payload.clone());
            Ok(self.rows.iter().find(|r| r.id == id).cloned().unwrap())
        }

        fn update_result(&mut self, id: Uuid, payload: &ResultPayload) -> StoreResult<WorkoutResult> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("offline".into()));
            }
            let row = self
                .rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;
            row.payload = payload.clone();
            self.updates += 1;
            Ok(row.clone())
        }

        fn delete_result(&mut self, id: Uuid) -> StoreResult<()> {
            self.rows.retain(|r| r.id != id);
            Ok(())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(10)
    }

    fn workout(id: &str, date: NaiveDate, workout_type: &str, movements: &[&str]) -> CatalogWorkout {
        CatalogWorkout {
            id: id.into(),
            date,
            workout_type: workout_type.into(),
            name: None,
            movements: movements.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn catalog() -> Vec<CatalogWorkout> {
        vec![
            workout("fran", day(9), "For Time", &["Thruster", "Pull-up"]),
            workout("cindy", today(), "AMRAP", &["Pull-up", "Push-up", "Air Squat"]),
            workout("dl", day(8), "Strength", &["Deadlift"]),
        ]
    }

    fn catalog_payload(workout_id: &str, date: NaiveDate, score: &str) -> ResultPayload {
        ResultPayload {
            athlete_id: "ana".into(),
            date,
            workout_id: Some(workout_id.into()),
            custom_name: None,
            custom_type: None,
            custom_movements: vec![],
            score: score.into(),
            mode: ScoreMode::Rx,
            notes: String::new(),
            photo: None,
            movement_loads: vec![],
        }
    }

    fn custom_payload(date: NaiveDate, score: &str) -> ResultPayload {
        ResultPayload {
            workout_id: None,
            custom_name: Some("Hotel WOD".into()),
            custom_type: Some("For Time".into()),
            custom_movements: vec!["Burpee".into(), "Lunge".into()],
            movement_loads: vec!["".into(), "20 lb".into()],
            ..catalog_payload("unused", date, score)
        }
    }

    fn engine() -> ReconcileEngine {
        ReconcileEngine::new("ana", today()).with_benchmarks(vec!["Fran".into(), "Murph".into()])
    }

    fn loaded(store: &MemoryStore) -> ReconcileEngine {
        crate::logging::init_test();
        let mut engine = engine();
        engine.load(store, &catalog()).unwrap();
        engine
    }

    #[test]
    fn test_no_result_today_edits_displayed_workout() {
        let store = MemoryStore::default();
        let engine = loaded(&store);

        assert_eq!(
            engine.state(),
            &EditState::CatalogWorkout {
                workout_id: "cindy".into(),
                existing_id: None
            }
        );
        let draft = engine.draft().unwrap();
        assert_eq!(draft.movement_loads(), &["", "", ""]);
        assert_eq!(draft.score().category(), ScoreCategory::Amrap);
        assert_eq!(draft.score().encoded().unwrap(), "");
    }

    #[test]
    fn test_first_submit_creates_and_returns_to_idle() {
        let mut store = MemoryStore::default();
        let mut engine = loaded(&store);

        let draft = engine.draft_mut().unwrap();
        draft.score_mut().set_field("rounds", "8").unwrap();
        draft.score_mut().set_field("reps", "15").unwrap();
        draft.set_load(0, "band");

        let saved = engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(saved.payload.score, "8+15");
        assert_eq!(saved.workout_id(), Some("cindy"));
        assert_eq!(saved.payload.movement_loads, vec!["band", "", ""]);
        assert_eq!(store.creates, 1);

        assert_eq!(engine.tag(), StateTag::Idle);
        assert!(engine.draft().is_none());
        assert_eq!(engine.results().len(), 1);
        assert_eq!(engine.day_results().len(), 1);
    }

    #[test]
    fn test_matching_result_is_prefilled_and_updated() {
        let mut store = MemoryStore::default();
        let mut payload = catalog_payload("cindy", today(), "8+15");
        payload.movement_loads = vec!["band".into()];
        payload.notes = "legs shot".into();
        let id = store.insert(payload);

        let mut engine = loaded(&store);
        assert_eq!(engine.state().target_id(), Some(id));
        let draft = engine.draft().unwrap();
        assert_eq!(draft.score().fields().get("rounds"), Some("8"));
        assert_eq!(draft.notes, "legs shot");
        assert_eq!(draft.movement_loads(), &["band", "", ""]);

        engine
            .draft_mut()
            .unwrap()
            .score_mut()
            .set_field("reps", "20")
            .unwrap();
        let saved = engine.submit(&mut store, &catalog()).unwrap();

        assert_eq!(saved.id, id);
        assert_eq!(store.creates, 0);
        assert_eq!(store.updates, 1);
        assert_eq!(store.rows.len(), 1);
        assert_eq!(store.rows[0].payload.score, "8+20");
    }

    #[test]
    fn test_mismatched_result_keeps_stale_id() {
        let mut store = MemoryStore::default();
        let stale = store.insert(catalog_payload("fran", today(), "4:30"));

        let mut engine = loaded(&store);
        assert_eq!(
            engine.state(),
            &EditState::MismatchedWorkout {
                workout_id: "cindy".into(),
                stale_id: stale
            }
        );
        // Displayed workout shows as not yet logged
        assert_eq!(engine.draft().unwrap().score().encoded().unwrap(), "");

        engine.draft_mut().unwrap().score_mut().set_text("12+3");
        let saved = engine.submit(&mut store, &catalog()).unwrap();

        assert_eq!(saved.id, stale);
        assert_eq!(store.creates, 0);
        assert_eq!(store.rows.len(), 1);
        assert_eq!(store.rows[0].workout_id(), Some("cindy"));
        assert_eq!(store.rows[0].payload.score, "12+3");
    }

    #[test]
    fn test_custom_result_with_displayed_workout_is_mismatched() {
        let mut store = MemoryStore::default();
        let stale = store.insert(custom_payload(today(), "20:00"));

        let mut engine = loaded(&store);
        assert_eq!(engine.tag(), StateTag::EditingCatalogMismatched);
        assert_eq!(engine.state().target_id(), Some(stale));

        engine.draft_mut().unwrap().score_mut().set_text("5+5");
        let saved = engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(saved.id, stale);
        assert!(!saved.is_custom());
        assert_eq!(saved.payload.custom_name, None);
        assert!(saved.payload.custom_movements.is_empty());
    }

    #[test]
    fn test_custom_workout_replaces_todays_row() {
        let mut store = MemoryStore::default();
        let existing = store.insert(catalog_payload("cindy", today(), "8+15"));

        let mut engine = loaded(&store);
        engine.start_custom_workout();
        assert_eq!(
            engine.state(),
            &EditState::CustomWorkout {
                existing_id: Some(existing)
            }
        );

        let draft = engine.draft_mut().unwrap();
        assert!(draft.custom().is_some());
        draft.set_custom_name("Hotel Stairs").unwrap();
        draft.set_custom_type("For Time").unwrap();
        draft
            .set_custom_movements(vec!["Stair Climb".into(), "".into(), "Push-up".into()])
            .unwrap();
        draft.set_load(2, "weighted vest");
        draft.score_mut().set_field("minutes", "22").unwrap();
        draft.score_mut().set_field("seconds", "5").unwrap();

        let saved = engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(saved.id, existing);
        assert_eq!(saved.workout_id(), None);
        assert_eq!(saved.payload.custom_name.as_deref(), Some("Hotel Stairs"));
        assert_eq!(saved.payload.custom_movements, vec!["Stair Climb", "Push-up"]);
        assert_eq!(saved.payload.movement_loads, vec!["", "weighted vest"]);
        assert_eq!(saved.payload.score, "22:05");
        assert_eq!(store.rows.len(), 1);
    }

    #[test]
    fn test_custom_workout_without_row_creates() {
        let mut store = MemoryStore::default();
        let mut engine = ReconcileEngine::new("ana", day(20));
        engine.load(&store, &catalog()).unwrap();
        assert_eq!(engine.tag(), StateTag::Idle);

        engine.start_custom_workout();
        let draft = engine.draft_mut().unwrap();
        draft.set_custom_movements(vec!["Row".into()]).unwrap();
        draft.score_mut().set_text("30:00");

        let saved = engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(store.creates, 1);
        assert_eq!(saved.date(), day(20));
        assert_eq!(saved.payload.custom_type.as_deref(), Some("For Time"));
    }

    #[test]
    fn test_custom_validation_blocks_submit() {
        let mut store = MemoryStore::default();
        let mut engine = loaded(&store);
        engine.start_custom_workout();

        let err = engine.submit(&mut store, &catalog()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NoMovements)));
        assert_eq!(engine.tag(), StateTag::EditingCustom);
        assert!(store.rows.is_empty());
    }

    #[test]
    fn test_benchmark_name_blocks_submit() {
        let mut store = MemoryStore::default();
        let mut engine = loaded(&store);
        engine.start_custom_workout();

        let draft = engine.draft_mut().unwrap();
        draft.set_custom_name("FRAN").unwrap();
        draft.set_custom_movements(vec!["Thruster".into()]).unwrap();

        let err = engine.submit(&mut store, &catalog()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::BenchmarkName { .. })
        ));

        // Renaming fixes it
        engine.draft_mut().unwrap().set_custom_name("Not Fran").unwrap();
        assert!(engine.submit(&mut store, &catalog()).is_ok());
    }

    #[test]
    fn test_custom_type_change_recategorizes_score() {
        let store = MemoryStore::default();
        let mut engine = loaded(&store);
        engine.start_custom_workout();

        let draft = engine.draft_mut().unwrap();
        assert_eq!(draft.score().category(), ScoreCategory::Time);
        draft.set_custom_type("Strength").unwrap();
        assert_eq!(draft.score().category(), ScoreCategory::Weight);
    }

    #[test]
    fn test_custom_setters_rejected_for_catalog_draft() {
        let store = MemoryStore::default();
        let mut engine = loaded(&store);
        let err = engine.draft_mut().unwrap().set_custom_name("x").unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_past_edit_updates_that_row() {
        let mut store = MemoryStore::default();
        let past = store.insert(catalog_payload("fran", day(9), "4:30"));
        let mut engine = loaded(&store);

        engine.start_editing_past(past).unwrap();
        assert_eq!(engine.tag(), StateTag::EditingPast);
        assert_eq!(engine.draft().unwrap().score().fields().get("minutes"), Some("4"));

        engine
            .draft_mut()
            .unwrap()
            .score_mut()
            .set_field("seconds", "15")
            .unwrap();
        let saved = engine.submit(&mut store, &catalog()).unwrap();

        assert_eq!(saved.id, past);
        assert_eq!(saved.date(), day(9));
        assert_eq!(saved.workout_id(), Some("fran"));
        assert_eq!(saved.payload.score, "4:15");
        assert_eq!(store.creates, 0);
    }

    #[test]
    fn test_past_custom_edit_keeps_custom_fields() {
        let mut store = MemoryStore::default();
        let past = store.insert(custom_payload(day(5), "20:00"));
        let mut engine = loaded(&store);

        engine.start_editing_past(past).unwrap();
        let draft = engine.draft().unwrap();
        assert_eq!(draft.custom().unwrap().name(), "Hotel WOD");
        assert_eq!(draft.movement_loads(), &["", "20 lb"]);

        let saved = engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(saved.date(), day(5));
        assert_eq!(saved.payload.custom_movements, vec!["Burpee", "Lunge"]);
        assert_eq!(saved.payload.score, "20:00");
    }

    #[test]
    fn test_leaving_past_edit_recomputes_day_state() {
        let mut store = MemoryStore::default();
        let past = store.insert(catalog_payload("fran", day(9), "4:30"));
        let mut engine = loaded(&store);

        engine.start_editing_past(past).unwrap();
        engine
            .draft_mut()
            .unwrap()
            .score_mut()
            .set_text("9:99");

        // Another client logs today's workout meanwhile
        let today_id = store.insert(catalog_payload("cindy", today(), "7+1"));
        engine.reload(&store, &catalog()).unwrap();
        engine.cancel();

        assert_eq!(
            engine.state(),
            &EditState::CatalogWorkout {
                workout_id: "cindy".into(),
                existing_id: Some(today_id)
            }
        );
        assert_eq!(engine.draft().unwrap().score().encoded().unwrap(), "7+1");
    }

    #[test]
    fn test_unknown_past_result() {
        let store = MemoryStore::default();
        let mut engine = loaded(&store);
        let err = engine.start_editing_past(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(engine.tag(), StateTag::EditingCatalogMatching);
    }

    #[test]
    fn test_store_failure_preserves_edits() {
        let mut store = MemoryStore::default();
        let mut engine = loaded(&store);
        engine.draft_mut().unwrap().score_mut().set_text("8+15");
        let state_before = engine.state().clone();
        let draft_before = engine.draft().cloned();

        store.fail_writes = true;
        let err = engine.submit(&mut store, &catalog()).unwrap_err();
        assert!(matches!(err, Error::Persistence(StoreError::Unavailable(_))));
        assert_eq!(engine.state(), &state_before);
        assert_eq!(engine.draft().cloned(), draft_before);

        // Caller-level retry succeeds once the store is back
        store.fail_writes = false;
        engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(store.rows.len(), 1);
    }

    #[test]
    fn test_invalid_field_blocks_submit() {
        let mut store = MemoryStore::default();
        let id = store.insert(catalog_payload("cindy", today(), "8+15"));
        let mut engine = loaded(&store);

        engine.draft_mut().unwrap().score_mut().set_field("reps", "lots").unwrap();
        let draft_before = engine.draft().cloned();

        let err = engine.submit(&mut store, &catalog()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidField { ref field, .. }) if field == "reps"
        ));
        assert_eq!(store.updates, 0);
        assert_eq!(engine.draft().cloned(), draft_before);
        assert_eq!(engine.state().target_id(), Some(id));
        assert_eq!(store.rows[0].payload.score, "8+15");
    }

    #[test]
    fn test_reload_failure_after_write_still_returns_saved_row() {
        let mut store = MemoryStore::default();
        let mut engine = loaded(&store);
        engine.draft_mut().unwrap().score_mut().set_text("8+15");

        store.fail_reads = true;
        let saved = engine.submit(&mut store, &catalog()).unwrap();
        assert_eq!(saved.payload.score, "8+15");
        assert_eq!(store.creates, 1);
        assert_eq!(engine.tag(), StateTag::Idle);
    }

    #[test]
    fn test_submit_while_idle() {
        let mut store = MemoryStore::default();
        let mut engine = ReconcileEngine::new("ana", day(20));
        engine.load(&store, &catalog()).unwrap();
        let err = engine.submit(&mut store, &catalog()).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_custom_result_without_displayed_workout() {
        let mut store = MemoryStore::default();
        let id = store.insert(custom_payload(day(20), "18:40"));
        let mut engine = ReconcileEngine::new("ana", day(20));
        engine.load(&store, &catalog()).unwrap();

        assert_eq!(engine.state(), &EditState::CustomWorkout { existing_id: Some(id) });
        assert_eq!(engine.draft().unwrap().score().encoded().unwrap(), "18:40");
    }

    #[test]
    fn test_unparseable_score_shown_as_freeform_and_kept() {
        let mut store = MemoryStore::default();
        // Workout type changed from AMRAP to Strength after logging
        let mut workouts = catalog();
        workouts[1].workout_type = "Strength".into();
        let id = store.insert(catalog_payload("cindy", today(), "8+15"));

        let mut engine = engine();
        engine.load(&store, &workouts).unwrap();
        let score = engine.draft().unwrap().score();
        assert!(score.is_fallback());
        assert_eq!(score.fields().get("text"), Some("8+15"));

        engine.draft_mut().unwrap().notes = "edited notes only".into();
        let saved = engine.submit(&mut store, &workouts).unwrap();
        assert_eq!(saved.id, id);
        assert_eq!(saved.payload.score, "8+15");
    }

    #[test]
    fn test_display_workout_switches_context() {
        let store = MemoryStore::default();
        let mut engine = loaded(&store);

        engine.display_workout(Some("dl")).unwrap();
        assert_eq!(engine.displayed_workout().map(|w| w.id.as_str()), Some("dl"));
        assert_eq!(
            engine.draft().unwrap().score().category(),
            ScoreCategory::Weight
        );

        engine.display_workout(None).unwrap();
        assert_eq!(engine.tag(), StateTag::Idle);

        assert!(matches!(
            engine.display_workout(Some("nope")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_recomputes_state() {
        let mut store = MemoryStore::default();
        let id = store.insert(catalog_payload("fran", today(), "4:30"));
        let mut engine = loaded(&store);
        assert_eq!(engine.tag(), StateTag::EditingCatalogMismatched);

        engine.delete_result(id, &mut store, &catalog()).unwrap();
        assert!(engine.results().is_empty());
        assert_eq!(
            engine.state(),
            &EditState::CatalogWorkout {
                workout_id: "cindy".into(),
                existing_id: None
            }
        );
    }
}

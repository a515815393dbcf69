//! Service facade over the store, the clock and the analytics components.
//!
//! An [`Engine`] is built once at startup and passed by reference. Every
//! mutation goes through it, is written in one transaction together with
//! its [`Event`], and is logged. Derived metrics are recomputed on demand
//! from stored records.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analytics::unlock::{DraftMetrics, MIN_SENTENCES_FOR_UNLOCK};
use crate::analytics::{
    DailyProgressPoint, EngagementStats, GoalProgress, InsightInput, SprintProgress,
    StreakCalculator, TimeWindowAggregator, Timeframe, WindowSummary,
};
use crate::clock::{Clock, SystemClock};
use crate::coach::{CoachPrompt, PromptCheckIn, PromptGoal};
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::model::{
    normalize_activities, CheckIn, DailyBrainDump, Goal, GoalStatus, Habit, Insight, Milestone,
    MoodLabel, NewCheckIn, NewGoal, NewTask, Sprint, Task, SPRINT_DURATION_DAYS,
};
use crate::storage::{Config, EventStore, InsightCacheEntry};

/// Check-ins included in a coach prompt.
const PROMPT_CHECK_INS: usize = 7;

/// Streaks for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStreak {
    pub habit_id: String,
    pub title: String,
    #[serde(flatten)]
    pub stats: EngagementStats,
}

pub struct Engine {
    store: EventStore,
    clock: Box<dyn Clock>,
    config: Config,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Engine {
    pub fn new(store: EventStore, clock: impl Clock + 'static, config: Config) -> Self {
        Self {
            store,
            clock: Box::new(clock),
            config,
        }
    }

    /// Open the on-disk store with the system clock.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or migrated.
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::new(EventStore::open()?, SystemClock, config))
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn record(store: &EventStore, event: Event) -> Result<()> {
        let seq = store.append_event(&event)?;
        debug!(seq, kind = event.kind(), material = event.is_material(), "event recorded");
        Ok(())
    }

    // ── Check-ins ───────────────────────────────────────────────────

    /// Submit today's check-in and freeze today's draft.
    ///
    /// # Errors
    /// `Validation` for malformed input, `DuplicateDate` when today already
    /// has a check-in. An existing check-in is never overwritten.
    pub fn submit_check_in(&self, input: NewCheckIn) -> Result<CheckIn> {
        input.validate()?;
        let now = self.now();
        let date = now.date_naive();
        if self.store.check_in_on(date)?.is_some() {
            return Err(CoreError::DuplicateDate { date });
        }

        let check_in = CheckIn {
            id: new_id(),
            date,
            mood: MoodLabel::parse(&input.mood),
            happy_thing: input.happy_thing.trim().to_string(),
            improve_thing: input.improve_thing.trim().to_string(),
            fields: input.fields,
            activities: normalize_activities(&input.activities),
            ai_response: None,
            submitted_at: now,
        };

        self.store.transaction(|store| {
            store.insert_check_in(&check_in)?;
            Self::record(
                store,
                Event::CheckInSubmitted {
                    check_in_id: check_in.id.clone(),
                    date,
                    mood_score: check_in.mood_score(),
                    at: now,
                },
            )?;

            let mut draft = store
                .get_brain_dump(date)?
                .unwrap_or_else(|| DailyBrainDump::new(date));
            if !draft.finalized {
                draft.finalized = true;
                store.upsert_brain_dump(&draft)?;
                Self::record(store, Event::DraftFinalized { date, at: now })?;
            }
            Ok(())
        })?;

        info!(id = %check_in.id, %date, mood = check_in.mood.as_str(), "check-in submitted");
        Ok(check_in)
    }

    /// Check-ins inside the window ending today, oldest first.
    pub fn check_ins(&self, timeframe: Timeframe) -> Result<Vec<CheckIn>> {
        let today = self.today();
        self.store
            .check_ins_between(timeframe.lower_bound(today), today)
    }

    /// Streaks recomputed from stored check-in days.
    pub fn engagement(&self) -> Result<EngagementStats> {
        let days = self.store.check_in_dates()?;
        Ok(StreakCalculator::new().compute(days, self.today()))
    }

    pub fn window_summary(&self, timeframe: Timeframe) -> Result<WindowSummary> {
        let check_ins = self.store.list_check_ins()?;
        let tasks = self.store.list_tasks()?;
        Ok(TimeWindowAggregator::new().summarize(&check_ins, &tasks, timeframe, self.today()))
    }

    // ── Insights ────────────────────────────────────────────────────

    /// Ranked insights, regenerated at most once per day unless stored
    /// data changed materially.
    pub fn active_insights(&self) -> Result<Vec<Insight>> {
        let revision = self.store.data_revision()?;
        let today = self.today();
        if let Some(entry) = self.store.cached_insights()? {
            if entry.revision == revision && entry.day == today {
                debug!(revision, "insight cache hit");
                return Ok(entry.insights);
            }
        }

        debug!(revision, "insight cache miss, regenerating");
        let insights = self.generate_insights()?;
        self.store.store_insights(&InsightCacheEntry {
            revision,
            day: today,
            insights: insights.clone(),
        })?;
        Ok(insights)
    }

    fn generate_insights(&self) -> Result<Vec<Insight>> {
        let today = self.today();
        let check_ins: Vec<CheckIn> = self
            .store
            .list_check_ins()?
            .into_iter()
            .filter(|c| c.date <= today)
            .collect();

        let correlation = self.config.analytics.correlation_engine();
        let factors = correlation.factor_correlations(&check_ins);
        let activities = correlation.activity_correlations(&check_ins);
        let engagement = StreakCalculator::new().compute(check_ins.iter().map(|c| c.date), today);

        let mut goals = Vec::new();
        for goal in self.store.list_goals(false)? {
            if goal.is_active() {
                let progress = self.progress_for(&goal, today)?;
                goals.push((goal, progress));
            }
        }

        let insights = self.config.analytics.insight_generator().generate(&InsightInput {
            check_ins: &check_ins,
            factors: &factors,
            activities: &activities,
            engagement,
            goals: &goals,
            now: self.now(),
        });
        debug!(count = insights.len(), check_ins = check_ins.len(), "insights generated");
        Ok(insights)
    }

    // ── Goals ───────────────────────────────────────────────────────

    pub fn create_goal(&self, input: NewGoal) -> Result<Goal> {
        input.validate()?;
        let now = self.now();
        let created_on = now.date_naive();
        let goal = Goal {
            id: new_id(),
            title: input.title.trim().to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            category: input.category,
            created_on,
            target_date: Goal::target_for(created_on),
            status: GoalStatus::Active,
            milestones: Vec::new(),
            progress: 0.0,
        };
        self.store.transaction(|store| {
            store.insert_goal(&goal)?;
            Self::record(
                store,
                Event::GoalCreated {
                    goal_id: goal.id.clone(),
                    at: now,
                },
            )
        })?;
        info!(id = %goal.id, title = %goal.title, "goal created");
        Ok(goal)
    }

    fn require_goal(&self, id: &str) -> Result<Goal> {
        self.store
            .get_goal(id)?
            .ok_or_else(|| CoreError::not_found("goal", id))
    }

    /// Goals with their cached progress refreshed.
    pub fn list_goals(&self, include_archived: bool) -> Result<Vec<Goal>> {
        let today = self.today();
        let mut goals = self.store.list_goals(include_archived)?;
        for goal in &mut goals {
            let progress = self.progress_for(goal, today)?;
            self.refresh_cached_progress(goal, progress.percentage)?;
        }
        Ok(goals)
    }

    fn progress_for(&self, goal: &Goal, today: NaiveDate) -> Result<GoalProgress> {
        let tasks = self.store.tasks_for_goal(&goal.id)?;
        Ok(self
            .config
            .analytics
            .progress_tracker()
            .goal_progress(goal, &tasks, today))
    }

    fn refresh_cached_progress(&self, goal: &mut Goal, percentage: f64) -> Result<()> {
        if (goal.progress - percentage).abs() > f64::EPSILON {
            self.store.set_goal_progress(&goal.id, percentage)?;
            goal.progress = percentage;
        }
        Ok(())
    }

    /// Work-driven completion and schedule status of one goal.
    pub fn goal_progress(&self, goal_id: &str) -> Result<GoalProgress> {
        let mut goal = self.require_goal(goal_id)?;
        let progress = self.progress_for(&goal, self.today())?;
        self.refresh_cached_progress(&mut goal, progress.percentage)?;
        Ok(progress)
    }

    /// Daily completion from creation through today.
    pub fn goal_progress_history(&self, goal_id: &str) -> Result<Vec<DailyProgressPoint>> {
        let goal = self.require_goal(goal_id)?;
        let tasks = self.store.tasks_for_goal(&goal.id)?;
        Ok(self
            .config
            .analytics
            .progress_tracker()
            .daily_history(&goal, &tasks, self.today()))
    }

    pub fn archive_goal(&self, goal_id: &str) -> Result<Goal> {
        let mut goal = self.require_goal(goal_id)?;
        if goal.status == GoalStatus::Archived {
            return Ok(goal);
        }
        let now = self.now();
        self.store.transaction(|store| {
            store.set_goal_status(goal_id, GoalStatus::Archived)?;
            Self::record(
                store,
                Event::GoalArchived {
                    goal_id: goal_id.to_string(),
                    at: now,
                },
            )
        })?;
        goal.status = GoalStatus::Archived;
        info!(id = %goal_id, "goal archived");
        Ok(goal)
    }

    /// Hard-delete a goal.
    ///
    /// # Errors
    /// `GoalReferenced` while any sprint points at it; archive instead.
    pub fn delete_goal(&self, goal_id: &str) -> Result<()> {
        self.require_goal(goal_id)?;
        let sprints = self.store.count_sprints_for_goal(goal_id)?;
        if sprints > 0 {
            return Err(ValidationError::GoalReferenced {
                id: goal_id.to_string(),
                sprints,
            }
            .into());
        }
        let now = self.now();
        self.store.transaction(|store| {
            store.delete_goal(goal_id)?;
            Self::record(
                store,
                Event::GoalDeleted {
                    goal_id: goal_id.to_string(),
                    at: now,
                },
            )
        })?;
        info!(id = %goal_id, "goal deleted");
        Ok(())
    }

    /// Split the 12-week goal window into three 4-week sprints
    /// (weeks 1, 5 and 9). Returns the existing sprints if already planned.
    pub fn plan_sprints(&self, goal_id: &str) -> Result<Vec<Sprint>> {
        let goal = self.require_goal(goal_id)?;
        let existing = self.store.list_sprints(Some(goal_id))?;
        if !existing.is_empty() {
            debug!(id = %goal_id, count = existing.len(), "sprints already planned");
            return Ok(existing);
        }

        let now = self.now();
        let mut sprints = Vec::new();
        for (i, week_number) in [1u32, 5, 9].into_iter().enumerate() {
            let offset = Days::new(SPRINT_DURATION_DAYS * i as u64);
            let start_date = goal
                .created_on
                .checked_add_days(offset)
                .unwrap_or(goal.target_date);
            sprints.push(Sprint {
                id: new_id(),
                goal_id: Some(goal.id.clone()),
                title: format!("{}: weeks {}-{}", goal.title, week_number, week_number + 3),
                week_number,
                start_date,
                end_date: Sprint::end_for(start_date),
                tasks: Vec::new(),
                milestones: Vec::new(),
            });
        }

        self.store.transaction(|store| {
            for sprint in &sprints {
                store.insert_sprint(sprint)?;
                Self::record(
                    store,
                    Event::SprintCreated {
                        sprint_id: sprint.id.clone(),
                        goal_id: sprint.goal_id.clone(),
                        at: now,
                    },
                )?;
            }
            Ok(())
        })?;
        info!(id = %goal_id, count = sprints.len(), "sprints planned");
        Ok(sprints)
    }

    // ── Milestones ──────────────────────────────────────────────────

    /// Add a milestone to a goal, optionally inside one of its sprints.
    /// The target date defaults to the goal's target date.
    pub fn add_milestone(
        &self,
        goal_id: &str,
        title: &str,
        target_date: Option<NaiveDate>,
        sprint_id: Option<&str>,
    ) -> Result<Milestone> {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingField("title").into());
        }
        let goal = self.require_goal(goal_id)?;
        if let Some(sprint_id) = sprint_id {
            let sprint = self.require_sprint(sprint_id)?;
            if sprint.goal_id.as_deref() != Some(goal.id.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: "sprint_id",
                    message: format!("sprint {sprint_id} does not belong to goal {}", goal.id),
                }
                .into());
            }
        }
        let milestone = Milestone {
            id: new_id(),
            goal_id: Some(goal.id.clone()),
            sprint_id: sprint_id.map(str::to_string),
            title: title.trim().to_string(),
            target_date: target_date.unwrap_or(goal.target_date),
            completed_at: None,
        };
        let now = self.now();
        self.store.transaction(|store| {
            store.insert_milestone(&milestone)?;
            Self::record(
                store,
                Event::MilestoneAdded {
                    milestone_id: milestone.id.clone(),
                    goal_id: milestone.goal_id.clone(),
                    at: now,
                },
            )
        })?;
        info!(id = %milestone.id, goal = %goal.id, "milestone added");
        Ok(milestone)
    }

    /// Complete a milestone. One-way: completing twice is an error.
    pub fn complete_milestone(&self, milestone_id: &str) -> Result<Milestone> {
        let mut milestone = self
            .store
            .get_milestone(milestone_id)?
            .ok_or_else(|| CoreError::not_found("milestone", milestone_id))?;
        let now = self.now();
        milestone.complete(now)?;
        self.store.transaction(|store| {
            if !store.mark_milestone_completed(milestone_id, now)? {
                return Err(ValidationError::MilestoneAlreadyCompleted {
                    id: milestone_id.to_string(),
                }
                .into());
            }
            Self::record(
                store,
                Event::MilestoneCompleted {
                    milestone_id: milestone_id.to_string(),
                    at: now,
                },
            )
        })?;
        info!(id = %milestone_id, "milestone completed");
        Ok(milestone)
    }

    // ── Sprints ─────────────────────────────────────────────────────

    fn require_sprint(&self, id: &str) -> Result<Sprint> {
        self.store
            .get_sprint(id)?
            .ok_or_else(|| CoreError::not_found("sprint", id))
    }

    /// Create a 4-week sprint starting on `start_date` (today if `None`).
    pub fn create_sprint(
        &self,
        goal_id: Option<&str>,
        title: &str,
        start_date: Option<NaiveDate>,
        week_number: Option<u32>,
    ) -> Result<Sprint> {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingField("title").into());
        }
        let goal = goal_id.map(|id| self.require_goal(id)).transpose()?;
        let start_date = start_date.unwrap_or_else(|| self.today());
        let week_number = match (week_number, &goal) {
            (Some(0), _) => {
                return Err(ValidationError::InvalidValue {
                    field: "week_number",
                    message: "weeks are numbered from 1".into(),
                }
                .into())
            }
            (Some(n), _) => n,
            (None, Some(goal)) => ((start_date - goal.created_on).num_days().max(0) / 7) as u32 + 1,
            (None, None) => 1,
        };

        let sprint = Sprint {
            id: new_id(),
            goal_id: goal.map(|g| g.id),
            title: title.trim().to_string(),
            week_number,
            start_date,
            end_date: Sprint::end_for(start_date),
            tasks: Vec::new(),
            milestones: Vec::new(),
        };
        let now = self.now();
        self.store.transaction(|store| {
            store.insert_sprint(&sprint)?;
            Self::record(
                store,
                Event::SprintCreated {
                    sprint_id: sprint.id.clone(),
                    goal_id: sprint.goal_id.clone(),
                    at: now,
                },
            )
        })?;
        info!(id = %sprint.id, week_number, "sprint created");
        Ok(sprint)
    }

    pub fn list_sprints(&self, goal_id: Option<&str>) -> Result<Vec<Sprint>> {
        self.store.list_sprints(goal_id)
    }

    pub fn sprint_status(&self, sprint_id: &str) -> Result<SprintProgress> {
        let sprint = self.require_sprint(sprint_id)?;
        Ok(self
            .config
            .analytics
            .progress_tracker()
            .sprint_progress(&sprint, self.today()))
    }

    // ── Tasks ───────────────────────────────────────────────────────

    pub fn add_task(&self, input: NewTask) -> Result<Task> {
        input.validate()?;
        if let Some(sprint_id) = &input.sprint_id {
            self.require_sprint(sprint_id)?;
        }
        let now = self.now();
        let task = Task {
            id: new_id(),
            title: input.title.trim().to_string(),
            priority: input.priority,
            category: input.category,
            due_date: input.due_date,
            completed_at: None,
            source: input.source,
            sprint_id: input.sprint_id,
            created_at: now,
        };
        self.store.transaction(|store| {
            store.insert_task(&task)?;
            Self::record(
                store,
                Event::TaskAdded {
                    task_id: task.id.clone(),
                    sprint_id: task.sprint_id.clone(),
                    at: now,
                },
            )
        })?;
        info!(id = %task.id, priority = task.priority.as_str(), "task added");
        Ok(task)
    }

    fn require_task(&self, id: &str) -> Result<Task> {
        self.store
            .get_task(id)?
            .ok_or_else(|| CoreError::not_found("task", id))
    }

    /// Mark a task done. Completing a done task keeps its first timestamp.
    pub fn complete_task(&self, task_id: &str) -> Result<Task> {
        let mut task = self.require_task(task_id)?;
        if task.is_completed() {
            return Ok(task);
        }
        let now = self.now();
        self.store.transaction(|store| {
            store.set_task_completion(task_id, Some(now))?;
            Self::record(
                store,
                Event::TaskCompleted {
                    task_id: task_id.to_string(),
                    at: now,
                },
            )
        })?;
        task.completed_at = Some(now);
        info!(id = %task_id, "task completed");
        Ok(task)
    }

    pub fn reopen_task(&self, task_id: &str) -> Result<Task> {
        let mut task = self.require_task(task_id)?;
        if !task.is_completed() {
            return Ok(task);
        }
        let now = self.now();
        self.store.transaction(|store| {
            store.set_task_completion(task_id, None)?;
            Self::record(
                store,
                Event::TaskReopened {
                    task_id: task_id.to_string(),
                    at: now,
                },
            )
        })?;
        task.completed_at = None;
        info!(id = %task_id, "task reopened");
        Ok(task)
    }

    pub fn tasks_for_sprint(&self, sprint_id: &str) -> Result<Vec<Task>> {
        self.require_sprint(sprint_id)?;
        self.store.tasks_for_sprint(sprint_id)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.store.list_tasks()
    }

    // ── Habits ──────────────────────────────────────────────────────

    pub fn create_habit(&self, title: &str, goal_id: Option<&str>) -> Result<Habit> {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingField("title").into());
        }
        if let Some(goal_id) = goal_id {
            self.require_goal(goal_id)?;
        }
        let now = self.now();
        let habit = Habit {
            id: new_id(),
            title: title.trim().to_string(),
            goal_id: goal_id.map(str::to_string),
            created_on: now.date_naive(),
            archived: false,
            completions: Vec::new(),
        };
        self.store.transaction(|store| {
            store.insert_habit(&habit)?;
            Self::record(
                store,
                Event::HabitCreated {
                    habit_id: habit.id.clone(),
                    at: now,
                },
            )
        })?;
        info!(id = %habit.id, "habit created");
        Ok(habit)
    }

    /// Log a habit for a day (today if `None`). Logging the same day twice
    /// is a no-op; returns whether a new day was recorded.
    pub fn log_habit(&self, habit_id: &str, day: Option<NaiveDate>) -> Result<bool> {
        let today = self.today();
        let day = day.unwrap_or(today);
        if day > today {
            return Err(ValidationError::InvalidValue {
                field: "date",
                message: format!("{day} is in the future"),
            }
            .into());
        }
        if self.store.get_habit(habit_id)?.is_none() {
            return Err(CoreError::not_found("habit", habit_id));
        }
        let now = self.now();
        let logged = self.store.transaction(|store| {
            let logged = store.log_habit(habit_id, day)?;
            if logged {
                Self::record(
                    store,
                    Event::HabitLogged {
                        habit_id: habit_id.to_string(),
                        date: day,
                        at: now,
                    },
                )?;
            }
            Ok(logged)
        })?;
        if logged {
            info!(id = %habit_id, %day, "habit logged");
        }
        Ok(logged)
    }

    pub fn habit_streaks(&self) -> Result<Vec<HabitStreak>> {
        let today = self.today();
        let calc = StreakCalculator::new();
        Ok(self
            .store
            .list_habits()?
            .into_iter()
            .map(|h| HabitStreak {
                stats: calc.compute(h.completions.iter().copied(), today),
                habit_id: h.id,
                title: h.title,
            })
            .collect())
    }

    // ── Drafts and coach ────────────────────────────────────────────

    /// The draft for a day; empty if nothing was written.
    pub fn brain_dump(&self, date: NaiveDate) -> Result<DailyBrainDump> {
        Ok(self
            .store
            .get_brain_dump(date)?
            .unwrap_or_else(|| DailyBrainDump::new(date)))
    }

    /// Replace today's draft text and goal tags; returns the recomputed
    /// gate metrics.
    ///
    /// # Errors
    /// `DraftFinalized` once today's check-in is submitted, `NotFound` for
    /// an unknown goal tag.
    pub fn update_brain_dump_draft<I, S>(&self, text: &str, goal_ids: I) -> Result<DraftMetrics>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let goal_ids: BTreeSet<String> = goal_ids.into_iter().map(Into::into).collect();
        for id in &goal_ids {
            self.require_goal(id)?;
        }

        let now = self.now();
        let date = now.date_naive();
        let mut draft = self.brain_dump(date)?;
        let metrics = draft.edit(text, goal_ids, now)?;
        self.store.transaction(|store| {
            store.upsert_brain_dump(&draft)?;
            Self::record(
                store,
                Event::DraftUpdated {
                    date,
                    word_count: metrics.word_count,
                    sentence_count: metrics.sentence_count,
                    at: now,
                },
            )
        })?;
        debug!(
            %date,
            words = metrics.word_count,
            sentences = metrics.sentence_count,
            "draft saved"
        );
        Ok(metrics)
    }

    /// Build the coach context from today's saved draft.
    ///
    /// Drafts are stored on every edit, so the caller can run the async
    /// coach call without holding the engine.
    ///
    /// # Errors
    /// `CoachLocked` until the draft reaches the sentence minimum.
    pub fn coach_prompt(&self) -> Result<CoachPrompt> {
        let today = self.today();
        let draft = self.brain_dump(today)?;
        let metrics = draft.metrics();
        if !metrics.is_ai_chat_unlocked {
            return Err(ValidationError::CoachLocked {
                sentences: metrics.sentence_count,
                needed: MIN_SENTENCES_FOR_UNLOCK,
            }
            .into());
        }

        let mut recent = self.check_ins(Timeframe::Week)?;
        recent.reverse();
        recent.truncate(PROMPT_CHECK_INS);
        let recent_check_ins = recent
            .into_iter()
            .map(|c| PromptCheckIn {
                date: c.date,
                mood: c.mood.as_str().to_string(),
                happy_thing: c.happy_thing,
                improve_thing: c.improve_thing,
            })
            .collect();

        let mut active_goals = Vec::new();
        let mut tagged_goals = Vec::new();
        for goal in self.store.list_goals(false)? {
            if draft.goal_ids.contains(&goal.id) {
                tagged_goals.push(goal.title.clone());
            }
            if goal.is_active() {
                let progress = self.progress_for(&goal, today)?;
                active_goals.push(PromptGoal {
                    title: goal.title,
                    category: goal.category.as_str().to_string(),
                    percentage: progress.percentage,
                    on_track: progress.is_on_track,
                });
            }
        }

        Ok(CoachPrompt {
            date: today,
            recent_check_ins,
            active_goals,
            draft: draft.text,
            tagged_goals,
        })
    }

    /// Attach a coach reply to the check-in of `date`. Returns false when
    /// that day has no check-in yet.
    pub fn record_coach_reply(&self, date: NaiveDate, text: &str) -> Result<bool> {
        let now = self.now();
        let stored = self.store.transaction(|store| {
            let stored = store.set_ai_response(date, text)?;
            if stored {
                Self::record(store, Event::CoachReplyRecorded { date, at: now })?;
            }
            Ok(stored)
        })?;
        if stored {
            info!(%date, "coach reply recorded");
        } else {
            debug!(%date, "no check-in to attach coach reply to");
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ScheduleStatus;
    use crate::clock::FixedClock;
    use crate::model::Category;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn engine_at(date: NaiveDate) -> Engine {
        Engine::new(
            EventStore::open_memory().unwrap(),
            FixedClock::at_date(date),
            Config::default(),
        )
    }

    #[test]
    fn duplicate_check_in_is_rejected_without_overwrite() {
        let engine = engine_at(d(2026, 5, 10));
        let first = engine.submit_check_in(NewCheckIn::new("good").happy("Sun")).unwrap();
        let err = engine
            .submit_check_in(NewCheckIn::new("awful"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateDate { .. }));
        let stored = engine.store().check_in_on(first.date).unwrap().unwrap();
        assert_eq!(stored.mood, MoodLabel::Good);
    }

    #[test]
    fn invalid_check_in_is_rejected() {
        let engine = engine_at(d(2026, 5, 10));
        let err = engine.submit_check_in(NewCheckIn::new("  ")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingField("mood"))
        ));
        assert!(engine.check_ins(Timeframe::Week).unwrap().is_empty());
    }

    #[test]
    fn submit_finalizes_draft() {
        let engine = engine_at(d(2026, 5, 10));
        engine
            .update_brain_dump_draft("First thought. Second thought.", Vec::<String>::new())
            .unwrap();
        engine.submit_check_in(NewCheckIn::new("good")).unwrap();
        let err = engine
            .update_brain_dump_draft("More.", Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DraftFinalized { .. })
        ));
        assert_eq!(
            engine.brain_dump(d(2026, 5, 10)).unwrap().text,
            "First thought. Second thought."
        );
    }

    #[test]
    fn draft_with_unknown_goal_tag_is_rejected() {
        let engine = engine_at(d(2026, 5, 10));
        let err = engine
            .update_brain_dump_draft("Hi.", ["nope"])
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "goal", .. }));
    }

    #[test]
    fn coach_prompt_requires_unlock() {
        let engine = engine_at(d(2026, 5, 10));
        engine.update_brain_dump_draft("Only one.", Vec::<String>::new()).unwrap();
        assert!(matches!(
            engine.coach_prompt(),
            Err(CoreError::Validation(ValidationError::CoachLocked { sentences: 1, needed: 2 }))
        ));

        let goal = engine
            .create_goal(NewGoal::new("Sleep by 11", Category::Health))
            .unwrap();
        engine
            .update_brain_dump_draft("Only one. Now two.", [goal.id.clone()])
            .unwrap();
        let prompt = engine.coach_prompt().unwrap();
        assert_eq!(prompt.tagged_goals, vec!["Sleep by 11".to_string()]);
        assert_eq!(prompt.active_goals.len(), 1);
        assert_eq!(prompt.draft, "Only one. Now two.");
    }

    #[test]
    fn coach_reply_attaches_to_check_in() {
        let engine = engine_at(d(2026, 5, 10));
        assert!(!engine.record_coach_reply(d(2026, 5, 10), "Hello").unwrap());
        engine.submit_check_in(NewCheckIn::new("okay")).unwrap();
        assert!(engine.record_coach_reply(d(2026, 5, 10), "Hello").unwrap());
        let c = engine.store().check_in_on(d(2026, 5, 10)).unwrap().unwrap();
        assert_eq!(c.ai_response.as_deref(), Some("Hello"));
    }

    #[test]
    fn goal_referenced_by_sprint_cannot_be_deleted() {
        let engine = engine_at(d(2026, 1, 1));
        let goal = engine
            .create_goal(NewGoal::new("Ship side project", Category::Career))
            .unwrap();
        engine.plan_sprints(&goal.id).unwrap();
        let err = engine.delete_goal(&goal.id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::GoalReferenced { sprints: 3, .. })
        ));
        let archived = engine.archive_goal(&goal.id).unwrap();
        assert_eq!(archived.status, GoalStatus::Archived);
        assert!(engine.list_goals(false).unwrap().is_empty());
    }

    #[test]
    fn plan_sprints_covers_twelve_weeks_once() {
        let engine = engine_at(d(2026, 1, 1));
        let goal = engine
            .create_goal(NewGoal::new("Read 6 books", Category::PersonalGrowth))
            .unwrap();
        let sprints = engine.plan_sprints(&goal.id).unwrap();
        let weeks: Vec<u32> = sprints.iter().map(|s| s.week_number).collect();
        assert_eq!(weeks, vec![1, 5, 9]);
        assert_eq!(sprints[0].start_date, d(2026, 1, 1));
        assert_eq!(sprints[2].end_date, goal.target_date);
        for s in &sprints {
            assert_eq!((s.end_date - s.start_date).num_days(), 28);
        }
        assert_eq!(engine.plan_sprints(&goal.id).unwrap().len(), 3);
        assert_eq!(engine.list_sprints(Some(&goal.id)).unwrap().len(), 3);
    }

    #[test]
    fn milestone_completion_is_one_way() {
        let engine = engine_at(d(2026, 1, 1));
        let goal = engine
            .create_goal(NewGoal::new("Save 1000", Category::Finance))
            .unwrap();
        let m = engine.add_milestone(&goal.id, "First 250", None, None).unwrap();
        assert_eq!(m.target_date, goal.target_date);
        let done = engine.complete_milestone(&m.id).unwrap();
        assert!(done.is_completed());
        let err = engine.complete_milestone(&m.id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MilestoneAlreadyCompleted { .. })
        ));
        assert_eq!(engine.goal_progress(&goal.id).unwrap().percentage, 100.0);
        assert_eq!(engine.store().get_goal(&goal.id).unwrap().unwrap().progress, 100.0);
    }

    #[test]
    fn milestone_sprint_must_belong_to_the_goal() {
        let engine = engine_at(d(2026, 1, 1));
        let run = engine
            .create_goal(NewGoal::new("Run a 10k", Category::Health))
            .unwrap();
        let save = engine
            .create_goal(NewGoal::new("Save 1000", Category::Finance))
            .unwrap();
        let run_sprint = engine
            .create_sprint(Some(run.id.as_str()), "Base miles", None, None)
            .unwrap();
        let loose_sprint = engine.create_sprint(None, "Odds and ends", None, None).unwrap();

        for sprint_id in [&run_sprint.id, &loose_sprint.id] {
            let err = engine
                .add_milestone(&save.id, "First 250", None, Some(sprint_id.as_str()))
                .unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::InvalidValue { field: "sprint_id", .. })
            ));
        }
        assert!(engine.store().milestones_for_goal(&save.id).unwrap().is_empty());

        let m = engine
            .add_milestone(&run.id, "5k without stopping", None, Some(run_sprint.id.as_str()))
            .unwrap();
        assert_eq!(m.sprint_id.as_deref(), Some(run_sprint.id.as_str()));
    }

    #[test]
    fn task_lifecycle_drives_sprint_status() {
        let engine = engine_at(d(2026, 1, 10));
        let sprint = engine
            .create_sprint(None, "January", Some(d(2026, 1, 1)), None)
            .unwrap();
        let t1 = engine.add_task(NewTask::new("Plan").in_sprint(&sprint.id)).unwrap();
        engine.add_task(NewTask::new("Do").in_sprint(&sprint.id)).unwrap();

        engine.complete_task(&t1.id).unwrap();
        let status = engine.sprint_status(&sprint.id).unwrap();
        assert_eq!(status.percentage, 50.0);
        assert_eq!(status.days_remaining, 19);
        assert!(status.is_active);
        assert!(!status.is_overdue);

        engine.reopen_task(&t1.id).unwrap();
        assert_eq!(engine.sprint_status(&sprint.id).unwrap().percentage, 0.0);
        assert_eq!(engine.tasks_for_sprint(&sprint.id).unwrap().len(), 2);
    }

    #[test]
    fn task_in_unknown_sprint_is_rejected() {
        let engine = engine_at(d(2026, 1, 10));
        let err = engine.add_task(NewTask::new("Lost").in_sprint("missing")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "sprint", .. }));
    }

    #[test]
    fn habit_logging_is_idempotent_and_streaks() {
        let engine = engine_at(d(2026, 1, 10));
        let h = engine.create_habit("Meditate", None).unwrap();
        assert!(engine.log_habit(&h.id, Some(d(2026, 1, 9))).unwrap());
        assert!(engine.log_habit(&h.id, None).unwrap());
        assert!(!engine.log_habit(&h.id, None).unwrap());
        assert!(engine.log_habit(&h.id, Some(d(2026, 1, 11))).is_err());

        let streaks = engine.habit_streaks().unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].stats.current_streak, 2);
    }

    #[test]
    fn insights_are_cached_until_material_change() {
        let engine = engine_at(d(2026, 1, 10));
        engine.submit_check_in(NewCheckIn::new("good")).unwrap();
        engine.active_insights().unwrap();
        let first = engine.store().cached_insights().unwrap().unwrap();

        engine.create_habit("Stretch", None).unwrap();
        engine.active_insights().unwrap();
        assert_eq!(engine.store().cached_insights().unwrap().unwrap().revision, first.revision);

        engine
            .create_goal(NewGoal::new("Walk daily", Category::Health))
            .unwrap();
        engine.active_insights().unwrap();
        assert!(engine.store().cached_insights().unwrap().unwrap().revision > first.revision);
    }

    #[test]
    fn added_milestones_refresh_goal_momentum() {
        let engine = engine_at(d(2026, 1, 21));
        let created_on = d(2026, 1, 1);
        let goal = Goal {
            id: "g-run".into(),
            title: "Run a 10k".into(),
            description: None,
            category: Category::Health,
            created_on,
            target_date: Goal::target_for(created_on),
            status: GoalStatus::Active,
            milestones: vec![],
            progress: 0.0,
        };
        engine.store().insert_goal(&goal).unwrap();
        let first = engine.add_milestone(&goal.id, "First 5k", None, None).unwrap();
        engine.complete_milestone(&first.id).unwrap();

        let momentum_id = format!("goal_momentum:{}", goal.id);
        let momentum = |insights: Vec<Insight>| {
            insights
                .into_iter()
                .find(|i| i.id == momentum_id)
                .expect("momentum insight")
        };
        let ahead = momentum(engine.active_insights().unwrap());
        assert!(ahead.title.starts_with("You're ahead"), "{}", ahead.title);
        let cached = engine.store().cached_insights().unwrap().unwrap().revision;

        for n in 2..=10 {
            engine
                .add_milestone(&goal.id, &format!("Run {n}k"), None, None)
                .unwrap();
        }
        assert_eq!(engine.goal_progress(&goal.id).unwrap().status, ScheduleStatus::Behind);

        let behind = momentum(engine.active_insights().unwrap());
        assert!(engine.store().cached_insights().unwrap().unwrap().revision > cached);
        assert!(behind.title.contains("needs attention"), "{}", behind.title);
    }
}

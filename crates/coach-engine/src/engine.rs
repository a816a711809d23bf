//! The coaching engine.
//!
//! Holds at most one guidance script and one session. Every query filters
//! the script's steps by type in declaration order, checks triggers or
//! keywords against the session, and renders the first match.

use std::path::Path;

use coach_trigger::{Trigger, TriggerContext};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{CoachError, Result};
use crate::script::{GuidanceScript, GuidanceStep, ScriptInfo, ScriptLoader, StepType};
use crate::session::{ExecutionResult, SessionTracker};

static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").ok());

/// How a step's trigger was compiled at load time.
#[derive(Debug, Clone)]
enum StepTrigger {
    /// No trigger: the step always matches.
    Always,
    /// Evaluated against the session on every query.
    Compiled(Box<Trigger>),
    /// Failed to compile: the step never matches.
    Never,
}

impl StepTrigger {
    fn compile(step: &GuidanceStep, index: usize) -> Self {
        let Some(source) = step.trigger.as_deref() else {
            return Self::Always;
        };
        match Trigger::compile(source) {
            Ok(trigger) => Self::Compiled(Box::new(trigger)),
            Err(e) => {
                tracing::warn!(
                    step = index,
                    step_type = %step.step_type,
                    trigger = source,
                    error = %e,
                    "Trigger will never fire"
                );
                Self::Never
            }
        }
    }

    fn matches(&self, ctx: &TriggerContext) -> bool {
        match self {
            Self::Always => true,
            Self::Compiled(trigger) => trigger.matches(ctx),
            Self::Never => false,
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedScript {
    script: GuidanceScript,
    triggers: Vec<StepTrigger>,
}

impl LoadedScript {
    fn new(script: GuidanceScript) -> Self {
        let triggers = script
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepTrigger::compile(step, i))
            .collect();
        Self { script, triggers }
    }
}

/// Selects and renders guidance for a single coaching session.
#[derive(Debug, Clone)]
pub struct CoachingEngine {
    session: SessionTracker,
    loader: ScriptLoader,
    loaded: Option<LoadedScript>,
}

impl CoachingEngine {
    /// Creates an engine with no script loaded.
    #[must_use]
    pub fn new(session: SessionTracker) -> Self {
        Self {
            session,
            loader: ScriptLoader::default(),
            loaded: None,
        }
    }

    /// Uses `loader` for [`CoachingEngine::load_script`].
    #[must_use]
    pub fn with_loader(mut self, loader: ScriptLoader) -> Self {
        self.loader = loader;
        self
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Loads a script from `path`, replacing any loaded script.
    ///
    /// Returns `Ok(false)` if there is no script at `path`.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ScriptValidationError` carrying every violation
    /// if the script is invalid, or a load error if it cannot be read.
    pub fn load_script(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        match self.loader.load(path)? {
            Some(script) => {
                self.install(script);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Async variant of [`CoachingEngine::load_script`].
    ///
    /// # Errors
    ///
    /// Same as [`CoachingEngine::load_script`].
    pub async fn load_script_async(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        match self.loader.load_async(path).await? {
            Some(script) => {
                self.install(script);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Validates and loads a script given as JSON.
    ///
    /// `None` and JSON `null` are treated as absent and return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ScriptValidationError` if the script is invalid.
    pub fn load_value(&mut self, candidate: Option<&Value>) -> Result<bool> {
        let Some(candidate) = candidate.filter(|v| !v.is_null()) else {
            return Ok(false);
        };
        let script = self.loader.parse_value(candidate)?;
        self.install(script);
        Ok(true)
    }

    /// Validates and loads a typed script, replacing any loaded script.
    ///
    /// # Errors
    ///
    /// Returns `CoachError::ScriptValidationError` if the script is invalid.
    /// The previously loaded script stays in place.
    pub fn load(&mut self, script: GuidanceScript) -> Result<()> {
        let result = self.loader.validator().validate(&serde_json::to_value(&script)?);
        if !result.valid {
            return Err(CoachError::script_validation(result.errors));
        }
        self.install(script);
        Ok(())
    }

    fn install(&mut self, script: GuidanceScript) {
        if let Some(previous) = &self.loaded {
            tracing::info!(previous = %previous.script.id, id = %script.id, "Replacing guidance script");
        } else {
            tracing::info!(id = %script.id, steps = script.steps.len(), "Loaded guidance script");
        }
        self.loaded = Some(LoadedScript::new(script));
    }

    /// Unloads the current script, if any.
    pub fn unload(&mut self) {
        self.loaded = None;
    }

    /// Returns `true` if a script is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The loaded script.
    #[must_use]
    pub fn script(&self) -> Option<&GuidanceScript> {
        self.loaded.as_ref().map(|loaded| &loaded.script)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Metadata of the loaded script.
    #[must_use]
    pub fn script_info(&self) -> Option<ScriptInfo> {
        self.script().map(GuidanceScript::info)
    }

    /// Rendered content of the first `intro` step.
    #[must_use]
    pub fn introduction(&self) -> Option<String> {
        self.first_untriggered(StepType::Intro)
    }

    /// Rendered content of the first `pre_prompt` step.
    #[must_use]
    pub fn pre_prompt(&self) -> Option<String> {
        self.first_untriggered(StepType::PrePrompt)
    }

    /// Rendered content of the first `after_success` step.
    #[must_use]
    pub fn success_message(&self) -> Option<String> {
        self.first_untriggered(StepType::AfterSuccess)
    }

    /// Returns the first hint whose trigger holds for `code` and the current
    /// session. Counts the hint as viewed only when one is returned.
    pub fn hint(&mut self, code: &str) -> Option<String> {
        let ctx = self.session.trigger_context(code);
        let hint = self.first_triggered(StepType::Hint, &ctx)?;
        self.session.increment_hints_viewed();
        Some(hint)
    }

    /// Answers a free-text question from the `on_request` steps.
    ///
    /// Matches the first step with a keyword contained in the query,
    /// ignoring case.
    #[must_use]
    pub fn handle_request(&self, query: &str) -> Option<String> {
        let loaded = self.loaded.as_ref()?;
        let query = query.to_lowercase();

        let (index, step) = loaded.script.steps_of(StepType::OnRequest).find(|(_, step)| {
            step.keywords.iter().flatten().any(|keyword| {
                let keyword = keyword.trim().to_lowercase();
                !keyword.is_empty() && query.contains(&keyword)
            })
        })?;
        tracing::trace!(step = index, "Selected on_request step");
        Some(self.render(&loaded.script, &step.content))
    }

    /// Records an execution and returns the first matching `on_run` step.
    ///
    /// The attempt and execution are recorded before triggers are evaluated,
    /// so `attempts` already counts this run.
    pub fn process_execution(&mut self, code: &str, result: &ExecutionResult) -> Option<String> {
        self.session.record_attempt(code);
        self.session.record_execution(result);

        let ctx = self.session.trigger_context(code);
        self.first_triggered(StepType::OnRun, &ctx)
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// The session this engine reads from.
    #[must_use]
    pub const fn session(&self) -> &SessionTracker {
        &self.session
    }

    /// Mutable access to the session.
    pub fn session_mut(&mut self) -> &mut SessionTracker {
        &mut self.session
    }

    // ========================================================================
    // Selection and rendering
    // ========================================================================

    fn first_untriggered(&self, step_type: StepType) -> Option<String> {
        let loaded = self.loaded.as_ref()?;
        let (index, step) = loaded.script.steps_of(step_type).next()?;
        tracing::trace!(step = index, %step_type, "Selected step");
        Some(self.render(&loaded.script, &step.content))
    }

    fn first_triggered(&self, step_type: StepType, ctx: &TriggerContext) -> Option<String> {
        let loaded = self.loaded.as_ref()?;
        let (index, step) = loaded
            .script
            .steps_of(step_type)
            .find(|(i, _)| loaded.triggers.get(*i).is_some_and(|t| t.matches(ctx)))?;
        tracing::trace!(step = index, %step_type, attempts = ctx.attempts, "Selected step");
        Some(self.render(&loaded.script, &step.content))
    }

    fn render(&self, script: &GuidanceScript, content: &str) -> String {
        let Some(re) = &*PLACEHOLDER else {
            return content.to_string();
        };
        re.replace_all(content, |caps: &Captures<'_>| match &caps[1] {
            "title" => script.title.clone(),
            "difficulty" => script.difficulty.to_string(),
            "attempts" => self.session.attempts().to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
    }
}

impl Default for CoachingEngine {
    fn default() -> Self {
        Self::new(SessionTracker::default())
    }
}

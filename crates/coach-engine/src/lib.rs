//! Coach Engine
//!
//! Picks the next piece of pre-authored guidance for a learner. A
//! [`CoachingEngine`] owns one [`SessionTracker`] and at most one loaded
//! [`GuidanceScript`]; learner actions update the session, and queries
//! evaluate step triggers (see [`coach_trigger`]) against it.
//!
//! ```
//! use coach_engine::{CoachingEngine, ExecutionResult, GuidanceScript, SessionTracker};
//!
//! let script: GuidanceScript = serde_json::from_str(r#"{
//!     "id": "two-sum",
//!     "title": "Two Sum",
//!     "difficulty": "easy",
//!     "tags": [],
//!     "language": "python",
//!     "steps": [
//!         {"type": "intro", "content": "Hi {{title}}"},
//!         {"type": "on_run", "trigger": "stderr.length > 0", "content": "Read the error."}
//!     ]
//! }"#).unwrap();
//!
//! let mut engine = CoachingEngine::new(SessionTracker::new("two-sum"));
//! engine.load(script).unwrap();
//! assert_eq!(engine.introduction().as_deref(), Some("Hi Two Sum"));
//!
//! let result = ExecutionResult::new("", "NameError");
//! assert_eq!(engine.process_execution("print(x)", &result).as_deref(), Some("Read the error."));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod script;
pub mod session;
pub mod validator;

pub use config::{Config, CONFIG_FILE_NAME};
pub use engine::CoachingEngine;
pub use error::{CoachError, Result};
pub use script::{Difficulty, GuidanceScript, GuidanceStep, ScriptInfo, ScriptLoader, StepType};
pub use session::{ExecutionResult, SessionState, SessionTracker, TestResult};
pub use validator::{validate, ValidationResult, Validator};

pub use coach_trigger::TriggerContext;

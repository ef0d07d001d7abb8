//! syntaxdrill-core: Exercise engine, generators, and grading.
//!
//! This crate defines the exercise data model, the deterministic seed and
//! PRNG layer every generator builds on, the runtime contract sandboxed
//! interpreters implement, and the layered grading pipeline.

pub mod attempt;
pub mod error;
pub mod generators;
pub mod grading;
pub mod mock;
pub mod model;
pub mod parser;
pub mod render;
pub mod rng;
pub mod runtime;
pub mod seed;
pub mod telemetry;

pub use error::{EngineError, GradingError, VerificationError};
pub use generators::{Generator, GeneratorRegistry};
pub use grading::{GradingMethod, GradingResult};
pub use model::{
    Exercise, ExerciseKind, ExerciseSet, GeneratorParams, Language, ParamValue, RenderedExercise,
    TargetConstruct,
};
pub use render::render_exercise;
pub use runtime::{LanguageRuntime, RuntimeRegistry};
pub use seed::create_seed;

//! Application use cases / business logic

pub mod generate;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod scheduler;
pub mod select;

pub use generate::{GenerateError, GenerateUseCase};
pub use pipeline::{Pipeline, PipelineConfig};
pub use publish::{CaptionTemplate, PublishConfig, PublishCycle, PublishCycleError};
pub use render::{ImageRenderer, Template, wrap_words};
pub use scheduler::{DailySchedule, ScheduleParseError, Sleeper, Tick, TokioSleeper, run_schedule};
pub use select::{PublicationSelector, SelectError};

//! Application layer for mdt-consult
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ConsultationParams;
pub use ports::{
    consultation_event::{ConsultationEvent, EventSink, StreamTarget},
    llm_gateway::{GatewayError, LlmGateway, StreamHandle},
    round_recorder::{
        NoRoundRecorder, OutputSnapshot, ProcessSnapshot, RecordError, RoundRecord,
        RoundRecorder,
    },
};
pub use use_cases::consultation_session::{
    ConsultationSession, RoundHandle, Submission, SubmitError,
};
pub use use_cases::run_round::{
    Cancelled, RoundOutcome, RunRoundInput, RunRoundUseCase, REPLY_FAILED, SUMMARY_FAILED,
};

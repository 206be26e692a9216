//! Multi-step property listing wizard

pub mod controller;
pub mod draft;
pub mod payload;
pub mod review;
pub mod sections;
pub mod step;
pub mod submission;
pub mod validation;

pub use controller::{StepState, WizardController, WizardError};
pub use draft::{DraftPersistence, DraftRecord, SaveStatus, DEFAULT_DEBOUNCE, DRAFT_KEY};
pub use payload::FormPayload;
pub use step::{StepStatus, WizardStep};
pub use submission::{
    SimulatedSubmission, Submission, SubmissionError, SubmissionMode, SubmissionReceipt,
    SubmissionRequest,
};
pub use validation::{validate, FieldError, ValidationErrorSet};

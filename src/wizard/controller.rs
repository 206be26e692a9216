//! Wizard controller: step transitions, field updates and submission

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::draft::{DraftPersistence, SaveStatus};
use super::payload::FormPayload;
use super::sections::MediaSection;
use super::step::{StepStatus, WizardStep};
use super::submission::{
    Submission, SubmissionError, SubmissionMode, SubmissionReceipt, SubmissionRequest,
};
use super::validation::{validate, ValidationErrorSet};
use crate::session::Session;

/// Errors from misusing the controller
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("sign in to create or edit listings")]
    Unauthenticated,

    #[error("there is no step {0}; steps are numbered 1 to 5")]
    InvalidStep(u8),

    #[error("step {requested} is ahead of the current step {current}")]
    StepUnreachable { requested: u8, current: u8 },

    #[error("submission is only available from the review step")]
    NotOnReview,

    #[error("this listing has already been submitted")]
    AlreadySubmitted,

    #[error("there is no image at position {0}")]
    ImageOutOfRange(usize),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Active step, accumulated payload and the errors from the last blocked advance
#[derive(Debug, Clone)]
pub struct StepState {
    pub step: WizardStep,
    pub payload: FormPayload,
    pub errors: ValidationErrorSet,
    pub complete: bool,
}

impl StepState {
    fn new(payload: FormPayload) -> Self {
        Self {
            step: WizardStep::FIRST,
            payload,
            errors: ValidationErrorSet::new(),
            complete: false,
        }
    }
}

/// Resets the in-flight flag even if the submit future is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives one listing through the five steps.
///
/// All methods take `&self`; the step state lock is never held across an
/// await, so a second `submit` can observe the first one in flight.
pub struct WizardController {
    session: Session,
    mode: SubmissionMode,
    state: Mutex<StepState>,
    draft: DraftPersistence,
    submitter: Arc<dyn Submission>,
    submitting: AtomicBool,
}

impl WizardController {
    /// Start a new listing, restoring a saved draft if there is one
    pub fn create(
        session: Session,
        draft: DraftPersistence,
        submitter: Arc<dyn Submission>,
    ) -> Result<Self, WizardError> {
        let payload = match draft.load_existing() {
            Some(record) => {
                tracing::info!(fields = record.payload.len(), "Restored listing draft");
                record.payload
            }
            None => FormPayload::new(),
        };
        Self::start(session, SubmissionMode::Create, payload, draft, submitter)
    }

    /// Edit an existing listing. Stored drafts are ignored in this mode.
    pub fn edit(
        session: Session,
        listing_id: impl Into<String>,
        existing: FormPayload,
        draft: DraftPersistence,
        submitter: Arc<dyn Submission>,
    ) -> Result<Self, WizardError> {
        let mode = SubmissionMode::Edit {
            id: listing_id.into(),
        };
        Self::start(session, mode, existing, draft, submitter)
    }

    fn start(
        session: Session,
        mode: SubmissionMode,
        payload: FormPayload,
        draft: DraftPersistence,
        submitter: Arc<dyn Submission>,
    ) -> Result<Self, WizardError> {
        if !session.is_authenticated() {
            return Err(WizardError::Unauthenticated);
        }

        tracing::debug!(mode = ?mode, role = session.role().as_str(), "Wizard started");
        Ok(Self {
            session,
            mode,
            state: Mutex::new(StepState::new(payload)),
            draft,
            submitter,
            submitting: AtomicBool::new(false),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, StepState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Read accessors ─────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> &SubmissionMode {
        &self.mode
    }

    pub fn current_step(&self) -> WizardStep {
        self.lock_state().step
    }

    pub fn payload(&self) -> FormPayload {
        self.lock_state().payload.clone()
    }

    pub fn errors(&self) -> ValidationErrorSet {
        self.lock_state().errors.clone()
    }

    /// Snapshot of the whole step state
    pub fn snapshot(&self) -> StepState {
        self.lock_state().clone()
    }

    pub fn step_status(&self, step: WizardStep) -> StepStatus {
        step.status_relative_to(self.current_step())
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.lock_state().complete
    }

    pub fn save_status(&self) -> SaveStatus {
        self.draft.status()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.draft.last_saved()
    }

    // ─── Editing ────────────────────────────────────────────────────────────

    /// Set one field, clear its error and schedule a draft save
    pub fn update_field(&self, name: &str, value: Value) {
        let mut fields = Map::new();
        fields.insert(name.to_string(), value);
        self.update_fields(fields);
    }

    /// Apply a partial update, clearing the error of every touched field
    pub fn update_fields(&self, fields: Map<String, Value>) {
        let snapshot = {
            let mut state = self.lock_state();
            if state.complete {
                tracing::debug!("Ignoring edit after submission");
                return;
            }
            for (name, value) in fields {
                state.errors.clear_field(&name);
                state.payload.set(&name, value);
            }
            state.payload.clone()
        };
        self.draft.schedule(&snapshot);
    }

    /// Add the amenity if absent, remove it otherwise
    pub fn toggle_amenity(&self, amenity: &str) {
        let mut amenities: Vec<Value> = self
            .lock_state()
            .payload
            .get("amenities")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let before = amenities.len();
        amenities.retain(|a| a.as_str() != Some(amenity));
        if amenities.len() == before {
            amenities.push(Value::String(amenity.to_string()));
        }
        self.update_field("amenities", Value::Array(amenities));
    }

    pub fn add_images(&self, urls: Vec<String>) {
        let mut media = self.media();
        media.add_images(urls);
        self.store_media(&media);
    }

    pub fn remove_image(&self, index: usize) -> Result<(), WizardError> {
        let mut media = self.media();
        if !media.remove_image(index) {
            return Err(WizardError::ImageOutOfRange(index));
        }
        self.store_media(&media);
        Ok(())
    }

    pub fn set_primary_image(&self, index: usize) -> Result<(), WizardError> {
        let mut media = self.media();
        if !media.set_primary(index) {
            return Err(WizardError::ImageOutOfRange(index));
        }
        self.store_media(&media);
        Ok(())
    }

    pub fn reorder_image(&self, from: usize, to: usize) -> Result<(), WizardError> {
        let mut media = self.media();
        if !media.reorder(from, to) {
            return Err(WizardError::ImageOutOfRange(from.max(to)));
        }
        self.store_media(&media);
        Ok(())
    }

    fn media(&self) -> MediaSection {
        self.lock_state()
            .payload
            .section::<MediaSection>()
            .unwrap_or_default()
    }

    fn store_media(&self, media: &MediaSection) {
        let mut fields = Map::new();
        fields.insert(
            "images".to_string(),
            Value::Array(media.images.iter().cloned().map(Value::String).collect()),
        );
        fields.insert(
            "primaryImageIndex".to_string(),
            Value::from(media.primary_image_index),
        );
        self.update_fields(fields);
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    /// Validate the current step and advance on success.
    ///
    /// On failure the errors are kept for display and returned; the step
    /// does not change.
    pub fn go_next(&self) -> Result<WizardStep, ValidationErrorSet> {
        let mut state = self.lock_state();
        let errors = validate(state.step, &state.payload);
        if !errors.is_empty() {
            tracing::debug!(step = state.step.index(), errors = errors.len(), "Advance blocked");
            state.errors = errors.clone();
            return Err(errors);
        }

        state.step = state.step.next();
        tracing::debug!(step = state.step.index(), "Advanced");
        Ok(state.step)
    }

    /// Step back without validating; stays on the first step
    pub fn go_previous(&self) -> WizardStep {
        let mut state = self.lock_state();
        state.step = state.step.previous();
        state.step
    }

    /// Jump to a step already reached, or back to the first one
    pub fn jump_to(&self, index: u8) -> Result<WizardStep, WizardError> {
        let target = WizardStep::from_index(index).ok_or(WizardError::InvalidStep(index))?;

        let mut state = self.lock_state();
        if target <= state.step || target == WizardStep::FIRST {
            state.step = target;
            Ok(target)
        } else {
            Err(WizardError::StepUnreachable {
                requested: index,
                current: state.step.index(),
            })
        }
    }

    // ─── Submission ─────────────────────────────────────────────────────────

    /// Hand the payload to the submission backend.
    ///
    /// Only one submission runs at a time. Success deletes the draft and
    /// completes the wizard; failure leaves everything as it was so the user
    /// can retry.
    pub async fn submit(&self) -> Result<SubmissionReceipt, WizardError> {
        let request = {
            let state = self.lock_state();
            if state.complete {
                return Err(WizardError::AlreadySubmitted);
            }
            if state.step != WizardStep::Review {
                return Err(WizardError::NotOnReview);
            }
            if self
                .submitting
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Err(SubmissionError::InFlight.into());
            }
            SubmissionRequest {
                mode: self.mode.clone(),
                payload: state.payload.clone(),
            }
        };
        let _in_flight = InFlightGuard(&self.submitting);

        tracing::info!(backend = self.submitter.name(), mode = ?self.mode, "Submitting listing");
        match self.submitter.submit(&request).await {
            Ok(receipt) => {
                self.draft.clear();
                self.lock_state().complete = true;
                tracing::info!(listing_id = %receipt.listing_id, "Listing submitted");
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Listing submission failed");
                Err(e.into())
            }
        }
    }

    /// Write any pending draft before the controller goes away
    pub fn close(&self) {
        if !self.is_complete() {
            self.draft.flush();
        }
    }
}

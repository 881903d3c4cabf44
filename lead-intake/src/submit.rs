//! Submission coordinator
//!
//! Owns one [`LeadForm`] and its [`SubmissionState`]. A submit call validates
//! the form, moves to `Submitting`, sends exactly one request and maps the
//! outcome back onto the form:
//!
//! - success: the form is reset (fields, files, previews) and the completion
//!   callback runs
//! - failure: the form is left exactly as it was so the user can retry
//!
//! Calls made while a request is in flight are ignored. Locks are never held
//! across the transport await. A submit future dropped before the reply
//! arrives puts the coordinator back to `Idle` with the form untouched.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::attachments::AdmissionError;
use crate::client::Transport;
use crate::forms::LeadForm;
use crate::notify::{Notice, Notifier};
use crate::payload::MultipartPayload;
use crate::types::{RawFile, SubmissionState, ValidationErrorMap};

const SUBMITTING: &str = "Submitting your request...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Another submission was already in flight
    Ignored,
    Invalid { errors: ValidationErrorMap },
    Succeeded { message: String },
    Failed { message: String },
}

type Callback = Box<dyn Fn() + Send + Sync>;

/// Holds `Submitting` for one request; dropping it unfinished returns to `Idle`
struct InFlight<'a> {
    state: &'a Mutex<SubmissionState>,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn finish(mut self, next: SubmissionState) {
        *self.state.lock() = next;
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.state.lock();
        if *state == SubmissionState::Submitting {
            warn!("Submission abandoned before a reply arrived");
            *state = SubmissionState::Idle;
        }
    }
}

pub struct SubmissionCoordinator<T, N> {
    form: Mutex<LeadForm>,
    state: Mutex<SubmissionState>,
    transport: T,
    notifier: N,
    on_complete: Option<Callback>,
}

impl<T: Transport, N: Notifier> SubmissionCoordinator<T, N> {
    pub fn new(form: LeadForm, transport: T, notifier: N) -> Self {
        Self {
            form: Mutex::new(form),
            state: Mutex::new(SubmissionState::Idle),
            transport,
            notifier,
            on_complete: None,
        }
    }

    /// Run `callback` after every successful submission
    pub fn on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state.lock().clone()
    }

    /// Back to `Idle` once the outcome has been shown; no effect mid-flight
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.is_terminal() {
            *state = SubmissionState::Idle;
        }
    }

    pub fn set_field(&self, name: &str, value: &str) {
        self.form.lock().set_field(name, value);
    }

    /// Stage a file; a rejection is shown as an error notice and nothing is staged
    pub fn admit(&self, slot: &str, raw: RawFile) -> Result<(), AdmissionError> {
        let result = self.form.lock().admit(slot, raw).map(|_| ());
        if let Err(err) = &result {
            self.notifier.notify(Notice::error(err.to_string()));
        }
        result
    }

    pub fn remove_attachment(&self, slot: &str, index: usize) -> Option<RawFile> {
        self.form.lock().remove_attachment(slot, index)
    }

    /// Read or edit the form under its lock
    pub fn with_form<R>(&self, f: impl FnOnce(&mut LeadForm) -> R) -> R {
        f(&mut self.form.lock())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let (endpoint, payload) = {
            let mut state = self.state.lock();
            match *state {
                SubmissionState::Submitting => {
                    debug!("Submission already in flight, ignoring");
                    return SubmitOutcome::Ignored;
                }
                SubmissionState::Succeeded | SubmissionState::Failed(_) => *state = SubmissionState::Idle,
                SubmissionState::Idle => {}
            }

            let mut form = self.form.lock();
            let errors = form.validate();
            if !errors.is_empty() {
                debug!("Form has {} invalid field(s), not submitting", errors.len());
                return SubmitOutcome::Invalid { errors: errors.clone() };
            }

            *state = SubmissionState::Submitting;
            debug!("Sending {} file(s) to {}", form.attachments().total(), form.schema().endpoint());
            (form.schema().endpoint().to_string(), MultipartPayload::from_form(&form))
        };
        let in_flight = InFlight {
            state: &self.state,
            finished: false,
        };

        self.notifier.notify(Notice::loading(SUBMITTING));

        match self.transport.post_multipart(&endpoint, payload).await {
            Ok(receipt) => {
                let message = {
                    let mut form = self.form.lock();
                    form.reset();
                    form.schema().success_message().to_string()
                };
                in_flight.finish(SubmissionState::Succeeded);
                info!("Submitted {} ({})", endpoint, receipt.status);

                self.notifier.notify(Notice::success(message.clone()));
                if let Some(callback) = &self.on_complete {
                    callback();
                }
                SubmitOutcome::Succeeded { message }
            }
            Err(err) => {
                warn!(status = ?err.status(), "Submission to {} failed: {}", endpoint, err);
                let message = err.user_message();
                in_flight.finish(SubmissionState::Failed(message.clone()));

                self.notifier.notify(Notice::error(message.clone()));
                SubmitOutcome::Failed { message }
            }
        }
    }
}

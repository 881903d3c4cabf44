//! Lead-capture forms for the medical-tourism site
//!
//! Every form (consultation, partnership, service inquiry, review, cultural
//! support) runs the same protocol:
//! 1. files are staged per slot with type/size/count checks and image previews
//! 2. fields and required slots are validated into a field-keyed error map
//! 3. a valid form is sent once as multipart data to its intake endpoint
//! 4. the outcome is shown as a notice; success clears the form, failure keeps it

pub mod attachments;
pub mod client;
pub mod config;
pub mod countries;
pub mod error;
pub mod forms;
pub mod notify;
pub mod payload;
pub mod submit;
pub mod types;
pub mod validate;

pub use attachments::{AdmissionError, AttachmentPolicy, AttachmentStager, ObjectUrlRegistry, PreviewHost};
pub use client::{IntakeClient, Transport};
pub use config::Config;
pub use error::IntakeError;
pub use forms::{FormKind, FormSchema, LeadForm, ServiceVariant};
pub use notify::{Notice, NoticeLog, Notifier, TracingNotifier};
pub use submit::{SubmissionCoordinator, SubmitOutcome};
pub use types::{FormFieldSet, RawFile, StagedFile, SubmissionState, ValidationErrorMap};

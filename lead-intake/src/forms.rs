//! Form schemas and form instances
//!
//! Every lead form on the site is the same machine with a different schema:
//! a list of field rules, a list of attachment slots, some fixed hidden parts
//! and the intake endpoint. [`FormKind::schema`] holds the presets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attachments::{AdmissionError, AttachmentPolicy, AttachmentStager, Attachments, PreviewHost};
use crate::types::{FormFieldSet, RawFile, StagedFile, ValidationErrorMap};
use crate::validate::{self, FieldKind, FieldRule, PhonePolicy};

const DEFAULT_SUCCESS: &str = "Thank you! Our team will get back to you shortly.";

/// Every preset uses the same phone rule; the country code is a separate field
const PHONE: PhonePolicy = PhonePolicy::MinDigits(7);

// ==================== Slots ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSlot {
    name: String,
    label: String,
    policy: AttachmentPolicy,
    required: Option<String>,
}

impl FileSlot {
    pub fn new(name: impl Into<String>, label: impl Into<String>, policy: AttachmentPolicy) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            policy,
            required: None,
        }
    }

    /// At least one file must be staged; `message` is shown when none is
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    pub fn required_message(&self) -> Option<&str> {
        self.required.as_deref()
    }

    /// Single-file slots post under their own name, multi-file slots as `name[]`
    pub fn part_name(&self) -> String {
        if self.policy.max_files() == 1 {
            self.name.clone()
        } else {
            format!("{}[]", self.name)
        }
    }
}

// ==================== Schema ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    kind: FormKind,
    endpoint: String,
    fields: Vec<FieldRule>,
    slots: Vec<FileSlot>,
    fixed: Vec<(String, String)>,
    success_message: String,
}

impl FormSchema {
    /// `endpoint` is a path, resolved against the configured base URL
    pub fn builder(kind: FormKind, endpoint: impl Into<String>) -> FormSchemaBuilder {
        FormSchemaBuilder {
            schema: FormSchema {
                kind,
                endpoint: endpoint.into(),
                fields: Vec::new(),
                slots: Vec::new(),
                fixed: Vec::new(),
                success_message: DEFAULT_SUCCESS.to_string(),
            },
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn slots(&self) -> &[FileSlot] {
        &self.slots
    }

    pub fn fixed(&self) -> &[(String, String)] {
        &self.fixed
    }

    pub fn success_message(&self) -> &str {
        &self.success_message
    }

    pub fn slot(&self, name: &str) -> Option<&FileSlot> {
        self.slots.iter().find(|s| s.name == name)
    }
}

pub struct FormSchemaBuilder {
    schema: FormSchema,
}

impl FormSchemaBuilder {
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.schema.fields.push(rule);
        self
    }

    pub fn slot(mut self, slot: FileSlot) -> Self {
        self.schema.slots.push(slot);
        self
    }

    /// Hidden text part sent with every submission
    pub fn fixed(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.schema.fixed.push((name.into(), value.into()));
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.schema.success_message = message.into();
        self
    }

    pub fn build(self) -> FormSchema {
        self.schema
    }
}

// ==================== Presets ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceVariant {
    TreatmentPlanning,
    VisaTravel,
    Accommodation,
    AirportTransfer,
    PostTreatmentCare,
}

impl ServiceVariant {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::TreatmentPlanning => "treatment-planning",
            Self::VisaTravel => "visa-travel",
            Self::Accommodation => "accommodation",
            Self::AirportTransfer => "airport-transfer",
            Self::PostTreatmentCare => "post-treatment-care",
        }
    }

    fn slot(&self) -> Option<FileSlot> {
        match self {
            Self::TreatmentPlanning => Some(
                FileSlot::new("medicalReports", "Medical reports", AttachmentPolicy::new(5))
                    .required("Please upload at least one medical report"),
            ),
            Self::VisaTravel => Some(
                FileSlot::new("passport", "Passport scan", AttachmentPolicy::new(1))
                    .required("Please upload a scan of your passport"),
            ),
            Self::PostTreatmentCare => {
                Some(FileSlot::new("medicalReports", "Discharge summary", AttachmentPolicy::new(3)))
            }
            Self::Accommodation | Self::AirportTransfer => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Consultation,
    Collaborate,
    ServiceInquiry(ServiceVariant),
    Review,
    CulturalSupport,
}

pub const PARTNERSHIP_TYPES: &[&str] = &["Hospital", "Clinic", "Travel agency", "Insurance", "Other"];

pub const SUPPORT_LANGUAGES: &[&str] = &[
    "Arabic", "Bengali", "English", "French", "Russian", "Swahili", "Amharic", "Uzbek", "Dari",
];

impl FormKind {
    pub fn schema(self) -> FormSchema {
        match self {
            Self::Consultation => FormSchema::builder(self, "/api/consultations")
                .field(FieldRule::person_name("name", "Full name"))
                .field(FieldRule::email("email"))
                .field(FieldRule::phone("phone", PHONE))
                .field(FieldRule::new("countryCode", "Country code", FieldKind::CountryCode).optional())
                .field(FieldRule::text("message", "Message", 0))
                .slot(FileSlot::new("reports", "Medical reports", AttachmentPolicy::new(5)))
                .success_message("Consultation request sent! Our medical team will contact you within 24 hours.")
                .build(),

            Self::Collaborate => FormSchema::builder(self, "/api/collaborate")
                .field(FieldRule::text("organization", "Organization", 2))
                .field(FieldRule::person_name("name", "Contact name"))
                .field(FieldRule::email("email"))
                .field(FieldRule::phone("phone", PHONE))
                .field(FieldRule::choice("partnershipType", "Partnership type", PARTNERSHIP_TYPES.iter().copied()))
                .field(FieldRule::text("message", "Message", 10))
                .slot(FileSlot::new("documents", "Company documents", AttachmentPolicy::new(3)))
                .success_message("Thanks for reaching out! Our partnerships team will be in touch.")
                .build(),

            Self::ServiceInquiry(variant) => {
                let builder = FormSchema::builder(self, "/api/service-inquiries")
                    .fixed("service", variant.slug())
                    .field(FieldRule::person_name("name", "Full name"))
                    .field(FieldRule::email("email"))
                    .field(FieldRule::phone("phone", PHONE))
                    .field(FieldRule::new("countryCode", "Country code", FieldKind::CountryCode).optional())
                    .field(FieldRule::text("message", "Message", 0));
                let builder = match variant.slot() {
                    Some(slot) => builder.slot(slot),
                    None => builder,
                };
                builder.build()
            }

            Self::Review => FormSchema::builder(self, "/api/reviews")
                .field(FieldRule::person_name("name", "Name"))
                .field(FieldRule::email("email"))
                .field(FieldRule::text("country", "Country", 0).optional())
                .field(FieldRule::new("rating", "Rating", FieldKind::Rating { min: 1, max: 5 }))
                .field(FieldRule::text("message", "Review", 10))
                .slot(FileSlot::new("photo", "Photo", AttachmentPolicy::images_only(1)))
                .success_message("Thank you for your review! It will appear once approved.")
                .build(),

            Self::CulturalSupport => FormSchema::builder(self, "/api/cultural-support")
                .field(FieldRule::person_name("name", "Full name"))
                .field(FieldRule::email("email"))
                .field(FieldRule::phone("phone", PHONE))
                .field(FieldRule::choice("language", "Language", SUPPORT_LANGUAGES.iter().copied()))
                .field(FieldRule::text("message", "Message", 0))
                .build(),
        }
    }
}

// ==================== Form instance ====================

/// One form on one page: its schema, what the user typed and attached,
/// and the result of the last validation pass
#[derive(Debug)]
pub struct LeadForm {
    schema: FormSchema,
    fields: FormFieldSet,
    attachments: Attachments,
    errors: ValidationErrorMap,
}

impl LeadForm {
    pub fn new(schema: FormSchema, previews: Arc<dyn PreviewHost>) -> Self {
        let mut attachments = Attachments::new();
        for slot in schema.slots() {
            attachments.add_slot(slot.name(), AttachmentStager::new(slot.policy().clone(), previews.clone()));
        }
        Self {
            schema,
            fields: FormFieldSet::new(),
            attachments,
            errors: ValidationErrorMap::new(),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.set(name, value);
    }

    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &FormFieldSet {
        &self.fields
    }

    pub fn admit(&mut self, slot: &str, raw: RawFile) -> Result<&StagedFile, AdmissionError> {
        self.attachments.admit(slot, raw)
    }

    pub fn remove_attachment(&mut self, slot: &str, index: usize) -> Option<RawFile> {
        self.attachments.remove(slot, index)
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    /// Revalidate everything and replace the stored error map
    pub fn validate(&mut self) -> &ValidationErrorMap {
        self.errors = validate::validate(&self.schema, &self.fields, &self.attachments);
        &self.errors
    }

    pub fn errors(&self) -> &ValidationErrorMap {
        &self.errors
    }

    pub fn reset(&mut self) {
        self.fields.clear();
        self.attachments.clear();
        self.errors = ValidationErrorMap::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::ObjectUrlRegistry;

    fn form(kind: FormKind) -> (LeadForm, Arc<ObjectUrlRegistry>) {
        let registry = Arc::new(ObjectUrlRegistry::new());
        (LeadForm::new(kind.schema(), registry.clone()), registry)
    }

    #[test]
    fn part_names_follow_slot_capacity() {
        let schema = FormKind::Consultation.schema();
        assert_eq!(schema.slot("reports").unwrap().part_name(), "reports[]");

        let visa = FormKind::ServiceInquiry(ServiceVariant::VisaTravel).schema();
        assert_eq!(visa.slot("passport").unwrap().part_name(), "passport");
    }

    #[test]
    fn service_inquiry_carries_its_slug() {
        let schema = FormKind::ServiceInquiry(ServiceVariant::AirportTransfer).schema();
        assert_eq!(schema.fixed(), &[("service".to_string(), "airport-transfer".to_string())]);
        assert!(schema.slots().is_empty());
        assert_eq!(schema.endpoint(), "/api/service-inquiries");
    }

    #[test]
    fn review_photo_is_images_only() {
        let (mut form, registry) = form(FormKind::Review);
        let err = form
            .admit("photo", RawFile::new("review.pdf", "application/pdf", vec![0u8; 8]))
            .unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidType { .. }));

        form.admit("photo", RawFile::new("me.png", "image/png", vec![0u8; 8])).unwrap();
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn reset_clears_fields_files_and_errors() {
        let (mut form, registry) = form(FormKind::Consultation);
        form.set_field("name", "John Doe");
        form.admit("reports", RawFile::new("xray.png", "image/png", vec![0u8; 8])).unwrap();
        assert!(!form.validate().is_empty());

        form.reset();
        assert!(form.fields().is_empty());
        assert_eq!(form.attachments().total(), 0);
        assert!(form.errors().is_empty());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn form_kind_serializes_kebab_case() {
        let kind: FormKind = serde_json::from_str(r#"{"service-inquiry":"visa-travel"}"#).unwrap();
        assert_eq!(kind, FormKind::ServiceInquiry(ServiceVariant::VisaTravel));
        let kind: FormKind = serde_json::from_str(r#""cultural-support""#).unwrap();
        assert_eq!(kind, FormKind::CulturalSupport);
    }

    #[test]
    fn builder_accepts_custom_schemas() {
        let schema = FormSchema::builder(FormKind::Consultation, "/api/consultations")
            .field(FieldRule::phone("phone", PhonePolicy::ExactDigits(10)))
            .success_message("ok")
            .build();
        assert_eq!(schema.fields().len(), 1);
        assert_eq!(schema.success_message(), "ok");
    }
}

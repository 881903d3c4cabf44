//! Multipart body assembled from a form at submit time

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::error::IntakeError;
use crate::forms::LeadForm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// Snapshot of a form, independent of the transport that sends it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub text: Vec<TextPart>,
    pub files: Vec<FilePart>,
}

impl MultipartPayload {
    /// Fixed parts first, then every schema field (trimmed), then files in slot order
    pub fn from_form(form: &LeadForm) -> Self {
        let schema = form.schema();
        let mut payload = Self::default();

        for (name, value) in schema.fixed() {
            payload.push_text(name, value);
        }
        for rule in schema.fields() {
            payload.push_text(&rule.name, form.field(&rule.name).trim());
        }

        for slot in schema.slots() {
            let Some(stager) = form.attachments().slot(slot.name()) else {
                continue;
            };
            let part_name = slot.part_name();
            for staged in stager.files() {
                let raw = staged.raw();
                payload.files.push(FilePart {
                    name: part_name.clone(),
                    file_name: raw.name.clone(),
                    mime_type: raw.mime_type.clone(),
                    data: raw.data.clone(),
                });
            }
        }

        payload
    }

    pub fn push_text(&mut self, name: &str, value: &str) {
        self.text.push(TextPart {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.text.iter().find(|p| p.name == name).map(|p| p.value.as_str())
    }

    pub fn into_form(self) -> Result<Form, IntakeError> {
        let mut form = Form::new();
        for part in self.text {
            form = form.text(part.name, part.value);
        }
        for file in self.files {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .map_err(|source| IntakeError::InvalidPart {
                    part: file.name.clone(),
                    source,
                })?;
            form = form.part(file.name, part);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::ObjectUrlRegistry;
    use crate::forms::{FormKind, ServiceVariant};
    use crate::types::RawFile;
    use std::sync::Arc;

    #[test]
    fn multi_file_slot_uses_bracketed_names() {
        let mut form = LeadForm::new(FormKind::Consultation.schema(), Arc::new(ObjectUrlRegistry::new()));
        form.set_field("name", "  John Doe ");
        form.admit("reports", RawFile::new("mri.pdf", "application/pdf", vec![1u8; 4])).unwrap();
        form.admit("reports", RawFile::new("xray.png", "image/png", vec![2u8; 4])).unwrap();

        let payload = MultipartPayload::from_form(&form);
        assert_eq!(payload.text_value("name"), Some("John Doe"));
        assert_eq!(payload.text_value("email"), Some(""));
        let names: Vec<_> = payload.files.iter().map(|f| (f.name.as_str(), f.file_name.as_str())).collect();
        assert_eq!(names, vec![("reports[]", "mri.pdf"), ("reports[]", "xray.png")]);
    }

    #[test]
    fn single_slot_and_fixed_parts() {
        let mut form = LeadForm::new(
            FormKind::ServiceInquiry(ServiceVariant::VisaTravel).schema(),
            Arc::new(ObjectUrlRegistry::new()),
        );
        form.admit("passport", RawFile::new("passport.jpg", "image/jpeg", vec![0u8; 4])).unwrap();

        let payload = MultipartPayload::from_form(&form);
        assert_eq!(payload.text[0].name, "service");
        assert_eq!(payload.text_value("service"), Some("visa-travel"));
        assert_eq!(payload.files.len(), 1);
        assert_eq!(payload.files[0].name, "passport");
        assert_eq!(payload.files[0].mime_type, "image/jpeg");
    }

    #[test]
    fn bad_mime_type_is_reported_by_part() {
        let payload = MultipartPayload {
            text: Vec::new(),
            files: vec![FilePart {
                name: "photo".into(),
                file_name: "a.png".into(),
                mime_type: "not a mime".into(),
                data: Bytes::from_static(b"x"),
            }],
        };
        match payload.into_form() {
            Err(IntakeError::InvalidPart { part, .. }) => assert_eq!(part, "photo"),
            other => panic!("expected InvalidPart, got {other:?}"),
        }
    }
}

//! Input/output documents of the `lead-intake` binary

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lead_intake::attachments::AdmissionError;
use lead_intake::countries::{self, Country};
use lead_intake::notify::Notice;
use lead_intake::types::{GalleryImage, Review};
use lead_intake::{FormKind, FormSchema, Notifier, RawFile, SubmissionCoordinator, SubmitOutcome, Transport};

/// One action per invocation, read from stdin
#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
pub enum Input {
    /// Fill a form, stage its files and submit it
    Submit(SubmitInput),
    ListReviews(ListInput),
    ListGallery(ListInput),
    SearchCountries(SearchCountriesInput),
}

#[derive(Debug, Deserialize)]
pub struct SubmitInput {
    pub form: FormKind,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Slot name to file paths
    #[serde(default)]
    pub files: BTreeMap<String, Vec<PathBuf>>,
}

#[derive(Debug, Deserialize)]
pub struct ListInput {}

#[derive(Debug, Deserialize)]
pub struct SearchCountriesInput {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
    Submit(SubmitOutput),
    Reviews(ListOutput<Review>),
    Gallery(ListOutput<GalleryImage>),
    Countries(ListOutput<&'static Country>),
}

#[derive(Debug, Serialize)]
pub struct SubmitOutput {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct ListOutput<T> {
    pub success: bool,
    pub data: Vec<T>,
}

impl<T> ListOutput<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// MIME type from the file extension, as a browser would report it
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Read a file for upload, refusing it before reading when it exceeds `limit` bytes
pub fn load_file(path: &Path, limit: u64) -> Result<RawFile, Box<dyn std::error::Error>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let size_bytes = std::fs::metadata(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
        .len();
    if size_bytes > limit {
        return Err(AdmissionError::TooLarge { name, size_bytes, limit }.into());
    }

    let data = std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(RawFile::new(name, mime_for_path(path), data))
}

/// Load and stage every requested file; the first one that cannot be
/// attached aborts, so a lead is never sent without it
pub fn stage_files<T: Transport, N: Notifier>(
    coordinator: &SubmissionCoordinator<T, N>,
    schema: &FormSchema,
    files: &BTreeMap<String, Vec<PathBuf>>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (slot_name, paths) in files {
        let slot = schema
            .slot(slot_name)
            .ok_or_else(|| AdmissionError::UnknownSlot(slot_name.clone()))?;
        for path in paths {
            let raw = load_file(path, slot.policy().file_limit_bytes())
                .map_err(|e| format!("{}: {}", slot.label(), e))?;
            coordinator
                .admit(slot_name, raw)
                .map_err(|e| format!("{}: {}", slot.label(), e))?;
        }
    }
    Ok(())
}

/// `countryCode` may be given as an ISO code (`IN`); the form expects the dial code
pub fn field_value(name: &str, value: &str) -> String {
    if name == "countryCode" && !countries::is_known_dial_code(value) {
        if let Some(country) = countries::by_iso(value) {
            return country.dial_code.to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_intake::{Config, IntakeClient, LeadForm, NoticeLog, ObjectUrlRegistry};
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn submit_input_parses() {
        let input: Input = serde_json::from_str(
            r#"{
                "action": "Submit",
                "form": {"service-inquiry": "visa-travel"},
                "fields": {"name": "Fatima Bello"},
                "files": {"passport": ["/tmp/passport.pdf"]}
            }"#,
        )
        .unwrap();
        match input {
            Input::Submit(submit) => {
                assert_eq!(submit.fields["name"], "Fatima Bello");
                assert_eq!(submit.files["passport"], vec![PathBuf::from("/tmp/passport.pdf")]);
            }
            other => panic!("expected Submit, got {other:?}"),
        }
    }

    #[test]
    fn list_actions_need_no_body() {
        let input: Input = serde_json::from_str(r#"{"action":"ListGallery"}"#).unwrap();
        assert!(matches!(input, Input::ListGallery(_)));
    }

    #[test]
    fn mime_types_from_extensions() {
        assert_eq!(mime_for_path(Path::new("scan.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("report.docx")), lead_intake::attachments::DEFAULT_ALLOWED_TYPES[6]);
        assert_eq!(mime_for_path(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn load_file_reads_name_type_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mri.pdf");
        std::fs::File::create(&path).unwrap().write_all(b"%PDF-1.7").unwrap();

        let raw = load_file(&path, 1024).unwrap();
        assert_eq!(raw.name, "mri.pdf");
        assert_eq!(raw.mime_type, "application/pdf");
        assert_eq!(raw.size_bytes(), 8);
        assert!(load_file(&dir.path().join("missing.pdf"), 1024).is_err());
    }

    #[test]
    fn oversized_file_is_refused_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::File::create(&path).unwrap().write_all(&[0u8; 64]).unwrap();

        let err = load_file(&path, 32).unwrap_err();
        assert_eq!(err.to_string(), "scan.png is larger than 0 MB");
        let admission = err.downcast_ref::<AdmissionError>().unwrap();
        assert!(matches!(admission, AdmissionError::TooLarge { size_bytes: 64, limit: 32, .. }));
    }

    /// The client is never called; staging stops before submit
    fn review_coordinator() -> (SubmissionCoordinator<IntakeClient, Arc<NoticeLog>>, FormSchema) {
        let schema = FormKind::Review.schema();
        let form = LeadForm::new(schema.clone(), Arc::new(ObjectUrlRegistry::new()));
        let client = IntakeClient::new(Config::new("http://127.0.0.1:9").unwrap());
        (SubmissionCoordinator::new(form, client, Arc::new(NoticeLog::new())), schema)
    }

    #[test]
    fn rejected_file_aborts_staging() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("smile.png");
        let notes = dir.path().join("notes.pdf");
        std::fs::File::create(&photo).unwrap().write_all(&[1u8; 16]).unwrap();
        std::fs::File::create(&notes).unwrap().write_all(b"%PDF-1.7").unwrap();
        let (coordinator, schema) = review_coordinator();

        let files = BTreeMap::from([("photo".to_string(), vec![notes])]);
        let err = stage_files(&coordinator, &schema, &files).unwrap_err();
        assert!(err.to_string().contains("notes.pdf is not a supported file type"), "{err}");
        coordinator.with_form(|form| assert_eq!(form.attachments().count("photo"), 0));

        let files = BTreeMap::from([("photo".to_string(), vec![photo])]);
        stage_files(&coordinator, &schema, &files).unwrap();
        coordinator.with_form(|form| assert_eq!(form.attachments().count("photo"), 1));
    }

    #[test]
    fn unknown_slot_aborts_staging() {
        let (coordinator, schema) = review_coordinator();
        let files = BTreeMap::from([("passport".to_string(), vec![PathBuf::from("/tmp/p.pdf")])]);
        let err = stage_files(&coordinator, &schema, &files).unwrap_err();
        assert_eq!(err.to_string(), "This form has no attachment field named passport");
    }

    #[test]
    fn iso_country_code_becomes_dial_code() {
        assert_eq!(field_value("countryCode", "IN"), "+91");
        assert_eq!(field_value("countryCode", "+91"), "+91");
        assert_eq!(field_value("countryCode", "??"), "??");
        assert_eq!(field_value("name", "IN"), "IN");
    }
}

//! Command-line driver for the lead-intake forms
//!
//! Reads one JSON action from stdin and writes one JSON result to stdout:
//! 1. Submit: fills a form, stages its files and submits it
//! 2. ListReviews / ListGallery: read endpoints of the backend
//! 3. SearchCountries: the country-code picker's search
//!
//! Logs go to stderr (`RUST_LOG`, default `info`).

mod cli;

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use cli::*;
use lead_intake::{
    countries, Config, IntakeClient, LeadForm, NoticeLog, ObjectUrlRegistry, SubmissionCoordinator, SubmitOutcome,
    TracingNotifier,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let (output, code) = match process().await {
        Ok(output) => (serde_json::to_string(&output), ExitCode::SUCCESS),
        Err(e) => {
            let error_response = ErrorResponse {
                success: false,
                error: format!("{}", e),
            };
            (serde_json::to_string(&error_response), ExitCode::FAILURE)
        }
    };

    match output {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            eprintln!("Failed to encode output: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn process() -> Result<Output, Box<dyn std::error::Error>> {
    let mut body = String::new();
    std::io::stdin().read_to_string(&mut body)?;
    let input: Input = serde_json::from_str(&body).map_err(|e| format!("Invalid input JSON: {}", e))?;

    match input {
        Input::SearchCountries(search) => Ok(Output::Countries(ListOutput::new(countries::search(&search.query)))),
        Input::ListReviews(_) => {
            let client = IntakeClient::new(Config::from_env()?);
            Ok(Output::Reviews(ListOutput::new(client.approved_reviews().await?)))
        }
        Input::ListGallery(_) => {
            let client = IntakeClient::new(Config::from_env()?);
            Ok(Output::Gallery(ListOutput::new(client.gallery().await?)))
        }
        Input::Submit(submit) => handle_submit(submit).await,
    }
}

/// Stage everything the way the page would, then submit once.
///
/// A file that cannot be attached aborts the action; the lead is never sent
/// without an attachment the caller asked for.
async fn handle_submit(input: SubmitInput) -> Result<Output, Box<dyn std::error::Error>> {
    let client = IntakeClient::new(Config::from_env()?);
    let schema = input.form.schema();
    info!("Submitting {:?} to {}", schema.kind(), schema.endpoint());

    let notices = Arc::new(NoticeLog::new());
    let form = LeadForm::new(schema.clone(), Arc::new(ObjectUrlRegistry::new()));
    let coordinator = SubmissionCoordinator::new(form, client, (TracingNotifier, notices.clone()));

    for (name, value) in &input.fields {
        if !schema.fields().iter().any(|rule| rule.name == *name) {
            warn!("Ignoring unknown field {}", name);
            continue;
        }
        coordinator.set_field(name, &field_value(name, value));
    }

    stage_files(&coordinator, &schema, &input.files)?;

    let outcome = coordinator.submit().await;
    Ok(Output::Submit(SubmitOutput {
        success: matches!(outcome, SubmitOutcome::Succeeded { .. }),
        outcome,
        notices: notices.notices(),
    }))
}

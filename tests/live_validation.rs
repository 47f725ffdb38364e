use std::{env, sync::Once};

use rustydigest::{
    config::{self, SummaryMode},
    processing::{DigestService, SummaryOptions},
    summarization::{
        GenerationParams, SummarizationClient, SummarizationRequest, shared_summarization_client,
    },
};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() {
    INIT.call_once(|| {
        set_default_env("SUMMARIZATION_PROVIDER", "huggingface");
        set_default_env("SUMMARIZATION_MODEL", "facebook/bart-large-cnn");
        config::init_config().expect("valid live configuration");
    });
}

const ARTICLE: &str = "The city council met on Tuesday to discuss the new transit plan. \
    Members debated the cost of extending the light rail line to the northern suburbs. \
    Supporters argued that the extension would cut commute times and reduce traffic. \
    Opponents worried that the budget would crowd out road maintenance for a decade. \
    After four hours the council voted to commission an independent cost study. \
    The study is expected to be published early next year.";

#[tokio::test]
#[ignore = "Requires a live summarization provider"]
async fn live_provider_summarizes_text() {
    init_config_once();
    let client = shared_summarization_client().expect("client initializes");
    let model = config::get_config().summarization_model.clone();
    let summary = client
        .summarize(SummarizationRequest {
            model,
            text: ARTICLE.to_string(),
            params: GenerationParams {
                max_length: 60,
                min_length: 10,
            },
        })
        .await
        .expect("provider returns a summary");
    assert!(!summary.trim().is_empty(), "summary must not be empty");
}

#[tokio::test]
#[ignore = "Requires a live summarization provider"]
async fn live_pipeline_runs_two_stage() {
    init_config_once();
    let service = DigestService::new();
    let outcome = service
        .summarize_text(
            ARTICLE.repeat(3),
            SummaryOptions {
                mode: Some(SummaryMode::TwoStage),
                chunk_size: Some(80),
                clean: None,
            },
        )
        .await
        .expect("pipeline succeeds");
    assert!(outcome.chunk_count > 1, "{outcome:?}");
    assert_eq!(outcome.chunks_failed, 0, "{:?}", outcome.warnings);
    assert!(!outcome.summary.is_empty());
}

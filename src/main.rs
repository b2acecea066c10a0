mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use extraction_evaluator::adapters::cache::{FileResultCache, InMemoryResultCache};
use extraction_evaluator::adapters::llm::{
    AnthropicConfig, AnthropicProvider, MockEmbeddingProvider, MockLlmProvider,
    OpenAIEmbeddingConfig, OpenAIEmbeddingProvider, RetryingEmbeddingProvider, RetryingLlmProvider,
};
use extraction_evaluator::adapters::report::HtmlReportExporter;
use extraction_evaluator::adapters::storage::{FileDocumentStore, LocalObjectStore};
use extraction_evaluator::application::{
    AssessConfidenceCommand, AssessConfidenceHandler, AssessorSettings, ComparatorSettings,
    ConfidenceAssessor, EvaluateDocumentCommand, EvaluateDocumentHandler, FieldComparator,
    ListMatcher, SectionEvaluator, SectionInput, WorkerPool,
};
use extraction_evaluator::config::{AppConfig, LlmProviderKind, LogFormat};
use extraction_evaluator::domain::decomposition::TaskDecomposer;
use extraction_evaluator::domain::foundation::{DocumentId, RunId, SectionId};
use extraction_evaluator::domain::schema::SchemaResolver;
use extraction_evaluator::ports::{EmbeddingProvider, LlmProvider, ResultCache, SectionRef};

use crate::cli::{AssessArgs, Cli, Commands, EvaluateArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(2);
        }
    };
    init_tracing(config.logging.format);

    if let Err(err) = run(cli, config).await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn load_config() -> Result<AppConfig> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Evaluate(args) => evaluate(args, &config).await,
        Commands::Assess(args) => assess(args, &config).await,
    }
}

async fn evaluate(args: EvaluateArgs, config: &AppConfig) -> Result<()> {
    let document_id = match &args.document_id {
        Some(id) => id.clone(),
        None => file_stem(&args.actual)?,
    };
    let document_id = DocumentId::new(document_id).context("invalid document id")?;
    let trace_id = RunId::new().to_string();

    let mut comparator = FieldComparator::new(ComparatorSettings {
        defaults: config.evaluation.method_defaults(),
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
    })
    .with_trace_id(trace_id);
    comparator = comparator.with_llm(build_llm(config)?);
    if let Some(embeddings) = build_embeddings(config)? {
        comparator = comparator.with_embeddings(embeddings);
    }

    let workers = config.evaluation.workers;
    let matcher = Arc::new(ListMatcher::new(Arc::new(comparator), WorkerPool::with_workers(workers)));
    let evaluator = Arc::new(SectionEvaluator::new(
        Arc::new(SchemaResolver::new()),
        TaskDecomposer::new(config.evaluation.decomposer_config()),
        matcher,
        WorkerPool::with_workers(workers),
    ));

    let handler = EvaluateDocumentHandler::new(
        Arc::new(FileDocumentStore::new(&args.schema_dir)),
        Arc::new(LocalObjectStore::new(&args.out)),
        evaluator,
        WorkerPool::with_workers(workers),
        config.evaluation.report_prefix.clone(),
    )
    .with_exporter(Arc::new(HtmlReportExporter::new()));

    let section = SectionInput::new(
        SectionId::new("section-1").context("invalid section id")?,
        args.document_class,
        path_uri(&args.expected)?,
        path_uri(&args.actual)?,
    );
    let result = handler
        .handle(EvaluateDocumentCommand {
            document_id,
            sections: vec![section],
        })
        .await
        .context("evaluating document")?;

    let metrics = result.metrics();
    println!("document:       {}", result.document_id());
    println!("precision:      {:.3}", metrics.precision);
    println!("recall:         {:.3}", metrics.recall);
    println!("f1:             {:.3}", metrics.f1_score);
    println!("accuracy:       {:.3}", metrics.accuracy);
    println!("weighted score: {:.3}", metrics.weighted_score);
    for section in result.sections() {
        if let Some(reason) = section.failure_reason() {
            println!("section {} failed: {}", section.section_id, reason);
        }
    }
    if let Some(uri) = result.report_uri() {
        println!("report:         {}", uri);
    }
    Ok(())
}

async fn assess(args: AssessArgs, config: &AppConfig) -> Result<()> {
    let cache: Arc<dyn ResultCache> = match &config.assessment.cache_dir {
        Some(dir) => Arc::new(FileResultCache::new(dir)),
        None => Arc::new(InMemoryResultCache::new()),
    };
    let assessor = ConfidenceAssessor::new(
        Arc::new(SchemaResolver::new()),
        TaskDecomposer::new(config.evaluation.decomposer_config()),
        build_llm(config)?,
        WorkerPool::with_workers(config.assessment.workers),
        AssessorSettings {
            default_confidence_threshold: config.assessment.confidence_threshold,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        },
    )
    .with_cache(cache)
    .with_trace_id(RunId::new().to_string());

    let handler = AssessConfidenceHandler::new(
        Arc::new(FileDocumentStore::new(&args.schema_dir)),
        Arc::new(assessor),
    );
    let section = SectionRef::new(
        SectionId::new(args.section_id).context("invalid section id")?,
        args.document_class,
        path_uri(&args.actual)?,
    );

    let result = handler
        .handle(AssessConfidenceCommand::new(section))
        .await
        .context("assessing confidence")?;
    println!("{}", result.report_markdown);
    Ok(())
}

fn build_llm(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm = &config.llm;
    match llm.provider {
        LlmProviderKind::Mock => Ok(Arc::new(MockLlmProvider::new().with_model(llm.model.clone()))),
        LlmProviderKind::Anthropic => {
            let api_key = llm.api_key.clone().unwrap_or_default();
            let mut anthropic = AnthropicConfig::new(api_key)
                .with_model(llm.model.clone())
                .with_timeout(llm.timeout())
                .with_default_max_tokens(llm.max_tokens);
            if let Some(base_url) = &llm.base_url {
                anthropic = anthropic.with_base_url(base_url.clone());
            }
            let provider = AnthropicProvider::new(anthropic).context("creating Anthropic provider")?;
            Ok(Arc::new(RetryingLlmProvider::new(provider, config.retry.to_policy())))
        }
    }
}

fn build_embeddings(config: &AppConfig) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    let embedding = &config.embedding;
    if let Some(api_key) = embedding.api_key.clone().filter(|k| !k.is_empty()) {
        let mut openai = OpenAIEmbeddingConfig::new(api_key)
            .with_model(embedding.model.clone())
            .with_timeout(embedding.timeout());
        if let Some(base_url) = &embedding.base_url {
            openai = openai.with_base_url(base_url.clone());
        }
        let provider = OpenAIEmbeddingProvider::new(openai).context("creating embedding provider")?;
        return Ok(Some(Arc::new(RetryingEmbeddingProvider::new(
            provider,
            config.retry.to_policy(),
        ))));
    }
    if config.llm.provider == LlmProviderKind::Mock {
        return Ok(Some(Arc::new(MockEmbeddingProvider::new())));
    }
    Ok(None)
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a document id from {}", path.display()))
}

/// Absolute path of an input file, so `..` segments stay usable.
fn path_uri(path: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(absolute.to_string_lossy().into_owned())
}

// src/main.rs
use clap::{Args, Parser, Subcommand};
use filing_digest::config::ExtractorConfig;
use filing_digest::edgar::{CompanyInfo, EdgarClient, FormType};
use filing_digest::extractors::{SectionExtractor, TableFormat};
use filing_digest::report::{self, ReportSource};
use filing_digest::storage::{ReportMetadata, StorageManager};
use filing_digest::utils::{self, AppError};
use std::path::PathBuf;

/// Extracts analysis-ready text from SEC filings and uploaded PDFs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON extraction config (sections, layout, fetch settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the most recent filing of each form type for a ticker
    Filings {
        #[arg(short, long)]
        ticker: String,

        /// Form types, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "10-K,10-Q,8-K")]
        forms: Vec<FormType>,
    },
    /// Build a report from recent filings and/or uploaded PDFs
    Analyze(AnalyzeArgs),
    /// Print the reconstructed text of a PDF
    Pdf { file: PathBuf },
    /// Run HTML section extraction on a local filing document
    Section {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, default_value = "10-K")]
        form_type: FormType,

        /// Render tables as JSON arrays instead of pipe rows
        #[arg(long)]
        json_tables: bool,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Ticker symbol of the company
    #[arg(short, long)]
    ticker: Option<String>,

    #[arg(short, long, value_delimiter = ',', default_value = "10-K,10-Q,8-K")]
    forms: Vec<FormType>,

    /// PDF files to include (repeatable)
    #[arg(long = "pdf")]
    pdfs: Vec<PathBuf>,

    /// Save the report and metadata here instead of printing
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Wrap the report in the bull/bear analysis prompt
    #[arg(long)]
    prompt: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Parsed arguments: {:?}", cli);

    let config = match &cli.config {
        Some(path) => ExtractorConfig::load(path)?,
        None => ExtractorConfig::from_env()?,
    };

    match cli.command {
        Command::Filings { ticker, forms } => {
            let client = EdgarClient::new(&config.fetch)?;
            let (company, filings) = client.most_recent_filings(&ticker, &forms).await?;
            tracing::info!("{}: {} filings", company.name, filings.len());
            let json = serde_json::to_string_pretty(&filings)
                .map_err(|e| AppError::Usage(format!("could not serialize filings: {}", e)))?;
            println!("{}", json);
        }
        Command::Analyze(args) => run_analyze(&config, args).await?,
        Command::Pdf { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let text = filing_digest::extract_pdf(&bytes, &config.layout)?;
            println!("{}", text);
        }
        Command::Section { file, form_type, json_tables } => {
            let html = tokio::fs::read_to_string(&file).await?;
            let format = if json_tables { TableFormat::Json } else { config.table_format };
            let extractor = SectionExtractor::new(&config.sections, format)?;
            println!("{}", extractor.extract_filing(form_type, &html));
        }
    }

    Ok(())
}

async fn run_analyze(config: &ExtractorConfig, args: AnalyzeArgs) -> Result<(), AppError> {
    if args.ticker.is_none() && args.pdfs.is_empty() {
        return Err(AppError::Usage("analyze needs --ticker and/or at least one --pdf".to_string()));
    }

    let client = EdgarClient::new(&config.fetch)?;
    let mut sources = Vec::new();
    let mut company: Option<CompanyInfo> = None;

    // 3. Filings first, then uploads, in the order given
    if let Some(ticker) = &args.ticker {
        let (info, filings) = client.most_recent_filings(ticker, &args.forms).await?;
        if filings.is_empty() {
            tracing::warn!("No {:?} filings found for {}", args.forms, ticker);
        }
        sources.extend(filings.into_iter().map(ReportSource::Filing));
        company = Some(info);
    }
    for path in &args.pdfs {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sources.push(ReportSource::Upload { file_name, bytes });
    }

    let labels: Vec<String> = sources.iter().map(ReportSource::label).collect();

    // 4. Run the batch
    let bundle = report::analyze(&client, config, sources).await?;
    let prompt = args
        .prompt
        .then(|| report::generate_prompt(company.as_ref(), &bundle));

    // 5. Save or print
    match &args.output_dir {
        Some(dir) => {
            let storage = StorageManager::new(dir)?;
            let subject = args.ticker.as_deref().unwrap_or("uploads");
            let meta = ReportMetadata::new(subject, company.map(|c| c.name), labels, &bundle);
            storage.save_report(&bundle, &meta)?;
            if let Some(prompt) = &prompt {
                storage.save_prompt(prompt, &meta)?;
            }
            storage.save_metadata(&meta)?;
        }
        None => println!("{}", prompt.as_deref().unwrap_or(&bundle)),
    }

    Ok(())
}

// src/edgar/client.rs
use crate::config::FetchConfig;
use crate::edgar::models::{CompanyInfo, CompanySubmission, FilingCandidate, FilingRef, FormType};
use crate::utils::error::EdgarError;
use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Source of raw document bytes. The batch pipeline only needs this, which
/// keeps it testable without the network.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, EdgarError>;
}

/// EDGAR HTTP client: identifying User-Agent, bounded concurrency and a
/// fixed pause before every request.
#[derive(Clone)]
pub struct EdgarClient {
    http: reqwest::Client,
    limiter: Arc<Semaphore>,
    delay: Duration,
}

impl EdgarClient {
    pub fn new(config: &FetchConfig) -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str()) // Set the required User-Agent
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        tracing::debug!("Using User-Agent: {}", config.user_agent);

        Ok(Self {
            http,
            limiter: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Issues a GET once a slot is free, mapping EDGAR's failure statuses.
    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, EdgarError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| EdgarError::Client(e.to_string()))?;
        tokio::time::sleep(self.delay).await;

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await?; // Propagates reqwest::Error as EdgarError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::FilingDocNotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }
        Ok(response)
    }

    /// Downloads a filing document (HTML or PDF) as raw bytes.
    pub async fn download_filing_doc(&self, url: &str) -> Result<Vec<u8>, EdgarError> {
        tracing::info!("Downloading document from: {}", url);
        let response = self
            .get(url, "application/pdf,application/xml,text/html,text/plain,*/*")
            .await?;
        let body = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    /// Gets the 10-digit CIK (Central Index Key) for a ticker symbol.
    pub async fn get_cik_from_ticker(&self, ticker: &str) -> Result<String, EdgarError> {
        let response = self.get(COMPANY_TICKERS_URL, "application/json").await?;
        let json: serde_json::Value = response.json().await?;
        find_cik(&json, ticker)?.ok_or_else(|| EdgarError::TickerNotFound(ticker.to_uppercase()))
    }

    /// Fetches the company submission data for a given CIK.
    pub async fn get_company_submissions(&self, cik: &str) -> Result<CompanySubmission, EdgarError> {
        let url = format!("https://data.sec.gov/submissions/CIK{}.json", cik);
        let response = self.get(&url, "application/json").await?;
        let submission: CompanySubmission = response.json().await?;
        Ok(submission)
    }

    /// Document URL for a filing: the file FilingSummary.xml lists under the
    /// form's doctype, else the index's primary document.
    pub async fn resolve_document_url(&self, cik: &str, candidate: &FilingCandidate) -> String {
        let summary_url = format!("{}/FilingSummary.xml", candidate.archive_base(cik));
        let listed = match self.get(&summary_url, "application/xml").await {
            Ok(response) => match response.text().await {
                Ok(xml) => find_document_in_summary(&xml, candidate.form_type),
                Err(e) => Err(EdgarError::Network(e)),
            },
            Err(e) => Err(e),
        };

        match listed {
            Ok(Some(file)) => format!("{}/{}", candidate.archive_base(cik), file),
            Ok(None) => candidate.primary_doc_url(cik),
            Err(e) => {
                tracing::warn!("FilingSummary lookup failed for {}: {}", candidate.accession_number, e);
                candidate.primary_doc_url(cik)
            }
        }
    }

    /// Most recent filing of each requested form type for a ticker.
    pub async fn most_recent_filings(
        &self,
        ticker: &str,
        form_types: &[FormType],
    ) -> Result<(CompanyInfo, Vec<FilingRef>), EdgarError> {
        let cik = self.get_cik_from_ticker(ticker).await?;
        let submissions = self.get_company_submissions(&cik).await?;
        let candidates = submissions.filings.recent.most_recent(form_types);
        tracing::info!("Found {} recent filings for {} (CIK {})", candidates.len(), ticker, cik);

        let mut filings = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            filings.push(FilingRef {
                form_type: candidate.form_type,
                filing_date: candidate.filing_date,
                url: self.resolve_document_url(&cik, candidate).await,
            });
        }
        Ok((submissions.company_info(), filings))
    }
}

#[async_trait]
impl DocumentFetcher for EdgarClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, EdgarError> {
        self.download_filing_doc(url).await
    }
}

/// Looks a ticker up in `company_tickers.json`, returning the zero-padded CIK.
pub fn find_cik(json: &serde_json::Value, ticker: &str) -> Result<Option<String>, EdgarError> {
    let ticker = ticker.to_uppercase();
    let companies = json
        .as_object()
        .ok_or_else(|| EdgarError::Parse("Invalid JSON structure".to_string()))?;

    for company in companies.values() {
        let matches = company
            .get("ticker")
            .and_then(|t| t.as_str())
            .map(|t| t.to_uppercase() == ticker)
            .unwrap_or(false);
        if matches {
            let cik_num = company
                .get("cik_str")
                .and_then(|c| c.as_u64())
                .ok_or_else(|| EdgarError::Parse("Invalid CIK format".to_string()))?;
            return Ok(Some(format!("{:010}", cik_num)));
        }
    }
    Ok(None)
}

/// File listed in FilingSummary.xml for the given form's doctype.
pub fn find_document_in_summary(xml: &str, form_type: FormType) -> Result<Option<String>, EdgarError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| EdgarError::Parse(format!("FilingSummary.xml: {}", e)))?;

    let file = doc
        .descendants()
        .filter(|n| n.has_tag_name("File"))
        .find(|n| n.attribute("doctype") == Some(form_type.as_str()))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    Ok(file)
}

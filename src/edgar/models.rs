// src/edgar/models.rs
#![allow(non_snake_case)]
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filing types the extractor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormType {
    #[serde(rename = "8-K")]
    EightK,
    #[serde(rename = "10-K")]
    TenK,
    #[serde(rename = "10-Q")]
    TenQ,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::EightK => "8-K",
            FormType::TenK => "10-K",
            FormType::TenQ => "10-Q",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "8-K" => Ok(FormType::EightK),
            "10-K" => Ok(FormType::TenK),
            "10-Q" => Ok(FormType::TenQ),
            other => Err(format!("Unsupported form type: {}", other)),
        }
    }
}

/// Identifies one filing document to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingRef {
    pub form_type: FormType,
    pub filing_date: NaiveDate,
    pub url: String,
}

impl FilingRef {
    /// Label used in the assembled report.
    pub fn label(&self) -> String {
        format!("Filing: {} ({})", self.form_type, self.filing_date.format("%Y-%m-%d"))
    }
}

/// Structure representing the EDGAR company submission index
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    pub name: String,
    #[serde(default)]
    pub sicDescription: Option<String>,
    pub filings: Filings,
}

impl CompanySubmission {
    /// Entity summary used when building the analysis prompt.
    pub fn company_info(&self) -> CompanyInfo {
        CompanyInfo {
            name: self.name.clone(),
            industry: self.sicDescription.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilingsList {
    pub accessionNumber: Vec<String>,
    pub filingDate: Vec<String>,
    pub form: Vec<String>,
    pub primaryDocument: Vec<String>,
}

/// Name and industry of the filer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub industry: String,
}

/// A filing picked from the submissions index, before its document URL
/// is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingCandidate {
    pub form_type: FormType,
    pub filing_date: NaiveDate,
    pub accession_number: String,
    pub primary_doc: String,
}

impl FilingCandidate {
    pub fn accession_no_dashes(&self) -> String {
        self.accession_number.replace('-', "")
    }

    /// Archive folder holding every document of this filing.
    pub fn archive_base(&self, cik: &str) -> String {
        let cik_no_zeros = cik.trim_start_matches('0');
        format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}",
            cik_no_zeros,
            self.accession_no_dashes()
        )
    }

    pub fn primary_doc_url(&self, cik: &str) -> String {
        format!("{}/{}", self.archive_base(cik), self.primary_doc)
    }
}

impl FilingsList {
    /// Most recent filing of each requested form type, in the order the
    /// form types were requested.
    pub fn most_recent(&self, form_types: &[FormType]) -> Vec<FilingCandidate> {
        let mut latest: Vec<FilingCandidate> = Vec::new();

        for (idx, form) in self.form.iter().enumerate() {
            let Ok(form_type) = form.parse::<FormType>() else {
                continue;
            };
            if !form_types.contains(&form_type) {
                continue;
            }
            let (Some(date), Some(accession), Some(doc)) = (
                self.filingDate.get(idx),
                self.accessionNumber.get(idx),
                self.primaryDocument.get(idx),
            ) else {
                tracing::warn!("Submissions index row {} is incomplete, skipping", idx);
                continue;
            };
            let Ok(filing_date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
                tracing::warn!("Unparseable filing date '{}' at row {}", date, idx);
                continue;
            };

            let candidate = FilingCandidate {
                form_type,
                filing_date,
                accession_number: accession.clone(),
                primary_doc: doc.clone(),
            };
            match latest.iter_mut().find(|c| c.form_type == form_type) {
                Some(existing) if existing.filing_date >= filing_date => {}
                Some(existing) => *existing = candidate,
                None => latest.push(candidate),
            }
        }

        latest.sort_by_key(|c| form_types.iter().position(|f| *f == c.form_type));
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recent() -> FilingsList {
        FilingsList {
            accessionNumber: vec![
                "0000320193-24-000123".into(),
                "0000320193-24-000100".into(),
                "0000320193-24-000081".into(),
                "0000320193-23-000106".into(),
                "0000320193-24-000090".into(),
            ],
            filingDate: vec![
                "2024-11-01".into(),
                "2024-10-31".into(),
                "2024-08-02".into(),
                "2023-11-03".into(),
                "2024-09-10".into(),
            ],
            form: vec!["10-K".into(), "8-K".into(), "10-Q".into(), "10-K".into(), "4".into()],
            primaryDocument: vec![
                "aapl-20240928.htm".into(),
                "aapl-20241031.htm".into(),
                "aapl-20240629.htm".into(),
                "aapl-20230930.htm".into(),
                "xslF345X05/wk-form4.xml".into(),
            ],
        }
    }

    #[test]
    fn form_type_parsing_and_display() {
        assert_eq!("10-k".parse::<FormType>().unwrap(), FormType::TenK);
        assert_eq!(FormType::EightK.to_string(), "8-K");
        assert!("S-1".parse::<FormType>().is_err());
        let json = serde_json::to_string(&FormType::TenQ).unwrap();
        assert_eq!(json, "\"10-Q\"");
    }

    #[test]
    fn filing_ref_label_and_json() {
        let filing: FilingRef = serde_json::from_str(
            r#"{ "formType": "10-K", "filingDate": "2024-11-01", "url": "https://www.sec.gov/a.htm" }"#,
        )
        .unwrap();
        assert_eq!(filing.label(), "Filing: 10-K (2024-11-01)");
    }

    #[test]
    fn submissions_keep_only_what_is_used() {
        let submission: CompanySubmission = serde_json::from_str(
            r#"{
                "cik": "0000320193",
                "name": "Apple Inc.",
                "tickers": ["AAPL"],
                "sicDescription": "Electronic Computers",
                "addresses": { "business": { "city": "CUPERTINO", "stateOrCountry": "CA" } },
                "filings": { "recent": {
                    "accessionNumber": ["0000320193-24-000123"],
                    "filingDate": ["2024-11-01"],
                    "form": ["10-K"],
                    "primaryDocument": ["aapl-20240928.htm"],
                    "reportDate": ["2024-09-28"]
                } }
            }"#,
        )
        .unwrap();
        assert_eq!(
            submission.company_info(),
            CompanyInfo { name: "Apple Inc.".into(), industry: "Electronic Computers".into() }
        );
        assert_eq!(submission.filings.recent.most_recent(&[FormType::TenK]).len(), 1);
    }

    #[test]
    fn most_recent_per_form_in_requested_order() {
        let picked = recent().most_recent(&[FormType::TenQ, FormType::TenK]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].form_type, FormType::TenQ);
        assert_eq!(picked[1].form_type, FormType::TenK);
        assert_eq!(picked[1].filing_date, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
        assert_eq!(
            picked[1].primary_doc_url("0000320193"),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm"
        );
    }
}

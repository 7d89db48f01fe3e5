//! Wraps an assembled report in the bull/bear analysis instructions handed
//! to the downstream language model.

use crate::edgar::models::CompanyInfo;

const ANALYSIS_CATEGORIES: &str = "\
Financial Health & Growth:
- Revenue growth trends and quality
- Margin evolution and profitability
- Cash flow generation
- Balance sheet strength
- Capital allocation strategy

Market Position:
- Market share trends
- Competitive advantages
- Brand strength
- Industry position
- Geographic expansion opportunities

Business Model:
- Revenue diversification
- Customer concentration
- Pricing power
- Operating leverage
- Recurring revenue %

Management & Governance:
- Executive compensation alignment
- Capital allocation track record
- Corporate governance practices
- Insider ownership
- Management credibility

Risk Factors:
- Regulatory environment
- Technology disruption risk
- Customer/supplier concentration
- Geographic/political exposure
- Industry-specific risks

Growth Investments:
- R&D spending trends
- Capital expenditure plans
- M&A strategy
- New product pipeline
- Market expansion initiatives";

const CLOSING: &str = "\
After analyzing these categories, please:
1. Provide an overall bull/bear rating (1-5)
2. List the top 3 bull and bear considerations
3. Identify key metrics to monitor going forward
4. Flag any potential catalysts (both positive and negative)
5. Note areas where additional research beyond these filings would be valuable";

fn subject(company: Option<&CompanyInfo>) -> String {
    match company {
        Some(info) if !info.industry.is_empty() => {
            format!("the company {} in the {} industry", info.name, info.industry)
        }
        Some(info) if !info.name.is_empty() => format!("the company {}", info.name),
        _ => "the company".to_string(),
    }
}

/// Analysis instructions followed by the report text.
pub fn generate_prompt(company: Option<&CompanyInfo>, report: &str) -> String {
    format!(
        "Please help me analyze the following excerpts from {}, to evaluate the bull vs bear case for the stock. \
For each category below, please:\n\
1. Rate it on a scale of 1-5 (1 being very bearish, 5 being very bullish)\n\
2. Provide key supporting evidence from the provided document text (include page numbers from the text)\n\
3. Flag any significant risks or concerns\n\n\
Key areas to analyze:\n\n{}\n\n{}\n\n{}",
        subject(company),
        ANALYSIS_CATEGORIES,
        CLOSING,
        report.replace("\r\n", "\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_company_and_appends_report() {
        let info = CompanyInfo { name: "Apple Inc.".into(), industry: "Electronic Computers".into() };
        let prompt = generate_prompt(Some(&info), "Filing: 10-K (2024-11-01)\r\n\r\nText");
        assert!(prompt.starts_with(
            "Please help me analyze the following excerpts from the company Apple Inc. in the Electronic Computers industry,"
        ));
        assert!(prompt.ends_with("valuable\n\nFiling: 10-K (2024-11-01)\n\nText"));
    }

    #[test]
    fn works_without_company() {
        assert!(generate_prompt(None, "x").contains("excerpts from the company, to evaluate"));
    }
}

//! Strict parsing of the generator's sectioned output.
//!
//! The generator is instructed to answer in a RECOMMENDATION / INSIGHTS /
//! SUGGESTED_PRICE format. Output missing the required sections is a
//! generation failure, never silently defaulted from statistics.

use crate::error::{AppError, Result};
use crate::scraper::sources::parse_price;
use crate::types::{PriceStatistics, Recommendation};

enum Section {
    None,
    Recommendation,
    Insights,
}

/// Parse generator text into a [`Recommendation`]. Requires a non-empty
/// recommendation and at least one insight; the suggested price is optional.
pub fn parse_generator_output(text: &str) -> Result<Recommendation> {
    let mut recommendation = String::new();
    let mut insights: Vec<String> = Vec::new();
    let mut suggested_price: Option<f64> = None;
    let mut section = Section::None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("RECOMMENDATION:") {
            section = Section::Recommendation;
            recommendation = rest.trim().to_string();
        } else if trimmed.starts_with("INSIGHTS:") {
            section = Section::Insights;
        } else if let Some(rest) = trimmed.strip_prefix("SUGGESTED_PRICE:") {
            section = Section::None;
            suggested_price = parse_price(rest.trim());
        } else {
            match section {
                Section::Recommendation if recommendation.is_empty() => {
                    recommendation = trimmed.to_string();
                }
                Section::Insights => {
                    let insight = trimmed.trim_start_matches(['-', '*', ' ']).to_string();
                    if !insight.is_empty() {
                        insights.push(insight);
                    }
                }
                _ => {}
            }
        }
    }

    if recommendation.is_empty() {
        return Err(AppError::Generation(
            "generator output missing RECOMMENDATION section".to_string(),
        ));
    }
    if insights.is_empty() {
        return Err(AppError::Generation(
            "generator output missing INSIGHTS section".to_string(),
        ));
    }

    Ok(Recommendation {
        recommendation,
        insights,
        suggested_price,
    })
}

/// When the caller's target price falls outside the observed market range,
/// prepend an explicit insight flagging it. The discrepancy must never pass
/// silently, regardless of what the generator chose to mention.
pub fn flag_budget_position(
    recommendation: &mut Recommendation,
    stats: &PriceStatistics,
    user_price: Option<f64>,
) {
    use crate::analyst::prompt::format_rupiah;

    let Some(price) = user_price else { return };

    let note = if price < stats.min {
        format!(
            "Your target price {} is below the observed market range ({} - {})",
            format_rupiah(price),
            format_rupiah(stats.min),
            format_rupiah(stats.max)
        )
    } else if price > stats.max {
        format!(
            "Your target price {} is above the observed market range ({} - {})",
            format_rupiah(price),
            format_rupiah(stats.min),
            format_rupiah(stats.max)
        )
    } else {
        return;
    };

    recommendation.insights.insert(0, note);
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
RECOMMENDATION: Price at the median to stay competitive.
INSIGHTS:
- Market average is Rp300.000
- Price range shows high variability
- Ratings cluster above 4.5
SUGGESTED_PRICE: Rp280.000";

    fn stats() -> PriceStatistics {
        PriceStatistics {
            min: 100_000.0,
            max: 500_000.0,
            average: 300_000.0,
            median: 280_000.0,
            q1: Some(150_000.0),
            q3: Some(420_000.0),
            total_products: 8,
        }
    }

    #[test]
    fn parses_well_formed_output() {
        let rec = parse_generator_output(WELL_FORMED).unwrap();
        assert_eq!(rec.recommendation, "Price at the median to stay competitive.");
        assert_eq!(rec.insights.len(), 3);
        assert_eq!(rec.insights[2], "Ratings cluster above 4.5");
        assert_eq!(rec.suggested_price, Some(280_000.0));
    }

    #[test]
    fn recommendation_may_continue_on_next_line() {
        let text = "RECOMMENDATION:\nPrice slightly below average.\nINSIGHTS:\n- One insight";
        let rec = parse_generator_output(text).unwrap();
        assert_eq!(rec.recommendation, "Price slightly below average.");
        assert_eq!(rec.insights, vec!["One insight".to_string()]);
    }

    #[test]
    fn missing_recommendation_is_an_error() {
        let text = "INSIGHTS:\n- Something\nSUGGESTED_PRICE: 100";
        assert!(matches!(
            parse_generator_output(text),
            Err(AppError::Generation(_))
        ));
    }

    #[test]
    fn missing_insights_is_an_error() {
        let text = "RECOMMENDATION: do things\nSUGGESTED_PRICE: 100";
        assert!(matches!(
            parse_generator_output(text),
            Err(AppError::Generation(_))
        ));
    }

    #[test]
    fn unparseable_suggested_price_is_omitted() {
        let text = "RECOMMENDATION: ok\nINSIGHTS:\n- a\nSUGGESTED_PRICE: around the median";
        let rec = parse_generator_output(text).unwrap();
        assert_eq!(rec.suggested_price, None);
    }

    #[test]
    fn below_range_budget_gets_flagged() {
        let mut rec = parse_generator_output(WELL_FORMED).unwrap();
        flag_budget_position(&mut rec, &stats(), Some(50_000.0));
        assert!(rec.insights[0].contains("below the observed market range"));
    }

    #[test]
    fn above_range_budget_gets_flagged() {
        let mut rec = parse_generator_output(WELL_FORMED).unwrap();
        flag_budget_position(&mut rec, &stats(), Some(900_000.0));
        assert!(rec.insights[0].contains("above the observed market range"));
    }

    #[test]
    fn in_range_budget_is_not_flagged() {
        let mut rec = parse_generator_output(WELL_FORMED).unwrap();
        let before = rec.insights.len();
        flag_budget_position(&mut rec, &stats(), Some(250_000.0));
        assert_eq!(rec.insights.len(), before);
    }
}

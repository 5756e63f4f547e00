//! Prompt construction for the recommendation and query-optimization calls.

use crate::config::PROMPT_LISTING_SAMPLE;
use crate::types::{Listing, PriceStatistics};

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a pricing analyst expert \
specializing in Indonesian e-commerce markets. Provide clear, actionable insights.";

pub const OPTIMIZER_SYSTEM_PROMPT: &str = "You are a search query optimizer \
for Indonesian marketplaces (Tokopedia, Blibli). Output only the optimized \
query, with no extra explanation.";

/// Format a price as Indonesian Rupiah with dot thousand separators.
pub fn format_rupiah(amount: f64) -> String {
    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    out.push_str("Rp");
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Build the market-analysis prompt from statistics and a listing sample.
/// Instructs the generator to answer in the sectioned RECOMMENDATION /
/// INSIGHTS / SUGGESTED_PRICE format the parser expects.
pub fn build_recommendation_prompt(
    query: &str,
    listings: &[Listing],
    stats: &PriceStatistics,
    user_price: Option<f64>,
) -> String {
    let mut prompt = format!(
        "Analyze the following price data for \"{query}\" from Indonesian marketplaces:\n\n"
    );

    prompt.push_str("MARKET STATISTICS:\n");
    prompt.push_str(&format!("- Minimum Price: {}\n", format_rupiah(stats.min)));
    prompt.push_str(&format!("- Maximum Price: {}\n", format_rupiah(stats.max)));
    prompt.push_str(&format!(
        "- Average Price: {}\n",
        format_rupiah(stats.average)
    ));
    prompt.push_str(&format!("- Median Price: {}\n", format_rupiah(stats.median)));
    if let (Some(q1), Some(q3)) = (stats.q1, stats.q3) {
        prompt.push_str(&format!(
            "- Interquartile Range: {} - {}\n",
            format_rupiah(q1),
            format_rupiah(q3)
        ));
    }
    prompt.push_str(&format!(
        "- Total Products Analyzed: {}\n\n",
        stats.total_products
    ));

    prompt.push_str("TOP PRODUCTS:\n");
    for (i, listing) in listings.iter().take(PROMPT_LISTING_SAMPLE).enumerate() {
        prompt.push_str(&format!("{}. {} [{}]\n", i + 1, listing.name, listing.source));
        prompt.push_str(&format!("   Price: {}\n", listing.price_raw));
        if let Some(rating) = &listing.rating {
            prompt.push_str(&format!("   Rating: {rating}\n"));
        }
        if let Some(location) = &listing.shop_location {
            prompt.push_str(&format!("   Location: {location}\n"));
        }
        prompt.push('\n');
    }

    if let Some(price) = user_price {
        prompt.push_str(&format!(
            "USER'S INTENDED PRICE: {}\n\n\
             Compare this price against the market data and state explicitly \
             whether it falls below, inside, or above the observed range.\n\n",
            format_rupiah(price)
        ));
    }

    prompt.push_str(
        "Please provide:\n\
         1. RECOMMENDATION: A concise pricing recommendation (1-2 sentences)\n\
         2. INSIGHTS: 3-5 key insights about this market segment\n\
         3. SUGGESTED_PRICE: A single optimal price point in Indonesian Rupiah (just the number)\n\n\
         Format your response as:\n\
         RECOMMENDATION: [your recommendation]\n\
         INSIGHTS:\n- [insight 1]\n- [insight 2]\n- [insight 3]\n\
         SUGGESTED_PRICE: [numeric value only]\n",
    );

    prompt
}

/// Build the query-rewrite prompt. The optimizer adds a product-category
/// keyword to bare brand/model queries but must leave accessory queries
/// ("case iphone", "charger samsung") untouched.
pub fn build_optimizer_prompt(query: &str) -> String {
    format!(
        "User query: \"{query}\"\n\n\
         Rules:\n\
         1. If the query names only a brand or model without an accessory, \
         append the main product-category keyword.\n\
         2. If the query already names a specific accessory or product type \
         (case, charger, tempered glass, ...), return it unchanged.\n\
         3. Keep the language of the original query.\n\n\
         Examples:\n\
         - \"iphone\" -> \"iphone smartphone\"\n\
         - \"macbook\" -> \"macbook laptop\"\n\
         - \"laptop asus\" -> \"laptop asus\"\n\
         - \"case iphone\" -> \"case iphone\"\n\
         - \"charger samsung\" -> \"charger samsung\"\n\n\
         Output ONLY the optimized query."
    )
}

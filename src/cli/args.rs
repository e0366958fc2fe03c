use crate::types::QuoteMode;

/// Parse a quote mode argument
pub fn parse_mode(s: &str) -> Result<QuoteMode, String> {
    match s.to_lowercase().as_str() {
        "off" => Ok(QuoteMode::Off),
        "yes" | "yes_only" => Ok(QuoteMode::YesOnly),
        "no" | "no_only" => Ok(QuoteMode::NoOnly),
        "both" => Ok(QuoteMode::Both),
        _ => Err(format!(
            "'{}' is not a valid mode (expected off, yes_only, no_only, or both)",
            s
        )),
    }
}

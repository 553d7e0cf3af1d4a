use once_cell::sync::Lazy;
use regex::Regex;

use crate::inference::InferenceError;

/// "5 years experience", "3+ years of exp", "10 year experience", ...
/// Case folding and `\s` are ASCII-only.
static YEARS_PATTERN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"(?i-u)([0-9]+)\s*\+?\s*year[s]?\s*(?:of\s*)?(?:experience|exp)")
});

/// Largest year count mentioned anywhere in the text. A count of zero, or no
/// mention at all, is absent.
pub fn years_of_experience(text: &str) -> Result<Option<i32>, InferenceError> {
    let pattern = YEARS_PATTERN.as_ref().map_err(|e| e.clone())?;

    let mut max_years = 0;
    for caps in pattern.captures_iter(text) {
        let digits = &caps[1];
        let years: i32 = digits
            .parse()
            .map_err(|_| InferenceError::YearsOutOfRange(digits.to_string()))?;
        max_years = max_years.max(years);
    }

    Ok((max_years > 0).then_some(max_years))
}

//! Rebuilds business cards from the plain-text recommendation reply.
//!
//! The reply is prose, so this is best effort: a line without a colon names a
//! new business, and the labeled lines after it fill in its fields. Anything
//! that does not fit that shape is skipped or leaves fields empty; nothing here
//! ever fails.

use serde::{ Deserialize, Serialize };

const RATING_LABEL: &str = "Rating:";
// Also matches the "Estimated Price:" label the server emits.
const PRICE_LABEL: &str = "Price:";
const AVAILABLE_LABEL: &str = "Available:";
const PHONE_LABEL: &str = "Phone:";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBusiness {
    pub name: Option<String>,
    pub rating: Option<f32>,
    pub price: Option<String>,
    pub available_time: Option<String>,
    pub phone: Option<String>,
}

/// True when the reply carries both a rating and a phone label.
pub fn looks_like_recommendation(text: &str) -> bool {
    text.contains(RATING_LABEL) && text.contains(PHONE_LABEL)
}

/// Cards to show for an assistant reply; empty unless it looks like a recommendation.
pub fn parse_reply(text: &str) -> Vec<ParsedBusiness> {
    if looks_like_recommendation(text) {
        extract_business_data(text)
    } else {
        Vec::new()
    }
}

#[derive(Default)]
struct Entry {
    business: ParsedBusiness,
    touched: bool,
}

impl Entry {
    fn flush_into(&mut self, out: &mut Vec<ParsedBusiness>) {
        if self.touched {
            out.push(std::mem::take(&mut self.business));
            self.touched = false;
        }
    }
}

pub fn extract_business_data(text: &str) -> Vec<ParsedBusiness> {
    let mut businesses = Vec::new();
    let mut current = Entry::default();

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !line.contains(':') {
            current.flush_into(&mut businesses);
            current.business.name = Some(trimmed.to_string());
            current.touched = true;
            continue;
        }

        let value = labeled_value(line);
        if line.contains(RATING_LABEL) {
            current.business.rating = value.split('/').next().and_then(parse_leading_float);
        } else if line.contains(PRICE_LABEL) {
            current.business.price = Some(value.to_string());
        } else if line.contains(AVAILABLE_LABEL) {
            current.business.available_time = Some(value.to_string());
        } else if line.contains(PHONE_LABEL) {
            current.business.phone = Some(value.to_string());
        } else {
            continue;
        }
        current.touched = true;
    }

    current.flush_into(&mut businesses);
    businesses
}

/// Text between the first and second colon, trimmed.
fn labeled_value(line: &str) -> &str {
    line.split(':').nth(1).unwrap_or_default().trim()
}

/// Leading decimal number of `s`, ignoring whatever follows it.
fn parse_leading_float(s: &str) -> Option<f32> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        } else if has_digits {
            end += 1;
        }
    }
    if !has_digits {
        return None;
    }
    s[..end].trim_end_matches('.').parse().ok()
}

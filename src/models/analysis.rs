use log::warn;
use serde::{ Deserialize, Deserializer, Serialize };
use serde_json::Value as JsonValue;
use std::fmt;

/// Where the scripted conversation currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStage {
    #[default]
    Initial,
    Details,
    Location,
    Timing,
    Recommendation,
}

impl ConversationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStage::Initial => "initial",
            ConversationStage::Details => "details",
            ConversationStage::Location => "location",
            ConversationStage::Timing => "timing",
            ConversationStage::Recommendation => "recommendation",
        }
    }

    /// Case-insensitive label lookup. Unknown labels restart the script at `Initial`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "initial" => ConversationStage::Initial,
            "details" => ConversationStage::Details,
            "location" => ConversationStage::Location,
            "timing" => ConversationStage::Timing,
            "recommendation" => ConversationStage::Recommendation,
            other => {
                warn!("Unknown conversation stage '{}', treating as initial", other);
                ConversationStage::Initial
            }
        }
    }
}

impl<'de> Deserialize<'de> for ConversationStage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        Ok(match JsonValue::deserialize(deserializer)? {
            JsonValue::String(label) => ConversationStage::from_label(&label),
            _ => ConversationStage::default(),
        })
    }
}

impl fmt::Display for ConversationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the full history, rebuilt from scratch on every turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAnalysis {
    #[serde(default)]
    pub stage: ConversationStage,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub needs_zip_code: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub needs_timing: bool,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
}

/// The three fields a recommendation needs, borrowed from an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationRequest<'a> {
    pub problem_type: &'a str,
    pub zip_code: &'a str,
    pub timing: &'a str,
}

impl ConversationAnalysis {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.trim())
    }

    /// Returns the collected fields once zip code, timing and problem type are all known.
    pub fn recommendation_request(&self) -> Option<RecommendationRequest<'_>> {
        Some(RecommendationRequest {
            problem_type: present(&self.problem_type)?,
            zip_code: present(&self.zip_code)?,
            timing: present(&self.timing)?,
        })
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .filter(|s| !s.trim().is_empty())
}

// Models routinely answer `"zipCode": 94110` without quotes.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

// Accepts `"true"`, `1` and friends alongside real booleans.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where D: Deserializer<'de>
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    })
}

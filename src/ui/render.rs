use super::parser::ParsedBusiness;
use crate::models::chat::{ Message, Role };

pub const THINKING: &str = "Thinking...";
const CARDS_HEADING: &str = "Recommended Service Providers";

pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        Role::Assistant => "Assistant",
        Role::User => "You",
    };
    format!("{}: {}", speaker, message.content)
}

fn or_blank(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

pub fn render_card(business: &ParsedBusiness) -> String {
    let rating = business.rating.map(|r| r.to_string()).unwrap_or_default();
    format!(
        "┌ {}\n│ ★ {}/5\n│ $ {}\n│ ⏱ {}\n│ ☎ {}\n└ [Contact Now]",
        or_blank(&business.name),
        rating,
        or_blank(&business.price),
        or_blank(&business.available_time),
        or_blank(&business.phone)
    )
}

/// Card section shown under the chat, or nothing when there are no cards.
pub fn render_cards(businesses: &[ParsedBusiness]) -> Option<String> {
    if businesses.is_empty() {
        return None;
    }
    let cards = businesses.iter().map(render_card).collect::<Vec<_>>().join("\n\n");
    Some(format!("{}\n\n{}", CARDS_HEADING, cards))
}

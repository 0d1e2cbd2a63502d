pub mod client;
pub mod parser;
pub mod render;
pub mod session;

pub use client::{ ChatApiClient, ChatApiError, ChatTransport };
pub use parser::{ extract_business_data, looks_like_recommendation, parse_reply, ParsedBusiness };
pub use session::{ ChatSession, SendOutcome };

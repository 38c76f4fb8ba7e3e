pub mod format;
pub mod webhook;

pub use format::{earnings_embed, no_earnings_embed, summary_embed, Embed, Surprise};
pub use webhook::{DeliveryError, WebhookClient};

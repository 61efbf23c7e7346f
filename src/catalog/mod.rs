//! Flow card catalog.
//!
//! Cards describe the triggers and actions a flow is built from. Each card
//! declares its parameters and defaults; its behaviour is selected by
//! `CardKind`:
//! - options: fixed lists, or groups / tags / site VPNs fetched on demand
//! - pre-submit: schedule payloads, or client identifiers resolved to
//!   canonical references
//! - submit: create or update a rule in the card's backend family
//!
//! # Example
//!
//! ```ignore
//! let pipeline = FlowPipeline::from_settings(&settings);
//! let card = get_card(CardType::Action, "Block TCP").unwrap();
//!
//! let instance = card
//!     .instantiate()
//!     .with_value("Client", "192.168.2.0/24")
//!     .with_value("DstPort", "443");
//!
//! let receipt = pipeline.submit_flow(card, &instance).await?;
//! ```

mod cards;
mod client;
mod pipeline;
mod schedule;
mod types;

pub use cards::{day_options, port_options, CATALOG};
pub use client::{is_ipv4_or_cidr, is_mac, parse_client, resolve_client_value, ClientRef};
pub use pipeline::FlowPipeline;
pub use schedule::{day_mask, days_to_num, num_to_days, parse_time, to_cron};
pub use types::{
    Card, CardKind, CardType, Flow, FlowInstance, OptionSource, ParamFormat, ParamOption,
    ParamSpec, ParamType,
};

/// Visible cards of one type, in catalog order.
pub fn get_cards(card_type: CardType) -> Vec<&'static Card> {
    CATALOG
        .iter()
        .filter(|card| card.card_type == card_type && !card.hidden)
        .collect()
}

/// Exact, case-sensitive title lookup among the visible cards of one type.
pub fn get_card(card_type: CardType, title: &str) -> Option<&'static Card> {
    get_cards(card_type)
        .into_iter()
        .find(|card| card.title == title)
}

/// Every card, hidden ones included, triggers first.
pub fn all_cards() -> &'static [Card] {
    CATALOG.as_slice()
}

//! The static card catalog: triggers first, then actions.

use lazy_static::lazy_static;
use serde_json::{json, Map, Value};

use super::schedule::DAY_NAMES;
use super::types::{Card, CardKind, CardType, OptionSource, ParamFormat, ParamOption, ParamSpec};

/// Common destination ports offered for port parameters.
const COMMON_PORTS: [(&str, &str); 6] = [
    ("http", "80"),
    ("https", "443"),
    ("ssh", "22"),
    ("telnet", "23"),
    ("3000", "3000"),
    ("8080", "8080"),
];

pub fn port_options() -> Vec<ParamOption> {
    COMMON_PORTS
        .iter()
        .map(|(label, value)| ParamOption::new(*label, *value))
        .collect()
}

/// Day picker entries: full name as label, three-letter abbreviation as value.
pub fn day_options() -> Vec<ParamOption> {
    DAY_NAMES
        .iter()
        .map(|name| ParamOption::new(*name, name[..3].to_lowercase()))
        .collect()
}

impl Card {
    /// Where choices for `param` come from. Parameters without a resolver
    /// are free text.
    ///
    /// Group and tag listings feed only the `Groups` / `Tags` params; the
    /// `Client` param of those cards stays free text.
    pub fn option_source(&self, param: &str) -> OptionSource {
        match (self.kind, param) {
            (CardKind::Schedule, "days") => OptionSource::Static(day_options()),
            (CardKind::Block, "DstPort") => OptionSource::Static(port_options()),
            (CardKind::Forward, "DstPort" | "OriginalDstPort") => {
                OptionSource::Static(port_options())
            }
            (CardKind::SiteVpnForward, "DstInterface") => OptionSource::SiteVpns,
            (CardKind::SetGroups, "Groups") => OptionSource::Groups,
            (CardKind::SetTags, "Tags") => OptionSource::Tags,
            _ => OptionSource::None,
        }
    }
}

fn values(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn client_param() -> ParamSpec {
    ParamSpec::string("Client").describe("IP/CIDR or Group")
}

fn protocol_param() -> ParamSpec {
    ParamSpec::string("Protocol").hidden()
}

fn triggers() -> Vec<Card> {
    vec![
        Card {
            title: "Always",
            card_type: CardType::Trigger,
            description: "Always run the selected trigger",
            color: "violet.300",
            icon: "repeat",
            hidden: false,
            params: vec![],
            default_values: Map::new(),
            kind: CardKind::Always,
        },
        Card {
            title: "Date",
            card_type: CardType::Trigger,
            description: "Trigger on selected date and time",
            color: "violet.300",
            icon: "clock",
            hidden: false,
            params: vec![
                ParamSpec::list("days").describe("mon, tue. weekdays, weekend"),
                ParamSpec::string("from")
                    .format(ParamFormat::TimeOfDay)
                    .describe("starting time. format: HH:MM"),
                ParamSpec::string("to")
                    .format(ParamFormat::TimeOfDay)
                    .describe("ending time. format: HH:MM"),
            ],
            default_values: values(json!({
                "days": "mon,tue,wed",
                "from": "10:00",
                "to": "11:00"
            })),
            kind: CardKind::Schedule,
        },
        Card {
            title: "Incoming GET",
            card_type: CardType::Trigger,
            description: "Trigger this card by sending a GET request",
            color: "red.400",
            icon: "broadcast-tower",
            hidden: true,
            params: vec![ParamSpec::string("event")],
            default_values: Map::new(),
            kind: CardKind::IncomingRequest,
        },
    ]
}

fn block_card(title: &'static str, protocol: &str, color: &'static str) -> Card {
    let description = if protocol == "tcp" {
        "Block TCP from source address or group to destination address"
    } else {
        "Block UDP from source address or group to destination address"
    };

    Card {
        title,
        card_type: CardType::Action,
        description,
        color,
        icon: "ban",
        hidden: false,
        params: vec![
            protocol_param(),
            client_param(),
            ParamSpec::string("DstIP").describe("IP/CIDR"),
            ParamSpec::string("DstPort").describe("Dest port, range of ports, or empty for all"),
        ],
        default_values: values(json!({
            "Protocol": protocol,
            "Client": "0.0.0.0",
            "DstIP": "",
            "DstPort": ""
        })),
        kind: CardKind::Block,
    }
}

fn forward_card(title: &'static str, protocol: &str, color: &'static str) -> Card {
    let (description, original_dst_ip) = if protocol == "tcp" {
        (
            "Forward TCP for specified source to destination address and port",
            "0.0.0.0",
        )
    } else {
        (
            "Forward UDP for specified source to destination address and port",
            "",
        )
    };

    Card {
        title,
        card_type: CardType::Action,
        description,
        color,
        icon: "circle-arrow-right",
        hidden: false,
        params: vec![
            protocol_param(),
            client_param(),
            ParamSpec::string("OriginalDstIP").describe("IP/CIDR"),
            ParamSpec::string("OriginalDstPort")
                .describe("Original Destination port, range of ports, or empty for all"),
            ParamSpec::string("DstIP").describe("IP/CIDR"),
            ParamSpec::string("DstPort")
                .describe("New Destination port, range of ports, or empty for all"),
        ],
        default_values: values(json!({
            "Protocol": protocol,
            "Client": "0.0.0.0",
            "DstIP": "0.0.0.0",
            "OriginalDstIP": original_dst_ip,
            "OriginalDstPort": "",
            "DstPort": ""
        })),
        kind: CardKind::Forward,
    }
}

fn actions() -> Vec<Card> {
    vec![
        block_card("Block TCP", "tcp", "red.400"),
        block_card("Block UDP", "udp", "warning.400"),
        forward_card("Forward TCP", "tcp", "emerald.600"),
        forward_card("Forward UDP", "udp", "emerald.400"),
        Card {
            title: "Forward to Site VPN Gateway",
            card_type: CardType::Action,
            description: "Forward traffic over a Site VPN",
            color: "purple.600",
            icon: "forward",
            hidden: false,
            params: vec![
                client_param(),
                ParamSpec::string("OriginalDstIP").describe("IP/CIDR"),
                ParamSpec::string("DstInterface").describe("Destination site (ex: site0)"),
            ],
            default_values: values(json!({
                "Client": "0.0.0.0",
                "OriginalDstIP": "0.0.0.0",
                "DstInterface": ""
            })),
            kind: CardKind::SiteVpnForward,
        },
        Card {
            title: "Set Device Groups",
            card_type: CardType::Action,
            description: "A device joins a group only when conditions are met",
            color: "cyan.500",
            icon: "object-group",
            hidden: false,
            params: vec![
                ParamSpec::string("Client"),
                ParamSpec::list("Groups").describe("Groups"),
            ],
            default_values: values(json!({ "Client": "", "Groups": [] })),
            kind: CardKind::SetGroups,
        },
        Card {
            title: "Set Device Tags",
            card_type: CardType::Action,
            description: "Assign device tags when conditions are met",
            color: "cyan.500",
            icon: "tags",
            hidden: false,
            params: vec![
                ParamSpec::string("Client"),
                ParamSpec::list("Tags").describe("Tags"),
            ],
            default_values: values(json!({ "Client": "", "Tags": [] })),
            kind: CardKind::SetTags,
        },
    ]
}

lazy_static! {
    /// Every card, triggers followed by actions, in declaration order.
    pub static ref CATALOG: Vec<Card> = {
        let mut cards = triggers();
        cards.extend(actions());
        cards
    };
}

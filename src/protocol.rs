// src/protocol.rs
use std::borrow::Cow;

/// IANA assigned internet protocol numbers the backend commonly reports.
const PROTOCOLS: &[(u32, &str)] = &[
    (1, "ICMP"),
    (2, "IGMP"),
    (6, "TCP"),
    (17, "UDP"),
    (47, "GRE"),
    (50, "ESP"),
    (51, "AH"),
];

pub fn protocol_name(number: Option<u32>) -> Cow<'static, str> {
    let Some(n) = number else {
        return Cow::Borrowed("Protocol N/A");
    };
    match PROTOCOLS.iter().find(|(p, _)| *p == n) {
        Some((_, name)) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Protocol {}", n)),
    }
}

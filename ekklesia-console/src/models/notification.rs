use serde::Deserialize;

/// Frame pushed by the backend over `/ws/notifications`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    #[serde(rename = "donation.created")]
    DonationCreated {
        #[serde(default)]
        donation_id: Option<i64>,
        #[serde(with = "crate::models::amount")]
        amount: f64,
        #[serde(default)]
        donation_type: Option<String>,
    },
    #[serde(rename = "event.created")]
    EventCreated {
        #[serde(default)]
        event_id: Option<i64>,
        name: String,
        #[serde(default)]
        capacity: Option<u32>,
    },
    #[serde(rename = "welcome")]
    Welcome {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "echo")]
    Echo {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl NotificationEvent {
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::DonationCreated { .. } => "donation.created",
            NotificationEvent::EventCreated { .. } => "event.created",
            NotificationEvent::Welcome { .. } => "welcome",
            NotificationEvent::Echo { .. } => "echo",
            NotificationEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_donation_created() {
        let event = NotificationEvent::parse(
            r#"{"type":"donation.created","amount":50000,"donation_type":"tithe"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            NotificationEvent::DonationCreated {
                donation_id: None,
                amount: 50000.0,
                donation_type: Some("tithe".to_string()),
            }
        );
    }

    #[test]
    fn parses_event_created_with_extra_fields() {
        let event = NotificationEvent::parse(
            r#"{"type":"event.created","event_id":3,"name":"Retiro juvenil","capacity":40}"#,
        )
        .unwrap();

        assert_eq!(event.kind(), "event.created");
    }

    #[test]
    fn unknown_type_maps_to_unknown() {
        let event = NotificationEvent::parse(r#"{"type":"expense.approved","id":9}"#).unwrap();
        assert_eq!(event, NotificationEvent::Unknown);
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(NotificationEvent::parse("not json").is_err());
        assert!(NotificationEvent::parse(r#"{"amount":10}"#).is_err());
        assert!(NotificationEvent::parse(r#"{"type":"donation.created"}"#).is_err());
    }
}

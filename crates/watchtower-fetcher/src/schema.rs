//! Agent card schema validation (spec.md §6). Unknown fields are ignored
//! by `serde_json`'s default behavior; we only reject malformed required
//! shape.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct AgentCard {
    #[serde(rename = "type")]
    card_type: String,
    name: String,
    services: Vec<AgentService>,
    active: bool,
    registrations: Vec<AgentRegistrationRef>,
    #[serde(rename = "supportedTrust")]
    supported_trust: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AgentService {
    #[allow(dead_code)]
    protocol: String,
    #[allow(dead_code)]
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct AgentRegistrationRef {
    #[allow(dead_code)]
    #[serde(rename = "agentRegistry")]
    agent_registry: String,
    #[allow(dead_code)]
    #[serde(rename = "agentId")]
    agent_id: String,
}

/// Validates `body` against the AgentCard schema. Returns `Ok(())` when
/// shape and constraints hold, `Err(reason)` otherwise.
pub fn validate_agent_card(body: &Value) -> Result<(), String> {
    let card: AgentCard = serde_json::from_value(body.clone()).map_err(|e| e.to_string())?;

    if card.card_type != "AgentRegistration" {
        return Err(format!("unexpected type: {}", card.card_type));
    }
    if card.name.len() > 128 {
        return Err("name exceeds 128 characters".to_string());
    }
    let _ = (&card.services, card.active, &card.registrations, &card.supported_trust);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_card() -> Value {
        json!({
            "type": "AgentRegistration",
            "name": "scout",
            "services": [{"protocol": "https", "endpoint": "https://example.com"}],
            "active": true,
            "registrations": [{"agentRegistry": "0xabc", "agentId": "1"}],
            "supportedTrust": ["reputation"]
        })
    }

    #[test]
    fn accepts_a_well_formed_card() {
        assert!(validate_agent_card(&valid_card()).is_ok());
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut card = valid_card();
        card.as_object_mut().unwrap().insert("extra".to_string(), json!("ignored"));
        assert!(validate_agent_card(&card).is_ok());
    }

    #[test]
    fn rejects_wrong_type() {
        let mut card = valid_card();
        card["type"] = json!("SomethingElse");
        assert!(validate_agent_card(&card).is_err());
    }

    #[test]
    fn rejects_name_over_128_chars() {
        let mut card = valid_card();
        card["name"] = json!("x".repeat(129));
        assert!(validate_agent_card(&card).is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        let mut card = valid_card();
        card.as_object_mut().unwrap().remove("services");
        assert!(validate_agent_card(&card).is_err());
    }
}

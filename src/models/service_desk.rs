use serde::Serialize;
use tracing::debug;

use super::ticket_request::TicketRequest;

/// Body of an import call against the service desk API.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeskPayload {
    pub import_handler_identifier: String,
    pub item_to_import: Vec<ImportItem>,
    pub generic_request_property: Vec<NamedProperty>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ImportItem {
    pub property: Vec<NamedProperty>,
}

/// Name/content pair. The service desk matches properties by name, the
/// order is kept stable anyway so payloads diff cleanly in logs.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NamedProperty {
    pub name: String,
    pub content: String,
}

impl NamedProperty {
    fn new(name: &str, content: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            content: content.into(),
        }
    }
}

impl ServiceDeskPayload {
    pub fn from_ticket_request(request: &TicketRequest, identifier: &str) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        let payload = Self {
            import_handler_identifier: identifier.to_string(),
            item_to_import: vec![ImportItem {
                property: vec![
                    NamedProperty::new("title", text(&request.title)),
                    NamedProperty::new("description", text(&request.description)),
                    NamedProperty::new("manager", text(&request.manager)),
                    NamedProperty::new("contact", text(&request.contact)),
                ],
            }],
            generic_request_property: vec![NamedProperty::new(
                "additionalNotes",
                format!(
                    "Exported from Teams conversation with {} messages",
                    request.message_count()
                ),
            )],
        };
        debug!("Service desk payload: {:?}", payload);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticket_request::Message;
    use serde_json::json;

    fn names_and_contents(payload: &ServiceDeskPayload) -> Vec<(&str, &str)> {
        payload.item_to_import[0]
            .property
            .iter()
            .map(|p| (p.name.as_str(), p.content.as_str()))
            .collect()
    }

    #[test]
    fn serializes_to_import_schema() {
        let request = TicketRequest {
            title: Some("VPN down".to_string()),
            description: Some("No tunnel since 9am".to_string()),
            manager: Some("lead@example.com".to_string()),
            contact: Some("user@example.com".to_string()),
            messages: Some(vec![Message::default(), Message::default()]),
        };

        let payload = ServiceDeskPayload::from_ticket_request(&request, "teams2go");

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "importHandlerIdentifier": "teams2go",
                "itemToImport": [{
                    "property": [
                        {"name": "title", "content": "VPN down"},
                        {"name": "description", "content": "No tunnel since 9am"},
                        {"name": "manager", "content": "lead@example.com"},
                        {"name": "contact", "content": "user@example.com"}
                    ]
                }],
                "genericRequestProperty": [
                    {"name": "additionalNotes", "content": "Exported from Teams conversation with 2 messages"}
                ]
            })
        );
    }

    #[test]
    fn missing_fields_render_as_empty_strings_in_fixed_order() {
        let partials = [
            TicketRequest::default(),
            TicketRequest {
                title: Some("only title".to_string()),
                ..Default::default()
            },
            TicketRequest {
                manager: Some("m".to_string()),
                contact: Some("c".to_string()),
                ..Default::default()
            },
        ];

        for request in &partials {
            let payload = ServiceDeskPayload::from_ticket_request(request, "id");
            let props = names_and_contents(&payload);
            let names: Vec<&str> = props.iter().map(|(name, _)| *name).collect();
            assert_eq!(names, ["title", "description", "manager", "contact"]);
            assert_eq!(props[0].1, request.title.as_deref().unwrap_or(""));
            assert_eq!(props[1].1, request.description.as_deref().unwrap_or(""));
            assert_eq!(props[2].1, request.manager.as_deref().unwrap_or(""));
            assert_eq!(props[3].1, request.contact.as_deref().unwrap_or(""));
        }
    }

    #[test]
    fn note_counts_messages() {
        for n in [0, 1, 7] {
            let request = TicketRequest {
                messages: Some(vec![Message::default(); n]),
                ..Default::default()
            };
            let payload = ServiceDeskPayload::from_ticket_request(&request, "id");
            let note = &payload.generic_request_property[0];
            assert_eq!(note.name, "additionalNotes");
            assert!(note.content.contains(&format!("{n} messages")));
        }
    }

    #[test]
    fn building_is_deterministic() {
        let request = TicketRequest {
            title: Some("same".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ServiceDeskPayload::from_ticket_request(&request, "id"),
            ServiceDeskPayload::from_ticket_request(&request, "id")
        );
    }
}

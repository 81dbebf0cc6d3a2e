use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u32,
    /// Length of the treatment in minutes.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub service_ids: Vec<String>,
}

impl Professional {
    pub fn offers(&self, service_id: &str) -> bool {
        self.service_ids.iter().any(|id| id == service_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_professional_offers() {
        let pro = Professional {
            id: "p3".to_string(),
            name: "Sofia Rodriguez".to_string(),
            title: "Esthetician".to_string(),
            image_url: None,
            bio: None,
            service_ids: vec!["s3".to_string(), "s4".to_string()],
        };
        assert!(pro.offers("s4"));
        assert!(!pro.offers("s2"));
    }

    #[test]
    fn test_service_wire_format_is_camel_case() {
        let json = r#"{"id":"s2","name":"Brazilian Wax","description":"d","price":75,"duration":30,"imageUrl":"/placeholder.svg"}"#;
        let service: Service = serde_json::from_str(json).unwrap();
        assert_eq!(service.image_url.as_deref(), Some("/placeholder.svg"));

        let out = serde_json::to_value(&service).unwrap();
        assert_eq!(out["imageUrl"], "/placeholder.svg");
        assert!(out.get("image_url").is_none());
    }

    #[test]
    fn test_professional_parses_without_optional_fields() {
        let json = r#"{"id":"p1","name":"Emma Johnson","title":"Senior Wax Specialist","serviceIds":["s1"]}"#;
        let pro: Professional = serde_json::from_str(json).unwrap();
        assert!(pro.bio.is_none());
        assert_eq!(pro.service_ids, vec!["s1"]);
    }
}

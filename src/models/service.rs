use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub duration_hours: Option<i64>,
    pub features: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl Service {
    /// Features are stored as a JSON array of strings. Malformed or
    /// missing data becomes an empty list rather than an error.
    pub fn feature_list(&self) -> Vec<String> {
        self.features
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(features: Option<&str>) -> Service {
        Service {
            id: 1,
            name: "wedding-basic".to_string(),
            display_name: Some("Wedding Basic".to_string()),
            description: None,
            price: 25000,
            duration_hours: Some(6),
            features: features.map(|f| f.to_string()),
            is_active: true,
            created_at: "2025-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn feature_list_parses_json_array() {
        let s = service(Some(r#"["Drone Coverage","Premium Album"]"#));
        assert_eq!(s.feature_list(), vec!["Drone Coverage", "Premium Album"]);
    }

    #[test]
    fn feature_list_tolerates_missing_or_broken_data() {
        assert!(service(None).feature_list().is_empty());
        assert!(service(Some("not json")).feature_list().is_empty());
    }
}

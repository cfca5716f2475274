use serde::{Deserialize, Serialize};

/// One directory entry as returned by the `/users` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
}

impl Subject {
    /// The join key against the usage report, when the directory has one.
    pub fn principal_name(&self) -> Option<&str> {
        self.user_principal_name
            .as_deref()
            .filter(|upn| !upn.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_graph_user() {
        let json = r#"{
            "id": "0b1c",
            "displayName": "Ana Torres",
            "userPrincipalName": "ana@contoso.com"
        }"#;
        let subject: Subject = serde_json::from_str(json).unwrap();
        assert_eq!(subject.id, "0b1c");
        assert_eq!(subject.principal_name(), Some("ana@contoso.com"));
        assert!(subject.mail.is_none());
    }

    #[test]
    fn blank_principal_name_is_absent() {
        let subject = Subject {
            id: "1".into(),
            display_name: None,
            user_principal_name: Some("  ".into()),
            mail: None,
        };
        assert!(subject.principal_name().is_none());
    }
}

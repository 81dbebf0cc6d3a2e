use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field name to message, one entry per failing field.
pub type ValidationErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"))
}

impl CustomerInfo {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name".to_string(), "Name is required".to_string());
        }

        if self.email.trim().is_empty() {
            errors.insert("email".to_string(), "Email is required".to_string());
        } else if !email_pattern().is_match(&self.email) {
            errors.insert("email".to_string(), "Email is invalid".to_string());
        }

        if self.phone.trim().is_empty() {
            errors.insert("phone".to_string(), "Phone number is required".to_string());
        } else if self.phone.chars().filter(|c| c.is_ascii_digit()).count() != 10 {
            errors.insert(
                "phone".to_string(),
                "Phone number must be 10 digits".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

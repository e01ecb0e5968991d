use std::fmt;

use serde::{Deserialize, Serialize};

/// Gender attribute used by channel access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached projection of the signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub country: String,
    pub gender: Gender,
    /// ISO-8601 date of birth, as stored by signup.
    pub dob: String,
}

impl User {
    /// Name shown on outgoing messages: the profile name, or the local part of
    /// the email when no name is set.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        self.email.split('@').next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str) -> User {
        User {
            id: "u1".into(),
            email: email.into(),
            name: name.into(),
            country: "Egypt".into(),
            gender: Gender::Male,
            dob: "1990-01-01".into(),
        }
    }

    #[test]
    fn display_name_prefers_profile_name() {
        assert_eq!(user("Ali", "ali@example.com").display_name(), "Ali");
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        assert_eq!(user("", "yusuf.k@example.com").display_name(), "yusuf.k");
    }

    #[test]
    fn gender_serializes_capitalized() {
        let s = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(s, "\"Female\"");
    }
}

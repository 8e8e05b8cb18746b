//! User entity and sign-in profile merging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Email;
use crate::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verification_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Identity data reported by a sign-in method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub email: Option<Email>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub email_verified: bool,
}

impl User {
    pub fn from_profile(profile: UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: profile.name,
            email: profile.email,
            image: profile.image,
            email_verification_time: profile.email_verified.then_some(now),
            created_at: now,
        }
    }

    /// Apply a profile to the user who is already signed in with this
    /// method. Present fields overwrite stored ones. Returns whether
    /// anything changed.
    pub fn apply_profile(&mut self, profile: &UserProfile, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(name) = &profile.name {
            self.name = Some(name.clone());
            changed = true;
        }
        if let Some(image) = &profile.image {
            self.image = Some(image.clone());
            changed = true;
        }
        if profile.email_verified {
            self.email_verification_time = Some(now);
            changed = true;
        }
        changed
    }

    /// Link a profile from a different sign-in method that shares this
    /// user's e-mail. Only missing fields are filled in.
    pub fn link_profile(&mut self, profile: &UserProfile, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if self.name.is_none() {
            if let Some(name) = profile.name.as_ref().filter(|n| !n.is_empty()) {
                self.name = Some(name.clone());
                changed = true;
            }
        }
        if self.image.is_none() {
            if let Some(image) = profile.image.as_ref().filter(|i| !i.is_empty()) {
                self.image = Some(image.clone());
                changed = true;
            }
        }
        if profile.email_verified && self.email_verification_time.is_none() {
            self.email_verification_time = Some(now);
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()
    }

    fn existing() -> User {
        User {
            id: UserId::new(),
            name: Some("Anna".into()),
            email: Some(Email::new("anna@example.com").unwrap()),
            image: None,
            email_verification_time: None,
            created_at: now(),
        }
    }

    #[test]
    fn apply_profile_overwrites_present_fields() {
        let mut user = existing();
        let changed = user.apply_profile(
            &UserProfile {
                name: Some("Anna K".into()),
                email_verified: true,
                ..Default::default()
            },
            now(),
        );
        assert!(changed);
        assert_eq!(user.name.as_deref(), Some("Anna K"));
        assert_eq!(user.email_verification_time, Some(now()));
    }

    #[test]
    fn apply_empty_profile_changes_nothing() {
        let mut user = existing();
        assert!(!user.apply_profile(&UserProfile::default(), now()));
    }

    #[test]
    fn link_profile_only_fills_gaps() {
        let mut user = existing();
        let changed = user.link_profile(
            &UserProfile {
                name: Some("Someone Else".into()),
                image: Some("https://img/anna.png".into()),
                ..Default::default()
            },
            now(),
        );
        assert!(changed);
        assert_eq!(user.name.as_deref(), Some("Anna"));
        assert_eq!(user.image.as_deref(), Some("https://img/anna.png"));
    }

    #[test]
    fn link_keeps_first_verification_time() {
        let mut user = existing();
        user.email_verification_time = Some(now());
        let later = now() + chrono::Duration::days(1);
        let changed = user.link_profile(
            &UserProfile {
                email_verified: true,
                ..Default::default()
            },
            later,
        );
        assert!(!changed);
        assert_eq!(user.email_verification_time, Some(now()));
    }

    #[test]
    fn new_user_from_verified_profile() {
        let user = User::from_profile(
            UserProfile {
                email: Some(Email::new("new@example.com").unwrap()),
                email_verified: true,
                ..Default::default()
            },
            now(),
        );
        assert_eq!(user.email_verification_time, Some(now()));
        assert!(user.name.is_none());
    }
}

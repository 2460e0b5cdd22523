use std::collections::HashMap;

/// Attribute names consulted when extracting an identity from an OIDC
/// principal's claim set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalAttributes {
    pub preferred_username_attribute: String,
    pub email_attribute: String,
}

impl Default for PrincipalAttributes {
    fn default() -> Self {
        Self {
            preferred_username_attribute: "preferred_username".to_string(),
            email_attribute: "email".to_string(),
        }
    }
}

/// The recognized shapes an authenticated request principal can take.
/// Each variant carries its own identity-extraction logic; resolution
/// happens once and the canonical username is used everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// OIDC/OAuth2 principal carrying a claim map.
    Oidc { attributes: HashMap<String, String> },
    /// Bare username, as carried by an already-established session.
    Username(String),
    /// Generic user-details principal with granted authorities.
    Details {
        username: String,
        authorities: Vec<String>,
    },
}

impl Principal {
    pub fn username<'a>(&'a self, attrs: &PrincipalAttributes) -> Option<&'a str> {
        match self {
            Principal::Oidc { attributes } => attributes
                .get(&attrs.preferred_username_attribute)
                .or_else(|| attributes.get(&attrs.email_attribute))
                .map(String::as_str),
            Principal::Username(name) => Some(name),
            Principal::Details { username, .. } => Some(username),
        }
    }

    /// First granted authority, used when roles are sourced from the
    /// directory instead of the cached user record.
    pub fn first_authority(&self) -> Option<&str> {
        match self {
            Principal::Details { authorities, .. } => authorities.first().map(String::as_str),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oidc_principal_prefers_username_attribute() {
        let principal = Principal::Oidc {
            attributes: HashMap::from([
                ("preferred_username".to_string(), "alice".to_string()),
                ("email".to_string(), "alice@example.com".to_string()),
            ]),
        };

        assert_eq!(
            principal.username(&PrincipalAttributes::default()),
            Some("alice")
        );
    }

    #[test]
    fn oidc_principal_falls_back_to_email() {
        let principal = Principal::Oidc {
            attributes: HashMap::from([(
                "email".to_string(),
                "bob@example.com".to_string(),
            )]),
        };

        assert_eq!(
            principal.username(&PrincipalAttributes::default()),
            Some("bob@example.com")
        );
    }

    #[test]
    fn oidc_principal_without_identity_claims_is_anonymous() {
        let principal = Principal::Oidc {
            attributes: HashMap::new(),
        };

        assert_eq!(principal.username(&PrincipalAttributes::default()), None);
    }

    #[test]
    fn plain_and_details_principals_carry_usernames() {
        let attrs = PrincipalAttributes::default();

        let plain = Principal::Username("carol".to_string());
        assert_eq!(plain.username(&attrs), Some("carol"));

        let details = Principal::Details {
            username: "dave".to_string(),
            authorities: vec!["ADMIN".to_string()],
        };
        assert_eq!(details.username(&attrs), Some("dave"));
    }

    #[test]
    fn first_authority_only_exists_for_details() {
        let details = Principal::Details {
            username: "dave".to_string(),
            authorities: vec!["ADMIN".to_string(), "USER".to_string()],
        };
        assert_eq!(details.first_authority(), Some("ADMIN"));

        let empty = Principal::Details {
            username: "erin".to_string(),
            authorities: vec![],
        };
        assert_eq!(empty.first_authority(), None);

        assert_eq!(Principal::Username("x".to_string()).first_authority(), None);
    }

    #[test]
    fn custom_attribute_names_are_honored() {
        let attrs = PrincipalAttributes {
            preferred_username_attribute: "upn".to_string(),
            email_attribute: "mail".to_string(),
        };
        let principal = Principal::Oidc {
            attributes: HashMap::from([("upn".to_string(), "frank".to_string())]),
        };

        assert_eq!(principal.username(&attrs), Some("frank"));
    }
}

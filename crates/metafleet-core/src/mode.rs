use serde::Deserialize;

/// How login credentials are verified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationMode {
    /// Credentials are held in the node-local credential store.
    #[default]
    Local,
    /// Credentials are verified against an external directory; unknown
    /// users are provisioned from it on first login.
    Directory,
}

/// Where the fleet is running. Hosted deployments gate logins behind a
/// captcha check before any credential lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    OnPremise,
    Hosted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_default_to_local_on_premise() {
        assert_eq!(AuthenticationMode::default(), AuthenticationMode::Local);
        assert_eq!(DeploymentMode::default(), DeploymentMode::OnPremise);
    }

    #[test]
    fn modes_deserialize_from_lowercase() {
        #[derive(Deserialize)]
        struct Holder {
            auth: AuthenticationMode,
            deployment: DeploymentMode,
        }

        let holder: Holder =
            serde_json::from_str(r#"{"auth": "directory", "deployment": "hosted"}"#).unwrap();

        assert_eq!(holder.auth, AuthenticationMode::Directory);
        assert_eq!(holder.deployment, DeploymentMode::Hosted);
    }
}

use std::sync::Arc;

use metafleet_auth::{AuthFailure, AuthOutcome, LoginFailureHandler, LoginSuccessHandler};

use crate::audit;
use crate::metrics::Metrics;

/// Records every login outcome in the metrics and the audit stream.
/// Registered on the orchestrator so each attempt is counted exactly once,
/// regardless of which path resolved it.
pub struct LoginObserver {
    metrics: Arc<Metrics>,
}

impl LoginObserver {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl LoginSuccessHandler for LoginObserver {
    fn on_success(&self, outcome: &AuthOutcome) {
        match outcome {
            AuthOutcome::Success(identity) => {
                self.metrics.record_login_success();
                audit::audit_login_success(&identity.username, identity.tenant_id, &identity.role);
            }
            AuthOutcome::ProvisioningRequired { username } => {
                self.metrics.record_login_provisioning();
                audit::audit_login_provisioning(username);
            }
        }
    }
}

impl LoginFailureHandler for LoginObserver {
    fn on_failure(&self, username: &str, failure: &AuthFailure) {
        self.metrics.record_login_failure();
        audit::audit_login_failure(username, &failure.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metafleet_auth::VerifiedIdentity;
    use metafleet_core::tenant::TenantId;

    #[test]
    fn observer_counts_every_login_outcome() {
        let metrics = Arc::new(Metrics::new());
        let observer = LoginObserver::new(Arc::clone(&metrics));

        observer.on_success(&AuthOutcome::Success(VerifiedIdentity {
            username: "alice".to_string(),
            role: "USER".to_string(),
            tenant_id: TenantId::new(1),
            team_id: 1,
        }));
        observer.on_success(&AuthOutcome::ProvisioningRequired {
            username: "newcomer".to_string(),
        });
        observer.on_failure("bob", &AuthFailure::InvalidCredentials);
        observer.on_failure("bob", &AuthFailure::CaptchaRejected);

        assert_eq!(metrics.logins_success(), 1);
        assert_eq!(metrics.logins_provisioning(), 1);
        assert_eq!(metrics.logins_failed(), 2);
    }
}

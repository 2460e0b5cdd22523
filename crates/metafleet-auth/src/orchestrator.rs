use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use metafleet_cache::{CredentialStore, MetadataSource, TenantCacheStore};
use metafleet_core::mode::{AuthenticationMode, DeploymentMode};
use metafleet_core::tenant::TenantId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("captcha verification failed")]
    CaptchaRejected,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user is not registered with any tenant")]
    UnknownUser,

    #[error("directory is not configured")]
    DirectoryUnavailable,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha_token: Option<String>,
}

/// Identity established by a successful login, resolved against the cached
/// user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub username: String,
    pub role: String,
    pub tenant_id: TenantId,
    pub team_id: i32,
}

/// What a login attempt produced. A provisioning outcome is not a
/// rejection: no tenant knows the user yet, so the attempt resolves
/// through the success path and the caller steers them into registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(VerifiedIdentity),
    ProvisioningRequired { username: String },
}

/// Gate applied before any credential lookup in hosted deployments.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Verification errors fail closed and return `false`.
    async fn verify(&self, token: Option<&str>) -> bool;
}

/// Passes every request. The on-premise default, and the hosted fallback
/// when no verifier is configured.
pub struct AllowAllCaptcha;

#[async_trait]
impl CaptchaVerifier for AllowAllCaptcha {
    async fn verify(&self, _token: Option<&str>) -> bool {
        true
    }
}

/// Identity asserted by an external directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryIdentity {
    pub username: String,
    pub authorities: Vec<String>,
}

#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// `Ok(None)` means the directory rejected the credentials.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryIdentity>, AuthFailure>;
}

/// Placeholder wired when directory mode is selected without a provider.
pub struct UnconfiguredDirectory;

#[async_trait]
impl DirectoryProvider for UnconfiguredDirectory {
    async fn authenticate(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<Option<DirectoryIdentity>, AuthFailure> {
        Err(AuthFailure::DirectoryUnavailable)
    }
}

pub trait LoginSuccessHandler: Send + Sync {
    fn on_success(&self, outcome: &AuthOutcome);
}

pub trait LoginFailureHandler: Send + Sync {
    fn on_failure(&self, username: &str, failure: &AuthFailure);
}

/// Drives a login attempt through captcha gating, credential verification
/// and identity resolution. Exactly one set of configured handlers fires
/// per attempt, on every exit path: rejections go through the failure
/// handlers, everything else (provisioning included) through the success
/// handlers.
pub struct AuthenticationOrchestrator<S> {
    store: Arc<TenantCacheStore<S>>,
    credentials: Arc<CredentialStore>,
    captcha: Arc<dyn CaptchaVerifier>,
    directory: Arc<dyn DirectoryProvider>,
    auth_mode: AuthenticationMode,
    deployment_mode: DeploymentMode,
    /// Take the role from the directory's first granted authority instead
    /// of the cached user record.
    directory_authority: bool,
    success_handlers: Vec<Arc<dyn LoginSuccessHandler>>,
    failure_handlers: Vec<Arc<dyn LoginFailureHandler>>,
}

impl<S: MetadataSource> AuthenticationOrchestrator<S> {
    pub fn new(
        store: Arc<TenantCacheStore<S>>,
        credentials: Arc<CredentialStore>,
        auth_mode: AuthenticationMode,
        deployment_mode: DeploymentMode,
    ) -> Self {
        Self {
            store,
            credentials,
            captcha: Arc::new(AllowAllCaptcha),
            directory: Arc::new(UnconfiguredDirectory),
            auth_mode,
            deployment_mode,
            directory_authority: false,
            success_handlers: Vec::new(),
            failure_handlers: Vec::new(),
        }
    }

    pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = captcha;
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn DirectoryProvider>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_directory_authority(mut self, enabled: bool) -> Self {
        self.directory_authority = enabled;
        self
    }

    pub fn on_success(mut self, handler: Arc<dyn LoginSuccessHandler>) -> Self {
        self.success_handlers.push(handler);
        self
    }

    pub fn on_failure(mut self, handler: Arc<dyn LoginFailureHandler>) -> Self {
        self.failure_handlers.push(handler);
        self
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthOutcome, AuthFailure> {
        if self.deployment_mode == DeploymentMode::Hosted
            && !self.captcha.verify(request.captcha_token.as_deref()).await
        {
            return Err(self.fail(&request.username, AuthFailure::CaptchaRejected));
        }

        match self.auth_mode {
            AuthenticationMode::Directory => self.login_directory(request).await,
            AuthenticationMode::Local => self.login_local(request),
        }
    }

    async fn login_directory(&self, request: &LoginRequest) -> Result<AuthOutcome, AuthFailure> {
        // Cache presence decides the branch before any directory round
        // trip: a user no tenant knows is steered into registration, not
        // verified and not rejected.
        let Some(user) = self.store.user(&request.username) else {
            debug!(
                username = %request.username,
                "user has no tenant record, provisioning required"
            );
            return Ok(self.succeed(AuthOutcome::ProvisioningRequired {
                username: request.username.clone(),
            }));
        };

        let asserted = match self
            .directory
            .authenticate(&request.username, &request.password)
            .await
        {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                return Err(self.fail(&request.username, AuthFailure::InvalidCredentials));
            }
            Err(failure) => return Err(self.fail(&request.username, failure)),
        };

        let role = if self.directory_authority {
            asserted
                .authorities
                .first()
                .cloned()
                .unwrap_or_else(|| user.role.clone())
        } else {
            user.role.clone()
        };

        Ok(self.succeed(AuthOutcome::Success(VerifiedIdentity {
            username: user.username,
            role,
            tenant_id: user.tenant_id,
            team_id: user.team_id,
        })))
    }

    fn login_local(&self, request: &LoginRequest) -> Result<AuthOutcome, AuthFailure> {
        let Some(role) = self.credentials.verify(&request.username, &request.password) else {
            return Err(self.fail(&request.username, AuthFailure::InvalidCredentials));
        };

        let Some(user) = self.store.user(&request.username) else {
            return Err(self.fail(&request.username, AuthFailure::UnknownUser));
        };

        Ok(self.succeed(AuthOutcome::Success(VerifiedIdentity {
            username: user.username,
            role,
            tenant_id: user.tenant_id,
            team_id: user.team_id,
        })))
    }

    fn succeed(&self, outcome: AuthOutcome) -> AuthOutcome {
        for handler in &self.success_handlers {
            handler.on_success(&outcome);
        }
        outcome
    }

    fn fail(&self, username: &str, failure: AuthFailure) -> AuthFailure {
        for handler in &self.failure_handlers {
            handler.on_failure(username, &failure);
        }
        failure
    }
}

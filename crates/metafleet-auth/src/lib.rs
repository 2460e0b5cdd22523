//! Login orchestration and request authorization over the tenant caches.

pub mod context;
pub mod evaluator;
pub mod orchestrator;

pub use context::{CapabilityFlags, LoginContext, build_login_context};
pub use evaluator::AuthorizationEvaluator;
pub use orchestrator::{
    AllowAllCaptcha, AuthFailure, AuthOutcome, AuthenticationOrchestrator, CaptchaVerifier,
    DirectoryIdentity, DirectoryProvider, LoginFailureHandler, LoginRequest, LoginSuccessHandler,
    UnconfiguredDirectory, VerifiedIdentity,
};

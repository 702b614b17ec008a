//! Authentication state and allow-list authorization for balloon-gate.
//!
//! This crate provides:
//! - Session state as reported by an identity provider (`SessionState`, `Session`)
//! - The allow-list of authorized emails (`AllowList`)
//! - The authorization gate that turns both into a UI decision (`AuthorizationGate`)
//! - The client trait the gate uses to read sessions and force logout
//!
//! # Access Control Model
//!
//! A user sees protected content only when the identity provider has
//! authenticated them and their email is on the allow-list, matched
//! exactly. Everything else fails closed. An authenticated user who is not
//! on the list is logged out in the same render that reports the denial.
//!
//! # Example
//!
//! ```
//! use balloon_gate_access::{AllowList, Decision, Identity, SessionState, evaluate};
//!
//! let allow_list: AllowList = ["a@x.com"].into_iter().collect();
//! let state = SessionState::Authenticated {
//!     identity: Identity::new("A").with_email(Some("a@x.com".to_string())),
//! };
//!
//! let evaluation = evaluate(&state, &allow_list);
//! assert!(evaluation.decision.is_authorized());
//! assert!(evaluation.side_effect.is_none());
//!
//! let evaluation = evaluate(&SessionState::NotAttempted, &allow_list);
//! assert_eq!(evaluation.decision, Decision::Unauthenticated);
//! ```

pub mod allow_list;
pub mod error;
pub mod gate;
pub mod identity;
pub mod oidc;
pub mod provider;
pub mod session;

// Re-export main types at crate root
pub use allow_list::AllowList;
pub use error::{ConfigLoadError, IdentityProviderError, MissingIdentityField};
pub use gate::{AuthorizationGate, Decision, DenialReason, Evaluation, SideEffect, evaluate};
pub use identity::Identity;
pub use oidc::OidcConfig;
pub use provider::IdentityProviderClient;
pub use session::{Session, SessionState};

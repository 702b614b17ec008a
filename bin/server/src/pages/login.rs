//! Login, denial and error page components.

use balloon_gate_access::DenialReason;
use leptos::prelude::*;

/// Login prompt with a link into the provider flow.
///
/// `failed` adds the message for a login that did not complete.
#[component]
pub fn LoginPage(failed: bool) -> impl IntoView {
    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"🎈 My Super Secret App"</h1>
                {failed.then(|| view! {
                    <p class="error">
                        "Login failed. Please check if your email is authorized or try again."
                    </p>
                })}
                <p>"Please log in using the button below to access the application."</p>
                <a href="/auth/login" class="login-button">"Sign in with Google"</a>
            </div>
        </div>
    }
}

/// Shown after the gate turned an authenticated user away.
#[component]
pub fn AccessDeniedPage(reason: DenialReason) -> impl IntoView {
    let message = match &reason {
        DenialReason::MissingEmail(_) => {
            "Your account did not provide a verified email address.".to_string()
        }
        DenialReason::NotAllowListed { email } => {
            format!("{email} is not authorized to use this application.")
        }
    };

    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Access denied"</h1>
                <p class="error">{message}</p>
                <p>"You have been logged out."</p>
                <a href="/auth/login" class="login-button">
                    "Sign in with a different account"
                </a>
            </div>
        </div>
    }
}

/// Shown when no identity provider could be set up at startup.
#[component]
pub fn AuthenticatorUnavailablePage() -> impl IntoView {
    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"🎈 My Super Secret App"</h1>
                <p class="error">
                    "Authenticator could not be initialized. Check logs or configuration."
                </p>
            </div>
        </div>
    }
}

//! Home page component, shown only to allow-listed users.

use balloon_gate_access::Identity;
use leptos::prelude::*;

/// The protected content page.
#[component]
pub fn HomePage(identity: Identity, show_balloons: bool) -> impl IntoView {
    let greeting = format!("Welcome, {}!", identity.display_name());
    let avatar = identity
        .avatar_url()
        .map(|url| view! { <img class="avatar" src=url.to_string() alt=""/> });

    view! {
        <div class="home-page">
            <aside class="sidebar">
                {avatar}
                <p class="user-name">{greeting}</p>
                <a href="/auth/logout" class="logout-button">"Logout"</a>
            </aside>
            <div class="content">
                <h1>"🎈 My Super Secret App"</h1>
                <p>"You are successfully logged in!"</p>
                <a href="/balloons" class="cta-button">"Show Balloons!"</a>
                {show_balloons.then(|| view! { <Balloons/> })}
                <p class="info">
                    "This content is only visible after successful Google authentication."
                </p>
            </div>
        </div>
    }
}

#[component]
fn Balloons() -> impl IntoView {
    view! {
        <div class="balloons" aria-hidden="true">"🎈🎈🎈🎈🎈"</div>
        <p class="success">"Woohoo! Balloons!"</p>
    }
}

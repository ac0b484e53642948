//! Walks the full AuthSub flow against the live service: print the request
//! URL, paste the callback URL back in, exchange for a session token, then
//! query and revoke it.
//!
//! ```sh
//! NEXT_URL=https://www.example.com/next \
//! SCOPE_URL=https://www.google.com/calendar/feeds \
//! cargo run --example session_token --features http-client-reqwest
//! ```

use std::io::{BufRead as _, Write as _};

use authsub::{AuthSubSession, prelude::*};
use snafu::prelude::*;

#[snafu::report]
#[tokio::main]
pub async fn main() -> Result<(), snafu::Whatever> {
    let next_url = std::env::var("NEXT_URL").whatever_context("Failed to get NEXT_URL")?;
    let scope_url = std::env::var("SCOPE_URL").whatever_context("Failed to get SCOPE_URL")?;

    let http_client = reqwest::Client::new();

    let mut session = AuthSubSession::builder()
        .next_url(next_url)
        .scope(scope_url)
        .session(true)
        .build();

    let request_url = session
        .request_url()
        .whatever_context("Failed to build the request URL")?;
    println!("Authorize here:\n  {request_url}");
    print!("Paste the callback URL you were redirected to: ");
    std::io::stdout()
        .flush()
        .whatever_context("Failed to flush stdout")?;

    let mut callback = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut callback)
        .whatever_context("Failed to read the callback URL")?;
    session
        .receive_token(callback.trim())
        .whatever_context("Callback URL did not parse")?;

    session
        .request_session_token(&http_client)
        .await
        .whatever_context("Failed to exchange for a session token")?;
    println!(
        "Session token: {}",
        session.token().expect("token was just stored").expose_secret()
    );

    let info = session
        .token_info(&http_client)
        .await
        .whatever_context("Failed to query token info")?;
    println!("Target: {}", info.target);
    println!("Scope:  {}", info.scope);
    println!("Secure: {}", info.secure);

    if session.revoke_token(&http_client).await {
        println!("Token revoked.");
    } else {
        println!("Revocation failed; the token is still live.");
    }

    Ok(())
}

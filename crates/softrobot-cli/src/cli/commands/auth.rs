//! Account and session commands (not retried).

use anyhow::Result;
use softrobot_core::client::Credentials;
use softrobot_core::token::TokenProvider;

use super::{print_json, Session};

/// `softrobot login`: store the returned token for later calls.
pub async fn run_login(session: &Session, email: String, password: String) -> Result<()> {
    let token = session
        .client
        .login(&Credentials { email, password })
        .await?;
    session.tokens.save(&token.access_token)?;
    println!("Logged in; token saved to {}", session.tokens.path().display());
    Ok(())
}

pub async fn run_register(session: &Session, email: String, password: String) -> Result<()> {
    let user = session
        .client
        .register(&Credentials { email, password })
        .await?;
    println!("Registered {} (id {}). Check your inbox to verify the address.", user.email, user.id);
    Ok(())
}

pub async fn run_verify_email(session: &Session, token: &str) -> Result<()> {
    print_json(&session.client.verify_email(token).await?)
}

pub async fn run_me(session: &Session) -> Result<()> {
    print_json(&session.client.current_user().await?)
}

/// `softrobot logout`: local only, the backend keeps no session state.
pub fn run_logout(session: &Session) -> Result<()> {
    session.tokens.clear();
    println!("Logged out.");
    Ok(())
}

pub async fn run_delete_account(session: &Session) -> Result<()> {
    session.client.delete_account().await?;
    session.tokens.clear();
    println!("Account deleted.");
    Ok(())
}

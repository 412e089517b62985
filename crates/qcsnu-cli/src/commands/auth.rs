//! Auth command implementation.
//!
//! Log in with a username and password, check the saved token, log out.

use anyhow::{Context, Result};
use console::style;

use qcsnu_client::ErrorKind;

use super::common::{ServiceArgs, TokenStore, connect, spinner};

/// Execute the auth login subcommand.
pub async fn execute_login(service: &ServiceArgs, username: &str, password: &str) -> Result<()> {
    let mut client = connect(service)?;

    println!(
        "{} Logging in to {} as {}",
        style("→").cyan().bold(),
        style(client.base_url()).yellow(),
        style(username).green()
    );

    let progress = spinner("Requesting token...")?;
    let login = client.login(username, password).await;
    progress.finish_and_clear();
    login?;

    let token = client
        .token()
        .context("Service accepted the login but returned no token")?;
    let store = TokenStore::default_location()?;
    store.save(token.expose())?;

    println!("{} Logged in", style("✓").green().bold());
    println!("  Token saved to {}", style(store.path().display()).dim());
    Ok(())
}

/// Execute the auth status subcommand.
pub async fn execute_status(service: &ServiceArgs) -> Result<()> {
    let client = connect(service)?;

    if !client.is_authenticated() {
        println!(
            "{} Not logged in. Run 'qcsnu auth login -u <username>'.",
            style("✗").red()
        );
        return Ok(());
    }

    match client.list_backends().await {
        Ok(_) => {
            println!(
                "{} Token accepted by {}",
                style("✓").green().bold(),
                style(client.base_url()).yellow()
            );
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::Authentication => {
            println!(
                "{} Token rejected by {}. Log in again.",
                style("✗").red(),
                style(client.base_url()).yellow()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute the auth logout subcommand.
pub fn execute_logout() -> Result<()> {
    let store = TokenStore::default_location()?;
    if store.remove()? {
        println!("{} Saved token removed", style("✓").green().bold());
    } else {
        println!("  No saved token at {}", style(store.path().display()).dim());
    }
    Ok(())
}

use anyhow::Result;

use crate::provider::{CalendarSink, Provider};

pub async fn run(provider_name: &str) -> Result<()> {
    let provider = Provider::from_name(provider_name);

    println!("Authenticating with {}...", provider.name());

    // Provider handles the OAuth flow and stores credentials/tokens
    let account = provider.ensure_authenticated().await?;

    println!("Authenticated as: {}\n", account);
    println!("Run `taskcal run` to schedule your tasks.");

    Ok(())
}

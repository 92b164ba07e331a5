use anyhow::Result;

use crate::session::Session;

/// Returns the account identifier of the (possibly refreshed) session.
pub async fn handle() -> Result<String> {
    let session = Session::ensure_authenticated().await?;
    Ok(session.account().to_string())
}

//! API key command handlers

use crate::clients::registry::Registry;
use crate::controller::Controller;
use crate::credential::{CredentialStore, mask};
use anyhow::Context;

pub async fn cmd_key_set<R: Registry>(
    controller: &Controller<R>,
    value: &str,
) -> anyhow::Result<()> {
    controller
        .save_credential(value.trim())
        .await
        .context("Failed to save API key")?;
    println!("✓ API key saved");
    Ok(())
}

pub async fn cmd_key_clear<R: Registry>(controller: &Controller<R>) -> anyhow::Result<()> {
    controller
        .save_credential("")
        .await
        .context("Failed to clear API key")?;
    println!("✓ API key cleared; requests will be sent without a key");
    Ok(())
}

pub fn cmd_key_show(store: &dyn CredentialStore) {
    let key = store.get();
    if key.is_empty() {
        println!("No API key stored.");
        println!("Save one with: license-admin key set <value>");
    } else {
        println!("API key: {}", mask(&key));
    }
}

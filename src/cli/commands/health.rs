use crate::clients::registry::RegistryClient;

pub async fn cmd_health(client: &RegistryClient) -> anyhow::Result<()> {
    match client.health().await {
        Ok(_) => println!("✓ Registry at {} is healthy", client.base_url()),
        Err(e) => {
            println!("✗ Registry at {} is unhealthy", client.base_url());
            println!("{}", e.operator_message());
        }
    }

    Ok(())
}

use crate::clients::registry::Registry;
use crate::controller::{ActionOutcome, Controller};
use crate::models::LicenseAction;

pub async fn cmd_action<R: Registry>(
    controller: &Controller<R>,
    action: LicenseAction,
    email: &str,
) -> anyhow::Result<()> {
    match controller.perform(action, email).await {
        ActionOutcome::Completed(_) => println!("✓ {action}: {email}"),
        ActionOutcome::Cancelled => println!("Cancelled."),
        ActionOutcome::Failed(_) => {}
    }

    Ok(())
}

use crate::clients::registry::Registry;
use crate::controller::Controller;

pub async fn cmd_add<R: Registry>(
    controller: &Controller<R>,
    email: &str,
    ativo: bool,
) -> anyhow::Result<()> {
    controller.set_email_input(email);
    controller.set_ativo(ativo);

    // Failures were already reported through the view.
    if controller.add().await.is_ok() {
        println!(
            "✓ Saved {} ({})",
            crate::models::normalize_email(email),
            if ativo { "active" } else { "inactive" }
        );
    }

    Ok(())
}

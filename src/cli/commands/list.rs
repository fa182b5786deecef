//! List licenses command handler

use crate::clients::registry::Registry;
use crate::controller::Controller;

pub async fn cmd_list<R: Registry>(
    controller: &Controller<R>,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    controller.set_filter(filter.unwrap_or_default());
    controller.refresh().await;
    Ok(())
}

mod action;
mod add;
mod health;
mod key;
mod list;

pub use action::cmd_action;
pub use add::cmd_add;
pub use health::cmd_health;
pub use key::{cmd_key_clear, cmd_key_set, cmd_key_show};
pub use list::cmd_list;

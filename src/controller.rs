//! Operator flows: refresh, add, per-row actions and credential changes.
//!
//! The controller owns the local view state (filter text and the pending add
//! form) and keeps the rendered list consistent with the registry by
//! re-listing after every mutation.

use crate::clients::registry::Registry;
use crate::credential::CredentialStore;
use crate::error::AdminError;
use crate::models::{Ack, LicenseAction, LicenseRecord, normalize_email};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Render collaborator.
///
/// Implementations must not block for long; the controller calls them between
/// network suspensions.
pub trait View: Send + Sync {
    fn show_loading(&self);

    fn show_records(&self, records: &[LicenseRecord]);

    /// Shown in place of the record list when a refresh fails.
    fn show_error(&self, error: &AdminError);

    /// Out-of-band report for a failed add or row action.
    fn report_error(&self, error: &AdminError);

    fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered(usize),
    Failed,
    /// A newer refresh started before this one completed; nothing was rendered.
    Superseded,
}

#[derive(Debug)]
pub enum ActionOutcome {
    Completed(Ack),
    Failed(AdminError),
    Cancelled,
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

#[derive(Debug, Clone)]
struct FormState {
    filter: String,
    email_input: String,
    ativo: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            filter: String::new(),
            email_input: String::new(),
            ativo: true,
        }
    }
}

pub struct Controller<R> {
    registry: R,
    credentials: Arc<dyn CredentialStore>,
    view: Arc<dyn View>,
    form: Mutex<FormState>,
    generation: AtomicU64,
}

impl<R: Registry> Controller<R> {
    pub fn new(registry: R, credentials: Arc<dyn CredentialStore>, view: Arc<dyn View>) -> Self {
        Self {
            registry,
            credentials,
            view,
            form: Mutex::new(FormState::default()),
            generation: AtomicU64::new(0),
        }
    }

    fn form(&self) -> MutexGuard<'_, FormState> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_filter(&self, text: impl Into<String>) {
        self.form().filter = text.into();
    }

    #[must_use]
    pub fn filter(&self) -> String {
        self.form().filter.clone()
    }

    pub fn set_email_input(&self, email: impl Into<String>) {
        self.form().email_input = email.into();
    }

    #[must_use]
    pub fn email_input(&self) -> String {
        self.form().email_input.clone()
    }

    pub fn set_ativo(&self, ativo: bool) {
        self.form().ativo = ativo;
    }

    /// Reads the stored credential and performs the first refresh.
    pub async fn init(&self) -> String {
        let credential = self.credentials.get();
        self.refresh().await;
        credential
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.view.show_loading();

        let filter = self.filter();
        let result = self.registry.list(&filter).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Dropping superseded refresh");
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(records) => {
                self.view.show_records(&records);
                RefreshOutcome::Rendered(records.len())
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed");
                self.view.show_error(&e);
                RefreshOutcome::Failed
            }
        }
    }

    /// Submits the pending add form.
    ///
    /// The input is kept on failure so the operator can correct and retry.
    pub async fn add(&self) -> Result<Ack, AdminError> {
        let (email, ativo) = {
            let form = self.form();
            (normalize_email(&form.email_input), form.ativo)
        };

        if email.is_empty() {
            let err = AdminError::validation("Enter an email.");
            self.view.report_error(&err);
            return Err(err);
        }

        match self.registry.create(&email, ativo).await {
            Ok(ack) => {
                info!(%email, ativo, "License saved");
                self.form().email_input.clear();
                self.refresh().await;
                Ok(ack)
            }
            Err(e) => {
                warn!(%email, error = %e, "Failed to save license");
                self.view.report_error(&e);
                Err(e)
            }
        }
    }

    /// Runs a row action, then refreshes whether or not it succeeded.
    pub async fn perform(&self, action: LicenseAction, email: &str) -> ActionOutcome {
        if action.requires_confirmation() && !self.view.confirm(&format!("Delete {email}?")) {
            debug!(%action, email, "Action cancelled by operator");
            return ActionOutcome::Cancelled;
        }

        let result = match action {
            LicenseAction::Activate => self.registry.create(email, true).await,
            LicenseAction::Deactivate => self.registry.deactivate(email).await,
            LicenseAction::Delete => self.registry.delete(email).await,
        };

        if let Err(e) = &result {
            warn!(%action, email, error = %e, "License action failed");
            self.view.report_error(e);
        } else {
            info!(%action, email, "License action completed");
        }

        self.refresh().await;

        match result {
            Ok(ack) => ActionOutcome::Completed(ack),
            Err(e) => ActionOutcome::Failed(e),
        }
    }

    /// Entry point for a row button: `action_name` is the button's action tag.
    ///
    /// Unknown tags and rows without an email are ignored.
    pub async fn dispatch(&self, action_name: &str, email: &str) -> Option<ActionOutcome> {
        if email.is_empty() {
            return None;
        }

        match action_name.parse::<LicenseAction>() {
            Ok(action) => Some(self.perform(action, email).await),
            Err(e) => {
                debug!(error = %e, "Ignoring row event");
                None
            }
        }
    }

    /// Stores a new credential (empty clears it) and refreshes with it.
    pub async fn save_credential(&self, value: &str) -> std::io::Result<RefreshOutcome> {
        self.credentials.set(value)?;
        info!(cleared = value.is_empty(), "API key updated");
        Ok(self.refresh().await)
    }
}

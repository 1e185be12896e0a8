//! The commission console.
//!
//! [`CommissionConsole`] owns the hierarchy selection, the resolved
//! record, the editable draft and the save pipeline, and drives the
//! backend through a [`CommissionBackend`].  Every operation takes
//! `&mut self` and finishes its fetches before returning, so a response
//! can never land in state that belongs to a newer selection.
//!
//! Fetch and save failures do not escape as errors: they become
//! [`Notification`]s for the host to display, and the console state is
//! left as it was.  Operations only return `Err` for requests that make
//! no sense in the current state (a locked field, a save without a
//! selection, confirming when nothing is pending).

use crate::client::CommissionBackend;
use crate::error::{BackendError, ConsoleError, Result};
use crate::models::{HierarchyLevel, HierarchyNode};
use crate::resolver::{self, Resolution};
use crate::selector::{HierarchySelector, SelectionState};
use crate::split::{SplitDraft, SplitField, SplitVerdict};
use crate::submission::{failure_message, ConfirmationPreview, PipelineState, SaveAction};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Shown when the backend accepts a save without a message.
pub const DEFAULT_SAVE_SUCCESS: &str = "Commission saved successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Result of a confirmed save.  A failed save is not an error of the
/// operation: the pipeline is back to idle with the draft intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

pub struct CommissionConsole<B> {
    backend: B,
    admin_id: String,
    selector: HierarchySelector,
    resolution: Resolution,
    /// Node the current resolution was fetched for.
    resolved_for: Option<String>,
    draft: SplitDraft,
    configure_requested: bool,
    pipeline: PipelineState,
    pending: Option<(SaveAction, ConfirmationPreview)>,
    notifications: Vec<Notification>,
}

impl<B: CommissionBackend> CommissionConsole<B> {
    pub fn new(backend: B, admin_id: impl Into<String>) -> Self {
        Self {
            backend,
            admin_id: admin_id.into(),
            selector: HierarchySelector::default(),
            resolution: Resolution::NotConfigured,
            resolved_for: None,
            draft: SplitDraft::default(),
            configure_requested: false,
            pipeline: PipelineState::Idle,
            pending: None,
            notifications: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn selection(&self) -> &SelectionState {
        self.selector.selection()
    }

    pub fn master_distributors(&self) -> &[HierarchyNode] {
        self.selector.master_distributors()
    }

    pub fn distributors(&self) -> &[HierarchyNode] {
        self.selector.distributors()
    }

    pub fn retailers(&self) -> &[HierarchyNode] {
        self.selector.retailers()
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn is_inherited(&self) -> bool {
        self.resolution.is_inherited()
    }

    pub fn draft(&self) -> &SplitDraft {
        &self.draft
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Hands the queued notifications to the caller.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Whether the "not configured" empty state should be shown instead of
    /// the form.
    pub fn shows_empty_state(&self) -> bool {
        self.current_node_id().is_some() && !self.form_visible()
    }

    /// Whether the split form is shown: a record applies to the node, or
    /// the operator chose to configure one.
    pub fn form_visible(&self) -> bool {
        self.current_node_id().is_some()
            && (self.configure_requested || self.resolution.record().is_some())
    }

    pub fn is_field_locked(&self, field: SplitField) -> bool {
        let selection = self.selector.selection();
        match field {
            SplitField::MasterDistributor => selection.is_md_locked(),
            SplitField::Distributor => selection.is_distributor_locked(),
            SplitField::Retailer => false,
        }
    }

    fn current_node_id(&self) -> Option<&str> {
        self.selector.selection().current_node_id()
    }

    /// Verdict for the current draft, recomputed on every call.
    pub fn verdict(&self) -> SplitVerdict {
        self.draft.verdict()
    }

    /// Whether a save can be requested right now.
    pub fn can_submit(&self) -> bool {
        self.pipeline == PipelineState::Idle
            && self.form_visible()
            && self.resolved_for.as_deref() == self.current_node_id()
            && self.draft.submittable_shares().is_ok()
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    fn notify_list_failure(&mut self, what: &str, err: &BackendError) {
        warn!(%err, what, "failed to load hierarchy list");
        self.notify(NotificationLevel::Error, format!("Failed to load {what}"));
    }

    /// Leaves any pending confirmation; a new selection invalidates it.
    fn abandon_pending(&mut self) {
        self.pending = None;
        self.pipeline = PipelineState::Idle;
    }

    /// Loads the admin's master distributors into the top selector.
    pub async fn load_master_distributors(&mut self) {
        match self.backend.list_master_distributors(&self.admin_id).await {
            Ok(nodes) => {
                debug!(count = nodes.len(), "loaded master distributors");
                self.selector.set_master_distributors(nodes);
            }
            Err(err) => {
                self.selector.set_master_distributors(Vec::new());
                self.notify_list_failure("master distributors", &err);
            }
        }
    }

    pub async fn select_master_distributor(&mut self, id: &str) -> Result<()> {
        self.selector.select_master_distributor(id)?;
        self.abandon_pending();
        info!(node_id = id, "selected master distributor");

        let (children, resolution) = tokio::join!(
            self.backend.list_distributors(id),
            resolver::resolve(&self.backend, id)
        );
        match children {
            Ok(nodes) => self.selector.set_distributors(id, nodes),
            Err(err) => self.notify_list_failure("distributors", &err),
        }
        self.apply_resolution(id, resolution);
        Ok(())
    }

    pub async fn select_distributor(&mut self, id: &str) -> Result<()> {
        self.selector.select_distributor(id)?;
        self.abandon_pending();
        info!(node_id = id, "selected distributor");

        let (children, resolution) = tokio::join!(
            self.backend.list_retailers(id),
            resolver::resolve(&self.backend, id)
        );
        match children {
            Ok(nodes) => self.selector.set_retailers(id, nodes),
            Err(err) => self.notify_list_failure("retailers", &err),
        }
        self.apply_resolution(id, resolution);
        Ok(())
    }

    pub async fn select_retailer(&mut self, id: &str) -> Result<()> {
        self.selector.select_retailer(id)?;
        self.abandon_pending();
        info!(node_id = id, "selected retailer");

        let resolution = resolver::resolve(&self.backend, id).await;
        self.apply_resolution(id, resolution);
        Ok(())
    }

    /// Deselects the distributor (and retailer) and goes back to
    /// configuring the master distributor.
    pub async fn clear_distributor(&mut self) -> Result<()> {
        let md_id = self
            .selection()
            .selected_md_id()
            .map(str::to_string)
            .ok_or(ConsoleError::NothingSelected(HierarchyLevel::MasterDistributor))?;
        self.selector.clear_distributor();
        self.abandon_pending();
        let resolution = resolver::resolve(&self.backend, &md_id).await;
        self.apply_resolution(&md_id, resolution);
        Ok(())
    }

    /// Deselects the retailer and goes back to configuring its distributor.
    pub async fn clear_retailer(&mut self) -> Result<()> {
        let distributor_id = self
            .selection()
            .selected_distributor_id()
            .map(str::to_string)
            .ok_or(ConsoleError::NothingSelected(HierarchyLevel::Distributor))?;
        self.selector.clear_retailer();
        self.abandon_pending();
        let resolution = resolver::resolve(&self.backend, &distributor_id).await;
        self.apply_resolution(&distributor_id, resolution);
        Ok(())
    }

    /// Re-fetches the record for the node being configured.
    pub async fn refresh(&mut self) -> Result<()> {
        let node_id = self
            .current_node_id()
            .map(str::to_string)
            .ok_or(ConsoleError::NothingSelected(HierarchyLevel::MasterDistributor))?;
        let resolution = resolver::resolve(&self.backend, &node_id).await;
        self.apply_resolution(&node_id, resolution);
        Ok(())
    }

    fn apply_resolution(&mut self, node_id: &str, result: std::result::Result<Resolution, BackendError>) {
        match result {
            Ok(resolution) => {
                self.draft = match resolution.record() {
                    Some(record) => SplitDraft::from_record(record),
                    None => SplitDraft::default(),
                };
                self.resolution = resolution;
                self.resolved_for = Some(node_id.to_string());
                self.configure_requested = false;
            }
            Err(err) => {
                warn!(node_id, %err, "failed to fetch commission");
                self.notify(NotificationLevel::Error, "Failed to fetch commission");
            }
        }
    }

    /// Reveals the form with blank values from the empty state.  Only a
    /// master distributor can start a chain; below it the locked fields
    /// would have nothing to show.
    pub fn configure(&mut self) -> Result<()> {
        match self.selector.selection().current_level() {
            None => return Err(ConsoleError::NothingSelected(HierarchyLevel::MasterDistributor)),
            Some(HierarchyLevel::MasterDistributor) => {}
            Some(_) if self.form_visible() => return Ok(()),
            Some(level) => {
                return Err(ConsoleError::Selection(format!(
                    "no commission applies to this {level}; configure its master distributor first"
                )))
            }
        }
        if !self.form_visible() {
            self.draft.clear();
            self.configure_requested = true;
        }
        Ok(())
    }

    /// Offers new text for a share.  Text that breaks the input rule is
    /// ignored; the returned verdict reflects the draft either way.
    pub fn set_field(&mut self, field: SplitField, text: &str) -> Result<SplitVerdict> {
        if self.pipeline != PipelineState::Idle {
            return Err(ConsoleError::InvalidTransition {
                from: self.pipeline.describe(),
                action: "edit the split",
            });
        }
        if self.is_field_locked(field) {
            return Err(ConsoleError::FieldLocked(field));
        }
        if !self.draft.set_field(field, text) {
            debug!(%field, text, "rejected input");
        }
        Ok(self.draft.verdict())
    }

    /// Checks the draft and, if it can be saved, moves to confirmation.
    pub fn request_save(&mut self) -> Result<ConfirmationPreview> {
        if self.pipeline != PipelineState::Idle {
            return Err(ConsoleError::InvalidTransition {
                from: self.pipeline.describe(),
                action: "request a save",
            });
        }
        let (node_id, level) = match (self.current_node_id(), self.selection().current_level()) {
            (Some(node_id), Some(level)) => (node_id.to_string(), level),
            _ => return Err(ConsoleError::NothingSelected(HierarchyLevel::MasterDistributor)),
        };
        if !self.form_visible() {
            return Err(ConsoleError::FormNotVisible);
        }
        if self.resolved_for.as_deref() != Some(node_id.as_str()) {
            self.notify(NotificationLevel::Error, "Failed to fetch commission");
            return Err(ConsoleError::Selection(format!(
                "commission for {node_id} has not been loaded"
            )));
        }
        let shares = match self.draft.submittable_shares() {
            Ok(shares) => shares,
            Err(err) => {
                self.notify(NotificationLevel::Error, err.to_string());
                return Err(err.into());
            }
        };

        let action = SaveAction::plan(&self.resolution, &node_id, shares);
        let preview = ConfirmationPreview::new(level, &node_id, &shares);
        debug!(node_id = %node_id, update = action.is_update(), "awaiting confirmation");
        self.pending = Some((action, preview.clone()));
        self.pipeline = PipelineState::ConfirmPending;
        Ok(preview)
    }

    /// Closes the confirmation without saving.
    pub fn cancel(&mut self) -> Result<()> {
        if self.pipeline != PipelineState::ConfirmPending {
            return Err(ConsoleError::InvalidTransition {
                from: self.pipeline.describe(),
                action: "cancel",
            });
        }
        self.abandon_pending();
        Ok(())
    }

    /// Saves the confirmed split, then re-fetches the node's record so the
    /// form shows what the backend stored.
    pub async fn confirm(&mut self) -> Result<SaveOutcome> {
        let (action, preview) = match (self.pipeline, self.pending.take()) {
            (PipelineState::ConfirmPending, Some(pending)) => pending,
            _ => {
                return Err(ConsoleError::InvalidTransition {
                    from: self.pipeline.describe(),
                    action: "confirm",
                })
            }
        };
        self.pipeline = PipelineState::Saving;
        info!(node_id = %preview.node_id, update = action.is_update(), "saving commission");

        let result = match &action {
            SaveAction::Create(req) => self.backend.create_commission(req).await,
            SaveAction::Update(req) => self.backend.update_commission(req).await,
        };

        let outcome = match result {
            Ok(message) => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_SAVE_SUCCESS.to_string());
                self.notify(NotificationLevel::Success, message);
                let resolution = resolver::resolve(&self.backend, &preview.node_id).await;
                self.apply_resolution(&preview.node_id, resolution);
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!(node_id = %preview.node_id, %err, "failed to save commission");
                let message = failure_message(&err);
                self.notify(NotificationLevel::Error, message.clone());
                SaveOutcome::Failed(message)
            }
        };
        self.pipeline = PipelineState::Idle;
        Ok(outcome)
    }

    /// Restores the node's own stored values, or clears the form when the
    /// node has no record of its own.  A resolution left over from a
    /// previously selected node is never restored.
    pub fn reset(&mut self) {
        let resolved_here = self.resolved_for.as_deref() == self.current_node_id();
        match &self.resolution {
            Resolution::Direct(record) if resolved_here => self.draft = SplitDraft::from_record(record),
            _ => {
                self.draft.clear();
                self.configure_requested = false;
            }
        }
    }
}

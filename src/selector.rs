//! Hierarchy selection state.
//!
//! Three optional pointers (master distributor, distributor, retailer)
//! and the option lists behind each dropdown.  Choosing a node always
//! forgets everything below it before anything is fetched for it, so a
//! list that belonged to a previous choice can never be shown.

use crate::error::{ConsoleError, Result};
use crate::models::{HierarchyLevel, HierarchyNode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    md: Option<String>,
    distributor: Option<String>,
    retailer: Option<String>,
}

impl SelectionState {
    pub fn selected_md_id(&self) -> Option<&str> {
        self.md.as_deref()
    }

    pub fn selected_distributor_id(&self) -> Option<&str> {
        self.distributor.as_deref()
    }

    pub fn selected_retailer_id(&self) -> Option<&str> {
        self.retailer.as_deref()
    }

    /// The master distributor share is fixed once a distributor is chosen.
    pub fn is_md_locked(&self) -> bool {
        self.distributor.is_some()
    }

    /// The distributor share is fixed once a retailer is chosen.
    pub fn is_distributor_locked(&self) -> bool {
        self.retailer.is_some()
    }

    /// The deepest selected level, which is the one being configured.
    pub fn current_level(&self) -> Option<HierarchyLevel> {
        if self.retailer.is_some() {
            Some(HierarchyLevel::Retailer)
        } else if self.distributor.is_some() {
            Some(HierarchyLevel::Distributor)
        } else if self.md.is_some() {
            Some(HierarchyLevel::MasterDistributor)
        } else {
            None
        }
    }

    /// Id of the node being configured.
    pub fn current_node_id(&self) -> Option<&str> {
        self.retailer
            .as_deref()
            .or(self.distributor.as_deref())
            .or(self.md.as_deref())
    }
}

/// Selection plus the loaded dropdown contents.
#[derive(Debug, Clone, Default)]
pub struct HierarchySelector {
    selection: SelectionState,
    master_distributors: Vec<HierarchyNode>,
    distributors: Vec<HierarchyNode>,
    retailers: Vec<HierarchyNode>,
}

impl HierarchySelector {
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn master_distributors(&self) -> &[HierarchyNode] {
        &self.master_distributors
    }

    pub fn distributors(&self) -> &[HierarchyNode] {
        &self.distributors
    }

    pub fn retailers(&self) -> &[HierarchyNode] {
        &self.retailers
    }

    pub fn set_master_distributors(&mut self, nodes: Vec<HierarchyNode>) {
        self.master_distributors = nodes;
    }

    /// Stores a distributor list, provided it still belongs to the
    /// selected master distributor.
    pub fn set_distributors(&mut self, md_id: &str, nodes: Vec<HierarchyNode>) {
        if self.selection.selected_md_id() == Some(md_id) {
            self.distributors = nodes;
        }
    }

    /// Stores a retailer list, provided it still belongs to the selected
    /// distributor.
    pub fn set_retailers(&mut self, distributor_id: &str, nodes: Vec<HierarchyNode>) {
        if self.selection.selected_distributor_id() == Some(distributor_id) {
            self.retailers = nodes;
        }
    }

    /// Selects a master distributor, forgetting the distributor and
    /// retailer levels and their lists.
    pub fn select_master_distributor(&mut self, id: &str) -> Result<()> {
        if !self.master_distributors.iter().any(|n| n.id() == id) {
            return Err(ConsoleError::Selection(format!("unknown master distributor {id}")));
        }
        self.selection = SelectionState {
            md: Some(id.to_string()),
            distributor: None,
            retailer: None,
        };
        self.distributors.clear();
        self.retailers.clear();
        Ok(())
    }

    /// Selects a distributor of the selected master distributor,
    /// forgetting the retailer list.  While a retailer is selected the
    /// distributor share is locked, so the retailer has to be cleared
    /// before another distributor can be chosen.
    pub fn select_distributor(&mut self, id: &str) -> Result<()> {
        let md_id = self
            .selection
            .selected_md_id()
            .ok_or(ConsoleError::NothingSelected(HierarchyLevel::MasterDistributor))?;
        if self.selection.is_distributor_locked() {
            return Err(ConsoleError::Selection(
                "clear the selected retailer before changing distributor".to_string(),
            ));
        }
        let belongs = self
            .distributors
            .iter()
            .any(|n| n.id() == id && n.parent_id() == Some(md_id));
        if !belongs {
            return Err(ConsoleError::Selection(format!(
                "distributor {id} is not under master distributor {md_id}"
            )));
        }
        self.selection.distributor = Some(id.to_string());
        self.selection.retailer = None;
        self.retailers.clear();
        Ok(())
    }

    pub fn select_retailer(&mut self, id: &str) -> Result<()> {
        let distributor_id = self
            .selection
            .selected_distributor_id()
            .ok_or(ConsoleError::NothingSelected(HierarchyLevel::Distributor))?;
        let belongs = self
            .retailers
            .iter()
            .any(|n| n.id() == id && n.parent_id() == Some(distributor_id));
        if !belongs {
            return Err(ConsoleError::Selection(format!(
                "retailer {id} is not under distributor {distributor_id}"
            )));
        }
        self.selection.retailer = Some(id.to_string());
        Ok(())
    }

    /// Drops the distributor and retailer selections.  The distributor
    /// list of the master distributor stays loaded.
    pub fn clear_distributor(&mut self) {
        self.selection.distributor = None;
        self.selection.retailer = None;
        self.retailers.clear();
    }

    pub fn clear_retailer(&mut self) {
        self.selection.retailer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(id: &str) -> HierarchyNode {
        HierarchyNode::MasterDistributor { id: id.into(), name: id.into() }
    }

    fn distributor(id: &str, parent: &str) -> HierarchyNode {
        HierarchyNode::Distributor { id: id.into(), name: id.into(), parent_id: parent.into() }
    }

    fn retailer(id: &str, parent: &str) -> HierarchyNode {
        HierarchyNode::Retailer { id: id.into(), name: id.into(), parent_id: parent.into() }
    }

    fn selector_with_retailer() -> HierarchySelector {
        let mut selector = HierarchySelector::default();
        selector.set_master_distributors(vec![md("MD001"), md("MD002")]);
        selector.select_master_distributor("MD001").unwrap();
        selector.set_distributors("MD001", vec![distributor("D001", "MD001"), distributor("D002", "MD001")]);
        selector.select_distributor("D001").unwrap();
        selector.set_retailers("D001", vec![retailer("R001", "D001")]);
        selector.select_retailer("R001").unwrap();
        selector
    }

    #[test]
    fn test_new_master_distributor_clears_descendants() {
        let mut selector = selector_with_retailer();
        selector.select_master_distributor("MD002").unwrap();
        let selection = selector.selection();
        assert_eq!(selection.selected_md_id(), Some("MD002"));
        assert_eq!(selection.selected_distributor_id(), None);
        assert_eq!(selection.selected_retailer_id(), None);
        assert!(selector.distributors().is_empty());
        assert!(selector.retailers().is_empty());
    }

    #[test]
    fn test_locks_follow_selection_depth() {
        let mut selector = selector_with_retailer();
        assert!(selector.selection().is_md_locked());
        assert!(selector.selection().is_distributor_locked());
        assert_eq!(selector.selection().current_level(), Some(HierarchyLevel::Retailer));
        assert_eq!(selector.selection().current_node_id(), Some("R001"));

        selector.clear_retailer();
        assert!(selector.selection().is_md_locked());
        assert!(!selector.selection().is_distributor_locked());
        assert_eq!(selector.selection().current_node_id(), Some("D001"));
    }

    #[test]
    fn test_distributor_lock_is_released_only_by_clearing_retailer() {
        let mut selector = selector_with_retailer();
        assert!(matches!(
            selector.select_distributor("D002"),
            Err(ConsoleError::Selection(_))
        ));
        assert!(selector.selection().is_distributor_locked());
        assert_eq!(selector.selection().selected_distributor_id(), Some("D001"));

        selector.clear_retailer();
        selector.select_distributor("D002").unwrap();
        assert!(!selector.selection().is_distributor_locked());
        assert!(selector.retailers().is_empty());
    }

    #[test]
    fn test_distributor_must_belong_to_selected_md() {
        let mut selector = HierarchySelector::default();
        selector.set_master_distributors(vec![md("MD001")]);
        selector.select_master_distributor("MD001").unwrap();
        selector.set_distributors("MD001", vec![distributor("D009", "MD002")]);
        assert!(matches!(
            selector.select_distributor("D009"),
            Err(ConsoleError::Selection(_))
        ));
        assert_eq!(selector.selection().selected_distributor_id(), None);
    }

    #[test]
    fn test_retailer_requires_distributor() {
        let mut selector = HierarchySelector::default();
        assert!(matches!(
            selector.select_retailer("R001"),
            Err(ConsoleError::NothingSelected(HierarchyLevel::Distributor))
        ));
    }

    #[test]
    fn test_stale_list_for_previous_parent_is_dropped() {
        let mut selector = HierarchySelector::default();
        selector.set_master_distributors(vec![md("MD001"), md("MD002")]);
        selector.select_master_distributor("MD002").unwrap();
        selector.set_distributors("MD001", vec![distributor("D001", "MD001")]);
        assert!(selector.distributors().is_empty());
    }
}

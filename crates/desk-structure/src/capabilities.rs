//! Pane capabilities
//!
//! The view layer never inspects a pane's concrete type to decide what it can
//! do. It asks through [`PaneCapabilities`], which every pane variant answers.

use crate::document_list::{default_ordering, SortDirection, SortOrdering};
use crate::node::{MenuItem, MenuItemGroup, PaneKind, PaneNode};
use serde_json::json;

/// Action switching the preview layout of a list
pub const SET_LAYOUT_ACTION: &str = "setLayout";
/// Action switching the sort order of a document list
pub const SET_SORT_ORDER_ACTION: &str = "setSortOrder";
/// Action switching the view of a document pane
pub const SET_VIEW_ACTION: &str = "setView";

/// What a pane declares to the view layer
pub trait PaneCapabilities {
    /// Menu entries, including variant defaults
    fn menu_items(&self) -> Vec<MenuItem>;

    /// Menu groups
    fn menu_item_groups(&self) -> Vec<MenuItemGroup>;

    /// Named actions the pane handles
    fn action_handlers(&self) -> Vec<String>;

    /// Check if the pane handles `action`
    fn handles_action(&self, action: &str) -> bool {
        self.action_handlers().iter().any(|a| a == action)
    }
}

fn sort_menu_item(title: &str, field: &str, direction: SortDirection) -> MenuItem {
    let by = vec![SortOrdering::new(field, direction)];
    MenuItem::action(title, SET_SORT_ORDER_ACTION)
        .with_group("sorting")
        .with_param("by", json!(by))
}

fn document_list_menu_defaults() -> Vec<MenuItem> {
    let created = default_ordering();
    vec![
        sort_menu_item("Sort by Created", &created[0].field, created[0].direction),
        sort_menu_item("Sort by Last Edited", "_updatedAt", SortDirection::Desc),
        MenuItem::action("Compact view", SET_LAYOUT_ACTION)
            .with_group("layout")
            .with_param("layout", "default"),
        MenuItem::action("Detailed view", SET_LAYOUT_ACTION)
            .with_group("layout")
            .with_param("layout", "detail"),
    ]
}

impl PaneCapabilities for PaneNode {
    fn menu_items(&self) -> Vec<MenuItem> {
        let mut items = self.menu_items.clone();
        if let PaneKind::DocumentList(_) = self.kind {
            let declares_sorting = items
                .iter()
                .any(|item| item.action.as_deref() == Some(SET_SORT_ORDER_ACTION));
            if !declares_sorting {
                items.extend(document_list_menu_defaults());
            }
        }
        items
    }

    fn menu_item_groups(&self) -> Vec<MenuItemGroup> {
        let mut groups = self.menu_item_groups.clone();
        if let PaneKind::DocumentList(_) = self.kind {
            for (id, title) in [("sorting", "Sort"), ("layout", "Layout")] {
                if !groups.iter().any(|g| g.id == id) {
                    groups.push(MenuItemGroup {
                        id: id.into(),
                        title: title.into(),
                    });
                }
            }
        }
        groups
    }

    fn action_handlers(&self) -> Vec<String> {
        match &self.kind {
            PaneKind::List(_) => vec![SET_LAYOUT_ACTION.into()],
            PaneKind::DocumentList(_) => vec![SET_LAYOUT_ACTION.into(), SET_SORT_ORDER_ACTION.into()],
            PaneKind::Document(options) if options.views.len() > 1 => vec![SET_VIEW_ACTION.into()],
            PaneKind::Document(_) => Vec::new(),
            PaneKind::Component(options) => options.actions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ComponentOptions, DocumentListOptions, DocumentOptions, ListOptions, View};

    #[test]
    fn document_list_gets_sort_and_layout_defaults() {
        let node = PaneNode::new("books", "Books", PaneKind::DocumentList(DocumentListOptions::new("_type == 'book'")));
        let items = node.menu_items();
        assert_eq!(items.len(), 4);
        assert!(node.handles_action(SET_SORT_ORDER_ACTION));
        assert_eq!(node.menu_item_groups().len(), 2);
    }

    #[test]
    fn custom_sort_items_replace_defaults() {
        let node = PaneNode::new("books", "Books", PaneKind::DocumentList(DocumentListOptions::new("_type == 'book'")))
            .with_menu_items(vec![MenuItem::action("By title", SET_SORT_ORDER_ACTION)]);
        assert_eq!(node.menu_items().len(), 1);
    }

    #[test]
    fn variants_declare_their_actions() {
        let list = PaneNode::new("l", "L", PaneKind::List(ListOptions::default()));
        assert_eq!(list.action_handlers(), vec![SET_LAYOUT_ACTION]);

        let single = PaneNode::new("d", "D", PaneKind::Document(DocumentOptions::new("d", "book")));
        assert!(single.action_handlers().is_empty());

        let multi = PaneNode::new(
            "d",
            "D",
            PaneKind::Document(
                DocumentOptions::new("d", "book").with_views(vec![View::form("editor"), View::component("p", "Preview")]),
            ),
        );
        assert!(multi.handles_action(SET_VIEW_ACTION));

        let component = PaneNode::new(
            "c",
            "C",
            PaneKind::Component(ComponentOptions::new("Stats").with_actions(vec!["refresh".into()])),
        );
        assert!(component.handles_action("refresh"));
        assert!(!component.handles_action(SET_LAYOUT_ACTION));
    }
}

//! Workbook: the tabbed set of pages behind the shell.
//!
//! The tool choice is global. Switching tools, adding a page or changing
//! the active tab re-applies it so every page interprets input the same
//! way. Shell actions go to the active page and are no-ops without one.

use crate::input::{InputEvent, InputModifiers};
use crate::page::Page;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::ToolKind;
use kurbo::Point;
use pd_core::asset::AssetLoader;
use pd_core::config::EditorConfig;
use pd_core::id::ItemId;

pub struct Workbook {
    pages: Vec<Page>,
    active: Option<usize>,
    tool: ToolKind,
    config: EditorConfig,
}

impl Workbook {
    /// An empty workbook. Shells normally add a first page right away.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            pages: Vec::new(),
            active: None,
            tool: ToolKind::Select,
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Page> {
        self.active.and_then(|i| self.pages.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Page> {
        self.active.and_then(|i| self.pages.get_mut(i))
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Append a page, make it active and apply the global tool. Blank
    /// names become "Page N".
    pub fn add_page(&mut self, name: &str) -> usize {
        let name = match name.trim() {
            "" => format!("Page {}", self.pages.len() + 1),
            trimmed => trimmed.to_string(),
        };
        let mut page = Page::new(name, self.config.clone());
        page.set_tool(self.tool);
        log::debug!("page {:?} added", page.name);
        self.leave_active();
        self.pages.push(page);
        let index = self.pages.len() - 1;
        self.active = Some(index);
        index
    }

    /// Close the page at `index`. The last remaining page cannot be
    /// closed; returns whether a page was removed.
    pub fn close_page(&mut self, index: usize) -> bool {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            log::debug!("refusing to close page {index} of {}", self.pages.len());
            return false;
        }
        let mut page = self.pages.remove(index);
        page.cancel_gesture();
        log::debug!("page {:?} closed", page.name);

        self.active = self.active.map(|a| {
            if a > index || a == self.pages.len() {
                a - 1
            } else {
                a
            }
        });
        true
    }

    /// Rename the page at `index`. Blank names are ignored.
    pub fn rename_page(&mut self, index: usize, name: &str) -> bool {
        let name = name.trim();
        match self.pages.get_mut(index) {
            Some(page) if !name.is_empty() => {
                page.name = name.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        if self.active == Some(index) {
            return true;
        }
        self.leave_active();
        self.active = Some(index);
        let tool = self.tool;
        if let Some(page) = self.active_mut() {
            page.set_tool(tool);
        }
        true
    }

    /// The page losing focus abandons its gesture and previews.
    fn leave_active(&mut self) {
        if let Some(page) = self.active_mut() {
            page.cancel_gesture();
        }
    }

    /// Choose the tool for every page.
    pub fn set_tool(&mut self, kind: ToolKind) {
        self.tool = kind;
        for page in &mut self.pages {
            page.set_tool(kind);
        }
    }

    /// Route an event to the active page. Tool shortcuts switch the
    /// global tool instead.
    pub fn handle_event(&mut self, event: InputEvent) {
        if let InputEvent::Key { key, keys } = &event
            && let Some(ShortcutAction::Tool(kind)) = ShortcutMap::resolve(key, *keys)
        {
            self.set_tool(kind);
            return;
        }
        if let Some(page) = self.active_mut() {
            page.handle_event(event);
        }
    }

    // ─── Shell actions ───────────────────────────────────────────────────

    pub fn drop_item(
        &mut self,
        tag: &str,
        point: Point,
        modifiers: InputModifiers,
        assets: &dyn AssetLoader,
    ) -> Option<ItemId> {
        self.active_mut()
            .map(|page| page.drop_item(tag, point, modifiers, assets))
    }

    pub fn delete_selected(&mut self) {
        if let Some(page) = self.active_mut() {
            page.delete_selected();
        }
    }

    pub fn clear(&mut self) {
        if let Some(page) = self.active_mut() {
            page.clear();
        }
    }

    pub fn add_text(&mut self) -> Option<ItemId> {
        self.active_mut().map(Page::add_text)
    }

    pub fn scale_selected(&mut self, factor: f64) {
        if let Some(page) = self.active_mut() {
            page.scale_selected(factor);
        }
    }

    pub fn rotate_selected(&mut self, degrees: f64) {
        if let Some(page) = self.active_mut() {
            page.rotate_selected(degrees);
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(page) = self.active_mut() {
            page.reset_view();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;
    use pretty_assertions::assert_eq;

    fn names(book: &Workbook) -> Vec<&str> {
        book.pages().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn last_page_cannot_close() {
        let mut book = Workbook::new(EditorConfig::default());
        book.add_page("Page 1");
        assert!(!book.close_page(0));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn closing_keeps_active_index_valid() {
        let mut book = Workbook::new(EditorConfig::default());
        book.add_page("");
        book.add_page("Forces");
        book.add_page("  ");
        assert_eq!(names(&book), vec!["Page 1", "Forces", "Page 3"]);
        assert_eq!(book.active_index(), Some(2));

        assert!(book.close_page(2));
        assert_eq!(book.active_index(), Some(1));
        assert!(book.set_active(0));
        assert!(book.close_page(1));
        assert_eq!(book.active_index(), Some(0));
        assert_eq!(names(&book), vec!["Page 1"]);
    }

    #[test]
    fn rename_ignores_blank_names() {
        let mut book = Workbook::new(EditorConfig::default());
        book.add_page("Draft");
        assert!(!book.rename_page(0, "   "));
        assert!(book.rename_page(0, " Final "));
        assert!(!book.rename_page(3, "Nope"));
        assert_eq!(names(&book), vec!["Final"]);
    }

    #[test]
    fn tool_is_global() {
        let mut book = Workbook::new(EditorConfig::default());
        book.add_page("A");
        book.handle_event(InputEvent::Key {
            key: "l".into(),
            keys: KeyState::NONE,
        });
        book.add_page("B");
        assert!(book.pages().iter().all(|p| p.tool_kind() == ToolKind::Line));
        assert_eq!(book.tool(), ToolKind::Line);
    }

    fn start_arc(page: &mut Page) {
        page.handle_event(InputEvent::press(0.0, 0.0));
        page.handle_event(InputEvent::release(0.0, 0.0));
        page.handle_event(InputEvent::press(60.0, 0.0));
        page.handle_event(InputEvent::drag(0.0, 60.0));
    }

    #[test]
    fn switching_pages_abandons_the_left_gesture() {
        let mut book = Workbook::new(EditorConfig::default());
        book.add_page("A");
        book.set_tool(ToolKind::Arc);
        start_arc(book.active_mut().unwrap());
        assert_eq!(book.pages()[0].scene().transient_ids().len(), 5);

        book.add_page("B");
        assert!(book.pages()[0].scene().is_empty());

        start_arc(book.active_mut().unwrap());
        assert!(book.set_active(0));
        assert!(book.pages()[1].scene().is_empty());

        // Re-activating the current page keeps its gesture.
        book.active_mut().unwrap().handle_event(InputEvent::press(0.0, 0.0));
        assert!(book.set_active(0));
        assert_eq!(book.pages()[0].scene().transient_ids().len(), 1);
    }

    #[test]
    fn shell_actions_without_pages_are_no_ops() {
        let mut book = Workbook::new(EditorConfig::default());
        book.delete_selected();
        book.clear();
        book.scale_selected(2.0);
        book.reset_view();
        assert_eq!(book.add_text(), None);
        assert!(!book.set_active(0));
    }
}

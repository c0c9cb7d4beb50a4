//! Switchable page lists used by the schedule and payment sections.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EditError;

/// One named, independently editable page.
pub trait Page: Clone {
    /// Prefix of the default page name (`"<prefix>1"`).
    const DEFAULT_NAME: &'static str;

    /// Page id.
    fn id(&self) -> u32;
    /// Assign a new id.
    fn set_id(&mut self, id: u32);
    /// Display name.
    fn name(&self) -> &str;
    /// Assign a new display name.
    fn set_name(&mut self, name: String);
    /// A page with default content.
    fn blank(id: u32, name: String) -> Self;

    /// Deep copy under a new id and name.
    fn copy_as(&self, id: u32, name: String) -> Self {
        let mut page = self.clone();
        page.set_id(id);
        page.set_name(name);
        page
    }
}

/// How [`PageSection::create_page`] fills the new page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Defaults only.
    Empty,
    /// Deep copy of the current page.
    Copy,
}

/// Ordered page list with a current page and an id counter.
///
/// At least one page exists after [`PageSection::normalize`], and
/// `current_page_id` always names one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "P: Deserialize<'de>"))]
pub struct PageSection<P> {
    /// Pages in tab order.
    #[serde(default)]
    pub pages: Vec<P>,
    /// Id of the displayed page.
    #[serde(default)]
    pub current_page_id: u32,
    /// Next id handed out by [`PageSection::create_page`].
    #[serde(default = "default_next_page_id")]
    pub next_page_id: u32,
}

fn default_next_page_id() -> u32 {
    1
}

impl<P: Page> Default for PageSection<P> {
    fn default() -> Self {
        Self {
            pages: vec![P::blank(0, format!("{}1", P::DEFAULT_NAME))],
            current_page_id: 0,
            next_page_id: 1,
        }
    }
}

impl<P: Page> PageSection<P> {
    /// The current page, falling back to the first.
    pub fn current(&self) -> Option<&P> {
        self.pages
            .iter()
            .find(|page| page.id() == self.current_page_id)
            .or_else(|| self.pages.first())
    }

    /// Mutable access to the current page, falling back to the first.
    pub fn current_mut(&mut self) -> Option<&mut P> {
        let index = self.current_index()?;
        self.pages.get_mut(index)
    }

    /// Position of the current page in the tab order.
    pub fn current_index(&self) -> Option<usize> {
        if self.pages.is_empty() {
            return None;
        }
        Some(
            self.pages
                .iter()
                .position(|page| page.id() == self.current_page_id)
                .unwrap_or(0),
        )
    }

    /// Page by id.
    pub fn page(&self, id: u32) -> Option<&P> {
        self.pages.iter().find(|page| page.id() == id)
    }

    /// Append a page, select it and advance the id counter.
    pub fn create_page(&mut self, name: &str, mode: CreateMode) -> Result<u32, EditError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        let id = self.next_page_id;
        let page = match (mode, self.current()) {
            (CreateMode::Copy, Some(current)) => current.copy_as(id, name.to_string()),
            _ => P::blank(id, name.to_string()),
        };
        self.pages.push(page);
        self.current_page_id = id;
        self.next_page_id = id + 1;
        info!(page_id = id, ?mode, "created page");
        Ok(id)
    }

    /// Remove a page. The last remaining page cannot be removed.
    pub fn delete_page(&mut self, id: u32) -> Result<(), EditError> {
        if self.pages.len() <= 1 {
            warn!(page_id = id, "refused to delete the last page");
            return Err(EditError::LastPage);
        }
        let index = self
            .pages
            .iter()
            .position(|page| page.id() == id)
            .ok_or(EditError::UnknownPage(id))?;
        self.pages.remove(index);
        if self.current_page_id == id {
            if let Some(first) = self.pages.first() {
                self.current_page_id = first.id();
            }
        }
        info!(page_id = id, "deleted page");
        Ok(())
    }

    /// Rename in place. Blank names are rejected and the old name kept.
    pub fn rename_page(&mut self, id: u32, name: &str) -> Result<(), EditError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        let page = self
            .pages
            .iter_mut()
            .find(|page| page.id() == id)
            .ok_or(EditError::UnknownPage(id))?;
        page.set_name(name.to_string());
        Ok(())
    }

    /// Re-point the current page.
    pub fn switch_page(&mut self, id: u32) -> Result<(), EditError> {
        if self.page(id).is_none() {
            return Err(EditError::UnknownPage(id));
        }
        self.current_page_id = id;
        Ok(())
    }

    /// Switch to the page `offset` tabs away, wrapping around.
    pub fn cycle_page(&mut self, offset: isize) {
        let Some(index) = self.current_index() else {
            return;
        };
        let len = self.pages.len() as isize;
        let next = (index as isize + offset).rem_euclid(len) as usize;
        if let Some(page) = self.pages.get(next) {
            self.current_page_id = page.id();
        }
    }

    /// Repair a loaded section: add a default page to an empty list, point
    /// a dangling current id at the first page and keep the id counter
    /// ahead of every existing id.
    pub fn normalize(&mut self) {
        if self.pages.is_empty() {
            self.pages
                .push(P::blank(0, format!("{}1", P::DEFAULT_NAME)));
        }
        if self.page(self.current_page_id).is_none() {
            if let Some(first) = self.pages.first() {
                self.current_page_id = first.id();
            }
        }
        let max_id = self.pages.iter().map(Page::id).max().unwrap_or(0);
        self.next_page_id = self.next_page_id.max(max_id + 1);
    }
}

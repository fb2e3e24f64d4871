//! Pagination over an in-memory reservation list.
//!
//! [`slice`] picks the items for one page and [`visible_page_numbers`]
//! builds the bounded page control: first page, last page, everything
//! within two of the current page, and a gap marker wherever pages are
//! skipped. [`PageState`] keeps the current page in range as the list
//! and the page size change.

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Pages shown on each side of the current page.
const NEIGHBOURS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Gap,
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Items in `[(page-1)*page_size, page*page_size)`, clipped to `items`.
pub fn slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn visible_page_numbers(current_page: usize, total_pages: usize) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }

    let current = current_page.clamp(1, total_pages);
    let mut items = vec![PageItem::Page(1)];

    if current > NEIGHBOURS + 2 {
        items.push(PageItem::Gap);
    }

    let low = current.saturating_sub(NEIGHBOURS).max(2);
    let high = (current + NEIGHBOURS).min(total_pages.saturating_sub(1));
    for page in low..=high {
        items.push(PageItem::Page(page));
    }

    if current + NEIGHBOURS + 1 < total_pages {
        items.push(PageItem::Gap);
    }

    if total_pages > 1 {
        items.push(PageItem::Page(total_pages));
    }

    items
}

/// Current page plus the numbers it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    current_page: usize,
    total_items: usize,
    page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    /// A zero page size is bumped to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            total_items: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_items, self.page_size)
    }

    /// Keeps the current page when possible; clamps it when the list shrank.
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.clamp();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.reset();
    }

    /// Back to page 1, e.g. after the filter producing the list changed.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn go_to(&mut self, page: usize) {
        self.current_page = page;
        self.clamp();
    }

    pub fn next(&mut self) {
        self.go_to(self.current_page.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.go_to(self.current_page.saturating_sub(1));
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        slice(items, self.current_page, self.page_size)
    }

    pub fn window(&self) -> Vec<PageItem> {
        visible_page_numbers(self.current_page, self.total_pages())
    }

    pub fn summary(&self) -> String {
        format!(
            "Total {} reservations • Page {}/{}",
            self.total_items,
            self.current_page,
            self.total_pages()
        )
    }

    fn clamp(&mut self) {
        let last = self.total_pages().max(1);
        self.current_page = self.current_page.clamp(1, last);
    }
}

use shared::domain::{Entity, EntityId};

pub const DEFAULT_CLIENT_PAGE_SIZE: u32 = 10;

/// Where page boundaries come from for an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// The backend pages and reports `totalPages`.
    Server,
    /// The backend returns everything; pages are cut locally.
    Client { page_size: u32 },
}

/// One loaded slice of entities. `1 <= page_number <= total_pages` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Entity>,
    pub page_number: u32,
    pub total_pages: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self::empty()
    }
}

impl Page {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            page_number: 1,
            total_pages: 1,
        }
    }

    /// Builds a server-paged page; a missing or zero page count reads as one
    /// page and the requested page is clamped into range.
    pub fn from_server(items: Vec<Entity>, requested: u32, total_pages: Option<u32>) -> Self {
        let total_pages = total_pages.filter(|total| *total > 0).unwrap_or(1);
        Self {
            items,
            page_number: requested.clamp(1, total_pages),
            total_pages,
        }
    }

    /// Cuts page `requested` out of the full result set.
    pub fn slice_client_side(all: Vec<Entity>, requested: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1) as usize;
        let total_pages = all.len().div_ceil(page_size).max(1);
        let page_number = (requested.max(1) as usize).min(total_pages);
        let start = (page_number - 1) * page_size;
        let items = all.into_iter().skip(start).take(page_size).collect();
        Self {
            items,
            page_number: page_number as u32,
            total_pages: total_pages as u32,
        }
    }

    pub fn normalized(self) -> Self {
        let requested = self.page_number;
        Self::from_server(self.items, requested, Some(self.total_pages))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.iter().any(|entity| &entity.id == id)
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::EntityStatus;

    use super::*;

    fn entities(count: usize) -> Vec<Entity> {
        (0..count)
            .map(|i| Entity::new(format!("e{i}"), EntityStatus::Pending))
            .collect()
    }

    #[test]
    fn twelve_entities_at_ten_per_page_make_two_pages() {
        let first = Page::slice_client_side(entities(12), 1, 10);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 10);

        let second = Page::slice_client_side(entities(12), 2, 10);
        assert_eq!(second.page_number, 2);
        let ids: Vec<_> = second.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e10", "e11"]);
    }

    #[test]
    fn client_side_slice_clamps_past_the_end_and_handles_empty_sets() {
        let clamped = Page::slice_client_side(entities(5), 7, 2);
        assert_eq!(clamped.page_number, 3);
        assert_eq!(clamped.items.len(), 1);

        let empty = Page::slice_client_side(Vec::new(), 1, 10);
        assert_eq!(empty, Page::empty());
    }

    #[test]
    fn server_page_count_is_authoritative_but_never_zero() {
        let page = Page::from_server(entities(3), 5, Some(2));
        assert_eq!((page.page_number, page.total_pages), (2, 2));

        let page = Page::from_server(entities(3), 1, Some(0));
        assert_eq!((page.page_number, page.total_pages), (1, 1));

        let page = Page::from_server(entities(3), 0, None);
        assert_eq!((page.page_number, page.total_pages), (1, 1));
    }
}

//! # List Pipeline
//!
//! Pure transformation of one collection snapshot into what a table shows:
//! filter, then search, then sort, then paginate. Nothing here touches the
//! store; the controller fetches a fresh snapshot and hands it over.

use std::collections::BTreeMap;

use crate::framework::Record;
use crate::model::FieldValue;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Direction of the active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// The view state of one table: what the user typed, picked and clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub search: String,
    /// Equality predicates keyed by field name, already typed.
    pub filters: BTreeMap<String, FieldValue>,
    pub sort: Option<Sort>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_filter(&mut self, field: impl Into<String>, value: FieldValue) {
        self.filters.insert(field.into(), value);
        self.page = 1;
    }

    pub fn clear_filter(&mut self, field: &str) {
        self.filters.remove(field);
        self.page = 1;
    }

    /// Sorting by the active field flips the direction; a new field starts ascending.
    pub fn sort_by(&mut self, field: &str) {
        self.sort = Some(match self.sort.take() {
            Some(sort) if sort.field == field => Sort {
                direction: sort.direction.flip(),
                ..sort
            },
            _ => Sort {
                field: field.to_string(),
                direction: SortDirection::Asc,
            },
        });
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }
}

/// Keeps records whose searchable fields contain `term`, ignoring case.
///
/// A blank term keeps everything.
pub fn search<T: Record>(items: Vec<T>, term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| {
            T::DESCRIPTOR.search.iter().any(|name| {
                item.field(name)
                    .is_some_and(|value| value.to_string().to_lowercase().contains(&needle))
            })
        })
        .collect()
}

/// Keeps records matching every filter by strict typed equality.
pub fn filter<T: Record>(items: Vec<T>, filters: &BTreeMap<String, FieldValue>) -> Vec<T> {
    if filters.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| {
            filters
                .iter()
                .all(|(name, expected)| item.field(name).as_ref() == Some(expected))
        })
        .collect()
}

/// Stable sort in either direction: records with equal keys keep their
/// relative order.
pub fn sort<T: Record>(items: &mut [T], sort: &Sort) {
    items.sort_by(|a, b| {
        let ordering = match (a.field(&sort.field), b.field(&sort.field)) {
            (Some(a), Some(b)) => a.compare(&b),
            (a, b) => a.is_some().cmp(&b.is_some()),
        };
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Filter, search and sort without paginating. What an export sees.
pub fn arrange<T: Record>(items: Vec<T>, query: &ListQuery) -> Vec<T> {
    let mut items = search(filter(items, &query.filters), &query.search);
    if let Some(order) = &query.sort {
        sort(&mut items, order);
    }
    items
}

/// One page of an arranged list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Items across all pages.
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// Slices `[(page-1)*size, page*size)`. Pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let offset = (page - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(offset).take(page_size).collect();
    Page {
        items,
        total,
        page,
        page_count: total.div_ceil(page_size),
    }
}

/// The full pipeline for one table view.
pub fn run<T: Record>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    paginate(arrange(items, query), query.page, query.page_size)
}

/// An entry of the pager under a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Previous { enabled: bool },
    Number { page: usize, current: bool },
    Gap,
    Next { enabled: bool },
}

impl<T> Page<T> {
    /// Pager entries: two pages either side of the current one, plus the
    /// first and last pages with a gap marker when they are not adjacent.
    /// Empty when everything fits on one page.
    pub fn links(&self) -> Vec<PageLink> {
        let count = self.page_count;
        if count <= 1 {
            return Vec::new();
        }
        let current = self.page;
        let start = current.saturating_sub(2).max(1);
        let end = current.saturating_add(2).min(count);

        let mut links = vec![PageLink::Previous { enabled: current > 1 }];
        if start > 1 {
            links.push(PageLink::Number { page: 1, current: false });
            if start > 2 {
                links.push(PageLink::Gap);
            }
        }
        links.extend((start..=end).map(|page| PageLink::Number {
            page,
            current: page == current,
        }));
        if end < count {
            if end + 1 < count {
                links.push(PageLink::Gap);
            }
            links.push(PageLink::Number { page: count, current: false });
        }
        links.push(PageLink::Next { enabled: current < count });
        links
    }
}

use serde::Serialize;

pub const DEFAULT_COUNT_PER_PAGE: u64 = 10;
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Page bounds computed once per builder from a total count and a requested
/// page number. Frozen after computation; the builder memoizes it so a
/// mid-request count change cannot shift the offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    count_per_page: u64,
    page_count: u64,
    current_page: u64,
    current_offset: u64,
    next_page: Option<u64>,
    prev_page: Option<u64>,
    page_param: String,
}

impl Paginator {
    /// Pure calculation of page bounds. `requested_page` may be any integer;
    /// it is clamped into `1..=max(1, page_count)`.
    pub fn paginate(count: u64, count_per_page: u64, requested_page: i64) -> Self {
        let count_per_page = count_per_page.max(1);
        let page_count = count.div_ceil(count_per_page);

        let requested = if requested_page < 1 {
            1
        } else {
            requested_page as u64
        };
        let current_page = requested.clamp(1, page_count.max(1));
        let current_offset = ((current_page - 1) * count_per_page).min(count);

        let next_page = (current_page + 1 <= page_count).then(|| current_page + 1);
        let prev_page = (current_page > 1).then(|| current_page - 1);

        Self {
            count,
            count_per_page,
            page_count,
            current_page,
            current_offset,
            next_page,
            prev_page,
            page_param: DEFAULT_PAGE_PARAM.to_string(),
        }
    }

    /// Name of the request parameter the page number was read from, carried
    /// through to the rendering snapshot
    pub fn with_page_param(mut self, name: &str) -> Self {
        self.page_param = name.to_string();
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn count_per_page(&self) -> u64 {
        self.count_per_page
    }

    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    pub fn next_page(&self) -> Option<u64> {
        self.next_page
    }

    pub fn prev_page(&self) -> Option<u64> {
        self.prev_page
    }

    pub fn page_param(&self) -> &str {
        &self.page_param
    }

    /// Read-only snapshot for a view layer to consume
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            count_per_page: self.count_per_page,
            count: self.count,
            page_count: self.page_count,
            current_page: self.current_page,
            current_offset: self.current_offset,
            next_page: self.next_page,
            prev_page: self.prev_page,
            page_param: self.page_param.clone(),
        }
    }
}

/// Serializable pagination state for link rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    pub count_per_page: u64,
    pub count: u64,
    pub page_count: u64,
    pub current_page: u64,
    pub current_offset: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
    pub page_param: String,
}

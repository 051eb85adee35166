pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp into `[1, max(1, total_pages)]`.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: u32, current: bool },
    Ellipsis,
}

pub fn page_items(current: u32, total_pages: u32) -> Vec<PageItem> {
    let current = i64::from(current);
    let total = i64::from(total_pages);
    let mut items = Vec::new();

    for number in 1..=total {
        if number <= 2 || number > total - 2 || (number - current).abs() <= 1 {
            items.push(PageItem::Page {
                number: number as u32,
                current: number == current,
            });
        } else if (number == 3 && current > 5) || (number == total - 2 && current < total - 3) {
            items.push(PageItem::Ellipsis);
        }
    }
    items
}

pub fn can_go_previous(current: u32) -> bool {
    current > 1
}

pub fn can_go_next(current: u32, total_pages: u32) -> bool {
    current < total_pages
}

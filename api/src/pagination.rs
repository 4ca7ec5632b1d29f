use std::num::IntErrorKind;

use serde::Serialize;

pub const PAGE_SIZE: i64 = 10;

/// Splits `count` rows into fixed-size, 1-based pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Turn a raw `?page=` value into a page number that exists.
    ///
    /// Missing or non-integer values give the first page; integers out of
    /// range (zero and negatives included) give the last one.
    pub fn resolve(&self, raw: Option<&str>) -> i64 {
        let Some(raw) = raw else {
            return 1;
        };
        let number = match raw.trim().parse::<i64>() {
            Ok(number) => number,
            // still an integer, just one no page can have
            Err(e)
                if matches!(
                    e.kind(),
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                ) =>
            {
                return self.num_pages();
            }
            Err(_) => return 1,
        };
        if number < 1 || number > self.num_pages() {
            self.num_pages()
        } else {
            number
        }
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            count: self.count,
            has_next: number < self.num_pages(),
            has_previous: number > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, 10).num_pages(), 1);
        assert_eq!(Paginator::new(1, 10).num_pages(), 1);
        assert_eq!(Paginator::new(10, 10).num_pages(), 1);
        assert_eq!(Paginator::new(11, 10).num_pages(), 2);
        assert_eq!(Paginator::new(25, 10).num_pages(), 3);
    }

    #[test]
    fn test_non_integer_page_falls_back_to_first() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.resolve(Some("abc")), 1);
        assert_eq!(paginator.resolve(Some("2.0")), 1);
        assert_eq!(paginator.resolve(Some("")), 1);
        assert_eq!(paginator.resolve(None), 1);
    }

    #[test]
    fn test_out_of_range_page_falls_back_to_last() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.resolve(Some("999")), 3);
        assert_eq!(paginator.resolve(Some("0")), 3);
        assert_eq!(paginator.resolve(Some("-1")), 3);
        assert_eq!(paginator.resolve(Some("99999999999999999999")), 3);
        assert_eq!(paginator.resolve(Some("-99999999999999999999")), 3);
    }

    #[test]
    fn test_in_range_page() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.resolve(Some("2")), 2);
        assert_eq!(paginator.resolve(Some(" 3 ")), 3);
        assert_eq!(paginator.offset(3), 20);
    }

    #[test]
    fn test_page_flags() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        let first = paginator.page(1, vec![0; 10]);
        assert!(first.has_next);
        assert!(!first.has_previous);
        let last = paginator.page(3, vec![0; 5]);
        assert!(!last.has_next);
        assert!(last.has_previous);
        assert_eq!(last.count, 25);
    }
}

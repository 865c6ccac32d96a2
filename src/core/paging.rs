//! Skip/take paging descriptor

use serde::{Deserialize, Serialize};

/// A bounded sub-range of a result set
///
/// `take == 0` means the request is not pageable and callers should read the
/// whole result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PageInfo {
    skip: u64,
    take: u64,
}

impl PageInfo {
    /// Page from an explicit row offset and row count
    pub fn from_skip_take(skip: u64, take: u64) -> Self {
        Self { skip, take }
    }

    /// Page from a 1-based page number and a page size
    ///
    /// Page numbers below 1 are treated as the first page.
    pub fn from_page_number(page_number: u64, page_size: u64) -> Self {
        let page_index = page_number.max(1) - 1;
        Self {
            skip: page_index.saturating_mul(page_size),
            take: page_size,
        }
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn take(&self) -> u64 {
        self.take
    }

    pub fn is_pageable(&self) -> bool {
        self.take > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_skip_take() {
        let page = PageInfo::from_skip_take(20, 10);
        assert_eq!(page.skip(), 20);
        assert_eq!(page.take(), 10);
        assert!(page.is_pageable());
    }

    #[test]
    fn test_zero_take_is_not_pageable() {
        assert!(!PageInfo::from_skip_take(5, 0).is_pageable());
        assert!(!PageInfo::default().is_pageable());
    }

    #[test]
    fn test_from_page_number() {
        assert_eq!(PageInfo::from_page_number(1, 25), PageInfo::from_skip_take(0, 25));
        assert_eq!(PageInfo::from_page_number(3, 25), PageInfo::from_skip_take(50, 25));
        assert_eq!(PageInfo::from_page_number(0, 25), PageInfo::from_skip_take(0, 25));
    }
}

use space_types::GridItem;

/// Rectangle in grid cells. Half-open on both axes, so rectangles that only
/// share an edge do not intersect and zero-sized ones intersect nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Full-width band covering rows `0..rows`.
    pub const fn top_rows(rows: u32, columns: u32) -> Self {
        Self::new(0, 0, columns, rows)
    }

    pub fn intersects(&self, other: &Region) -> bool {
        let (ax2, ay2) = (
            u64::from(self.x) + u64::from(self.w),
            u64::from(self.y) + u64::from(self.h),
        );
        let (bx2, by2) = (
            u64::from(other.x) + u64::from(other.w),
            u64::from(other.y) + u64::from(other.h),
        );
        u64::from(self.x) < bx2
            && u64::from(other.x) < ax2
            && u64::from(self.y) < by2
            && u64::from(other.y) < ay2
            && self.w > 0
            && self.h > 0
            && other.w > 0
            && other.h > 0
    }
}

impl From<&GridItem> for Region {
    fn from(item: &GridItem) -> Self {
        Self::new(item.x, item.y, item.w, item.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_and_adjacency() {
        let a = Region::new(0, 0, 4, 4);
        assert!(a.intersects(&Region::new(3, 3, 2, 2)));
        assert!(!a.intersects(&Region::new(4, 0, 2, 2)));
        assert!(!a.intersects(&Region::new(0, 4, 2, 2)));
        assert!(a.intersects(&Region::new(1, 1, 1, 1)));
    }

    #[test]
    fn empty_regions_never_intersect() {
        let a = Region::new(0, 0, 4, 4);
        assert!(!a.intersects(&Region::new(1, 1, 0, 3)));
    }

    #[test]
    fn no_overflow_at_edges() {
        let a = Region::new(u32::MAX - 1, 0, u32::MAX, 1);
        assert!(a.intersects(&Region::new(u32::MAX - 1, 0, 1, 1)));
    }

    #[test]
    fn top_rows_band() {
        let header = Region::top_rows(2, 12);
        assert!(header.intersects(&Region::new(11, 1, 1, 1)));
        assert!(!header.intersects(&Region::new(0, 2, 12, 1)));
    }
}

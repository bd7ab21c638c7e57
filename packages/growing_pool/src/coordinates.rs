/// Internal coordinates of a slot within the bucketed storage.
///
/// A 32-bit slot index splits into the bucket number and the offset within
/// that bucket. `BUCKET_SIZE` is a power of two, so the split is a shift and
/// a mask, with no division anywhere on the lookup path.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlotCoordinates<const BUCKET_SIZE: usize> {
    /// The index of the bucket containing this slot.
    bucket_index: usize,

    /// The index within the bucket where this slot is stored.
    index_in_bucket: usize,
}

impl<const BUCKET_SIZE: usize> SlotCoordinates<BUCKET_SIZE> {
    /// Bit width of the in-bucket part of a slot index.
    const BUCKET_SHIFT: u32 = BUCKET_SIZE.trailing_zeros();

    /// Low-bit mask selecting the in-bucket part of a slot index.
    /// `BUCKET_SIZE` is a power of two, so its predecessor is the mask.
    const INDEX_MASK: usize = BUCKET_SIZE.wrapping_sub(1);

    #[must_use]
    pub(crate) fn from_index(index: u32) -> Self {
        let index = usize::try_from(index)
            .expect("a 32-bit slot index always fits in usize on supported platforms");

        Self {
            bucket_index: index >> Self::BUCKET_SHIFT,
            index_in_bucket: index & Self::INDEX_MASK,
        }
    }

    #[must_use]
    pub(crate) fn to_index(self) -> u32 {
        let combined = self
            .bucket_index
            .checked_mul(BUCKET_SIZE)
            .and_then(|x| x.checked_add(self.index_in_bucket))
            .expect("a slot index beyond the range of virtual memory cannot arise from a valid history");

        u32::try_from(combined)
            .expect("slot indexes are bounded by the pool capacity, which fits in a 32-bit handle")
    }

    /// The index of the bucket containing this slot.
    #[must_use]
    pub(crate) fn bucket_index(&self) -> usize {
        self.bucket_index
    }

    /// The index within the bucket where this slot is stored.
    #[must_use]
    pub(crate) fn index_in_bucket(&self) -> usize {
        self.index_in_bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_bucket_boundaries() {
        let coordinates = SlotCoordinates::<8>::from_index(0);
        assert_eq!(coordinates.bucket_index(), 0);
        assert_eq!(coordinates.index_in_bucket(), 0);

        let coordinates = SlotCoordinates::<8>::from_index(7);
        assert_eq!(coordinates.bucket_index(), 0);
        assert_eq!(coordinates.index_in_bucket(), 7);

        let coordinates = SlotCoordinates::<8>::from_index(8);
        assert_eq!(coordinates.bucket_index(), 1);
        assert_eq!(coordinates.index_in_bucket(), 0);

        let coordinates = SlotCoordinates::<8>::from_index(199);
        assert_eq!(coordinates.bucket_index(), 24);
        assert_eq!(coordinates.index_in_bucket(), 7);
    }

    #[test]
    fn round_trips_through_raw_index() {
        for index in [0_u32, 1, 7, 8, 9, 127, 128, 4095, 4096] {
            assert_eq!(SlotCoordinates::<128>::from_index(index).to_index(), index);
        }
    }

    #[test]
    fn reassembles_from_split_parts() {
        let coordinates = SlotCoordinates::<16>::from_index(53);
        assert_eq!(coordinates.bucket_index(), 3);
        assert_eq!(coordinates.index_in_bucket(), 5);
        assert_eq!(coordinates.to_index(), 53);
    }
}

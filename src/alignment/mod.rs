pub mod normalization;
pub mod report;
pub mod scoring;
pub mod segmentation;
pub mod temporal;

/// Length of the intersection of two half-open millisecond intervals.
pub fn overlap_ms(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> u64 {
    a_end.min(b_end).saturating_sub(a_start.max(b_start))
}

#[cfg(test)]
mod tests {
    use super::overlap_ms;

    #[test]
    fn overlap_of_half_open_intervals() {
        assert_eq!(overlap_ms(0, 5000, 4000, 9000), 1000);
        assert_eq!(overlap_ms(4000, 9000, 0, 5000), 1000);
        assert_eq!(overlap_ms(0, 5000, 5000, 9000), 0);
        assert_eq!(overlap_ms(0, 5000, 6000, 9000), 0);
        assert_eq!(overlap_ms(1000, 2000, 0, 9000), 1000);
    }
}

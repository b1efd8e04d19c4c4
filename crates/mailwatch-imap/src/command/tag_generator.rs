//! Command tags.

/// Hands out `A0000`, `A0001`, ... to the commands of one connection.
///
/// A session never has two commands in flight, so the counter simply wraps
/// at `u32::MAX`.
#[derive(Debug, Default)]
pub struct TagGenerator {
    issued: u32,
}

impl TagGenerator {
    /// Returns the tag for the next command.
    pub fn next_tag(&mut self) -> String {
        let tag = format!("A{:04}", self.issued);
        self.issued = self.issued.wrapping_add(1);
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_count_up_from_zero() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next_tag(), "A0000");
        assert_eq!(tags.next_tag(), "A0001");
    }

    #[test]
    fn padding_stops_at_four_digits() {
        let mut tags = TagGenerator { issued: 12_345 };
        assert_eq!(tags.next_tag(), "A12345");
    }

    #[test]
    fn counter_wraps() {
        let mut tags = TagGenerator { issued: u32::MAX };
        assert_eq!(tags.next_tag(), format!("A{}", u32::MAX));
        assert_eq!(tags.next_tag(), "A0000");
    }
}

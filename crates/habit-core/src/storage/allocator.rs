use tracing::warn;

use super::is_blank;
use crate::record;

/// Next unused id: one past the largest decodable id, or 1 for a store with
/// no decodable records. Malformed lines are skipped.
pub fn next_id(content: &[u8]) -> u64 {
    content
        .split(|b| *b == b'\n')
        .enumerate()
        .filter(|(_, line)| !is_blank(line))
        .filter_map(|(index, line)| match record::decode_bytes(line) {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!(line = index + 1, "skipping habit: {e}");
                None
            }
        })
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_starts_at_one() {
        assert_eq!(next_id(b""), 1);
        assert_eq!(next_id(b"\n\n"), 1);
    }

    #[test]
    fn uses_max_not_last_or_count() {
        let content = b"7\tread\tcoffee\t0\t0\n2\twalk\tnap\t3\t0\n";
        assert_eq!(next_id(content), 8);
    }

    #[test]
    fn malformed_lines_contribute_nothing() {
        let content = b"garbage\n3\tread\tcoffee\t0\t0\n99\tbroken\n";
        assert_eq!(next_id(content), 4);
    }

    #[test]
    fn invalid_utf8_lines_contribute_nothing() {
        assert_eq!(next_id(b"\xff\t9\n3\tread\tcoffee\t0\t0\n"), 4);
    }

    #[test]
    fn only_malformed_lines_starts_at_one() {
        assert_eq!(next_id(b"not a record\nneither\tis\tthis\n"), 1);
    }
}

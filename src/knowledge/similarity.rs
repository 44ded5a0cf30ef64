//! Character-level "longest matching block" similarity.
//!
//! The ratio is `2 * M / (len(a) + len(b))` where `M` is the number of
//! characters covered by the matching blocks found by repeatedly taking the
//! longest common substring and recursing on the unmatched sides. Among
//! equally long blocks the one starting earliest in `a`, then in `b`, wins, so
//! the result is fully deterministic.

/// Canonical form used for both queries and stored questions.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Similarity in `[0, 1]` between two already normalized strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let block = longest_match(a, b, a_lo..a_hi, b_lo..b_hi);
        if block.size == 0 {
            continue;
        }

        matched += block.size;
        if a_lo < block.a_start && b_lo < block.b_start {
            pending.push((a_lo, block.a_start, b_lo, block.b_start));
        }
        let a_end = block.a_start + block.size;
        let b_end = block.b_start + block.size;
        if a_end < a_hi && b_end < b_hi {
            pending.push((a_end, a_hi, b_end, b_hi));
        }
    }

    matched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    size: usize,
}

fn longest_match(
    a: &[char],
    b: &[char],
    a_range: std::ops::Range<usize>,
    b_range: std::ops::Range<usize>,
) -> Block {
    let mut best = Block {
        a_start: a_range.start,
        b_start: b_range.start,
        size: 0,
    };
    let width = b_range.len() + 1;
    // run_len[k] = length of the common suffix ending at a[i - 1], b[b_lo + k - 1]
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];

    for i in a_range {
        for (offset, j) in b_range.clone().enumerate() {
            current[offset + 1] = if a[i] == b[j] {
                previous[offset] + 1
            } else {
                0
            };

            let run = current[offset + 1];
            if run > best.size {
                best = Block {
                    a_start: i + 1 - run,
                    b_start: j + 1 - run,
                    size: run,
                };
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::{normalize, sequence_ratio};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn identical_strings_score_one() {
        assert_close(sequence_ratio("what does eva do?", "what does eva do?"), 1.0);
    }

    #[test]
    fn empty_inputs() {
        assert_close(sequence_ratio("", ""), 1.0);
        assert_close(sequence_ratio("abc", ""), 0.0);
        assert_close(sequence_ratio("", "abc"), 0.0);
    }

    #[test]
    fn disjoint_alphabets_score_zero() {
        assert_close(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn known_ratios() {
        // "abcd" vs "bcde": one block "bcd" -> 2*3/8
        assert_close(sequence_ratio("abcd", "bcde"), 0.75);
        // "abxcd" vs "abcd": blocks "ab" and "cd" -> 2*4/9
        assert_close(sequence_ratio("abxcd", "abcd"), 8.0 / 9.0);
    }

    #[test]
    fn blocks_do_not_cross() {
        // Longest block "ab" is at the end of b, so "cd" on its left cannot pair
        // with the "cd" right of "ab" in a.
        assert_close(sequence_ratio("abcd", "cdab"), 0.5);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_close(sequence_ratio("café", "cafe"), 0.75);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  EVA?  "), "eva?");
        assert_eq!(normalize("\tWhat Does CAM Do?\n"), "what does cam do?");
    }

    #[test]
    fn ratio_is_deterministic() {
        let a = normalize("How does PHIL work?");
        let b = normalize("How does the payment posting agent (PHIL) work?");
        let first = sequence_ratio(&a, &b);
        for _ in 0..10 {
            assert_eq!(sequence_ratio(&a, &b), first);
        }
        assert!(first > 0.4, "ratio {first}");
    }
}

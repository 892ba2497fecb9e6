//! Ratcliff/Obershelp string similarity (gestalt pattern matching).
//!
//! `ratio = 2·M / T` where `M` is the number of characters in the matching
//! blocks (longest common substring, then recursively left and right of it)
//! and `T` the total length of both strings. Works on `char`s so accented
//! text counts one unit per letter.

use std::collections::HashMap;

/// Sequences this long or longer drop "popular" characters from the index,
/// the same heuristic the classic implementation applies.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Compares candidates against one fixed target sequence.
pub struct SequenceMatcher {
    target: Vec<char>,
    /// char → ascending positions in `target`
    index: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(target: &str) -> Self {
        let target: Vec<char> = target.chars().collect();
        let mut index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in target.iter().enumerate() {
            index.entry(*c).or_default().push(j);
        }

        let n = target.len();
        if n >= AUTOJUNK_MIN_LEN {
            let threshold = n / 100 + 1;
            index.retain(|_, positions| positions.len() <= threshold);
        }

        Self { target, index }
    }

    /// Similarity of `candidate` to the target, in `0.0..=1.0`.
    pub fn ratio(&self, candidate: &str) -> f64 {
        let source: Vec<char> = candidate.chars().collect();
        let total = source.len() + self.target.len();
        if total == 0 {
            return 1.0;
        }
        let matched = self.matched_chars(&source);
        2.0 * matched as f64 / total as f64
    }

    /// Upper bound of `ratio` from lengths alone.
    pub fn real_quick_ratio(&self, candidate: &str) -> f64 {
        let la = candidate.chars().count();
        let lb = self.target.len();
        if la + lb == 0 {
            return 1.0;
        }
        2.0 * la.min(lb) as f64 / (la + lb) as f64
    }

    fn matched_chars(&self, source: &[char]) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, source.len(), 0, self.target.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(source, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    /// Longest block `source[i..i+k] == target[j..j+k]` inside the window.
    /// Ties go to the earliest block in `source`, then in `target`.
    fn longest_match(
        &self,
        source: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        // j → length of the match ending at (i - 1, j)
        let mut run: HashMap<usize, usize> = HashMap::new();

        for (i, c) in source.iter().enumerate().take(ahi).skip(alo) {
            let mut next_run: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.index.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = if j == 0 { 1 } else { run.get(&(j - 1)).copied().unwrap_or(0) + 1 };
                    next_run.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run = next_run;
        }

        // popular chars are missing from the index; grow the block through them
        while best_i > alo && best_j > blo && source[best_i - 1] == self.target[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && source[best_i + best_k] == self.target[best_j + best_k]
        {
            best_k += 1;
        }
        (best_i, best_j, best_k)
    }
}

/// One-shot similarity of two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(b).ratio(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_disjoint() {
        assert!((ratio("abcd", "abcd") - 1.0).abs() < 1e-9);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert!((ratio("", "") - 1.0).abs() < 1e-9);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_known_values() {
        // classic difflib examples
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
        assert!((ratio("apple", "ape") - 0.75).abs() < 1e-9);
        // "qabxcd" vs "abycdf": blocks "ab" + "cd" → 2·4 / 12
        assert!((ratio("qabxcd", "abycdf") - 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 'è' is two bytes but one unit
        assert!((ratio("perché", "perche") - 10.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_target_extends_through_popular_chars() {
        // every 'a' is popular in a 250-char target, so only extension finds the block
        let target = "a".repeat(250);
        assert!((ratio("aaaa", &target) - 8.0 / 254.0).abs() < 1e-9);

        let target = format!("x{}y", "a".repeat(250));
        assert!((ratio("xaay", &target) - 8.0 / 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_real_quick_ratio_is_upper_bound() {
        let matcher = SequenceMatcher::new("chi è il sindaco");
        for candidate in ["chi e il sindaco", "sindaco", "qualcosa di diverso"] {
            assert!(matcher.real_quick_ratio(candidate) >= matcher.ratio(candidate));
        }
    }
}

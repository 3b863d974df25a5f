//! Payment code tokens.
//!
//! Tokens are what donors type into the purpose line of a bank transfer, so
//! they are short, use an alphabet without easily confused glyphs (no `0/O`,
//! `1/I/L`, `2/Z`, `8/B`...) and never repeat a character twice in a row.
//!
//! Two tokens are kept far apart: a new token is only accepted when its
//! weighted edit distance (insert/delete cost 1, substitution cost 2) to every
//! existing token is larger than [`MIN_TOKEN_DISTANCE`]. For equal-length
//! tokens that means they share at most three characters in order, which also
//! guarantees a plain Levenshtein distance of at least 5 between any two
//! tokens. A typed reference within [`MAX_REFERENCE_DISTANCE`] of one token
//! can therefore never be as close to another one.

use rand::Rng;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHKLMNRSTWX3459";
pub const TOKEN_LEN: usize = 8;
/// Weighted distance a new token must exceed against every existing token.
pub const MIN_TOKEN_DISTANCE: usize = 8;
/// Largest Levenshtein distance at which a typed word still matches a token.
pub const MAX_REFERENCE_DISTANCE: usize = 2;
pub const MAX_GENERATION_ATTEMPTS: usize = 10_000;

/// Edit distance with configurable costs.
pub fn edit_distance(
    left: &str,
    right: &str,
    indel_cost: usize,
    substitution_cost: usize,
) -> usize {
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();

    if left.is_empty() {
        return right.len() * indel_cost;
    }
    if right.is_empty() {
        return left.len() * indel_cost;
    }

    let mut costs: Vec<usize> = (0..=right.len()).map(|j| j * indel_cost).collect();

    for (i, left_char) in left.iter().enumerate() {
        let mut last_cost = i * indel_cost;
        costs[0] = (i + 1) * indel_cost;
        for (j, right_char) in right.iter().enumerate() {
            let next_cost = costs[j + 1];
            let mut cost = if left_char == right_char {
                last_cost
            } else {
                last_cost + substitution_cost
            };
            cost = cost
                .min(costs[j] + indel_cost)
                .min(next_cost + indel_cost);
            costs[j + 1] = cost;
            last_cost = next_cost;
        }
    }

    costs[right.len()]
}

pub fn levenshtein(left: &str, right: &str) -> usize {
    edit_distance(left, right, 1, 1)
}

/// Distance used for the anti-collision check between tokens.
pub fn token_distance(left: &str, right: &str) -> usize {
    edit_distance(left, right, 1, 2)
}

/// Returns `true` if no character directly follows an identical one.
pub fn has_no_adjacent_repeats(token: &str) -> bool {
    let chars: Vec<char> = token.chars().collect();
    chars.windows(2).all(|pair| pair[0] != pair[1])
}

/// Draw a random token of [`TOKEN_LEN`] characters without adjacent repeats.
pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut token = String::with_capacity(TOKEN_LEN);
    let mut last: Option<usize> = None;
    for _ in 0..TOKEN_LEN {
        // Draw among the characters that differ from the previous one.
        let choices = TOKEN_ALPHABET.len() - usize::from(last.is_some());
        let mut index = rng.random_range(0..choices);
        if let Some(previous) = last
            && index >= previous
        {
            index += 1;
        }
        token.push(char::from(TOKEN_ALPHABET[index]));
        last = Some(index);
    }
    token
}

/// Draw tokens until one is far enough from every token in `existing`.
pub fn generate_distinct_token<R, S>(existing: &[S], rng: &mut R) -> ResultEngine<String>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let candidate = generate_token(rng);
        let clash = existing
            .iter()
            .map(AsRef::as_ref)
            .find(|token| token_distance(token, &candidate) <= MIN_TOKEN_DISTANCE);
        match clash {
            None => return Ok(candidate),
            Some(token) => {
                tracing::debug!(
                    attempt,
                    candidate = %candidate,
                    existing = %token,
                    "token too similar, retrying"
                );
            }
        }
    }
    Err(EngineError::TokenSpaceExhausted(MAX_GENERATION_ATTEMPTS))
}

/// Canonical form of free text before matching: NFKC and ASCII uppercase.
pub fn normalize_reference(text: &str) -> String {
    text.nfkc().collect::<String>().to_ascii_uppercase()
}

/// Split a normalized reference into candidate words.
///
/// Words whose length alone puts them out of reach of any token are dropped.
pub fn reference_words(text: &str) -> Vec<String> {
    let min_len = TOKEN_LEN.saturating_sub(MAX_REFERENCE_DISTANCE);
    let max_len = TOKEN_LEN + MAX_REFERENCE_DISTANCE;
    normalize_reference(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| (min_len..=max_len).contains(&word.chars().count()))
        .map(ToString::to_string)
        .collect()
}

/// Pick the token the reference most likely names.
///
/// Returns `None` when no word is within [`MAX_REFERENCE_DISTANCE`] of a token
/// or when two different tokens are equally close.
pub fn closest_token<'a, I>(reference: &str, tokens: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let words = reference_words(reference);
    if words.is_empty() {
        return None;
    }

    let mut best: Option<(usize, &'a str)> = None;
    let mut ambiguous = false;
    for token in tokens {
        let Some(distance) = words.iter().map(|word| levenshtein(word, token)).min() else {
            continue;
        };
        if distance > MAX_REFERENCE_DISTANCE {
            continue;
        }
        match best {
            Some((best_distance, _)) if distance > best_distance => {}
            Some((best_distance, best_token)) if distance == best_distance => {
                if best_token != token {
                    ambiguous = true;
                }
            }
            _ => {
                best = Some((distance, token));
                ambiguous = false;
            }
        }
    }

    if ambiguous {
        return None;
    }
    best.map(|(_, token)| token)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn distance_costs() {
        assert_eq!(levenshtein("KITTEN", "SITTING"), 3);
        assert_eq!(levenshtein("", "ABC"), 3);
        assert_eq!(token_distance("ABCD", "ABXD"), 2);
        assert_eq!(token_distance("ABCD", "ABD"), 1);
        assert_eq!(token_distance("ABCDEFGH", "KLMNRSTW"), 16);
    }

    #[test]
    fn generated_tokens_use_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let token = generate_token(&mut rng);
            assert_eq!(token.len(), TOKEN_LEN);
            assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
            assert!(has_no_adjacent_repeats(&token));
        }
    }

    #[test]
    fn distinct_tokens_keep_their_distance() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tokens: Vec<String> = Vec::new();
        for _ in 0..50 {
            let token = generate_distinct_token(&tokens, &mut rng).unwrap();
            tokens.push(token);
        }
        for (i, left) in tokens.iter().enumerate() {
            for right in &tokens[i + 1..] {
                assert!(token_distance(left, right) > MIN_TOKEN_DISTANCE);
            }
        }
    }

    /// Always yields zero, so every draw picks the lowest allowed index.
    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn degenerate_rng_still_alternates() {
        assert_eq!(generate_token(&mut ZeroRng), "ABABABAB");
    }

    #[test]
    fn exhausts_instead_of_looping() {
        let existing = vec!["ABABABAB".to_string()];
        let err = generate_distinct_token(&existing, &mut ZeroRng).unwrap_err();
        assert_eq!(err, EngineError::TokenSpaceExhausted(MAX_GENERATION_ATTEMPTS));
    }

    #[test]
    fn resolves_exact_and_typo_references() {
        let tokens = ["KM3SAT9W", "DHXR5NCE"];
        assert_eq!(
            closest_token("Donation KM3SAT9W thanks", tokens),
            Some("KM3SAT9W")
        );
        assert_eq!(closest_token("spende km3sat9w", tokens), Some("KM3SAT9W"));
        // one substitution, one deletion
        assert_eq!(closest_token("DHXR5MCE", tokens), Some("DHXR5NCE"));
        assert_eq!(closest_token("ref:DHXR5C.", tokens), Some("DHXR5NCE"));
    }

    #[test]
    fn refuses_to_guess() {
        let tokens = ["KM3SAT9W", "DHXR5NCE"];
        assert_eq!(closest_token("monthly donation", tokens), None);
        assert_eq!(closest_token("KMXXAT9Q", tokens), None);
        assert_eq!(closest_token("", tokens), None);
    }

    #[test]
    fn normalizes_fullwidth_input() {
        assert_eq!(normalize_reference("ｋｍ３sat"), "KM3SAT");
    }

    proptest! {
        #[test]
        fn levenshtein_is_symmetric(a in "[A-Z]{0,10}", b in "[A-Z]{0,10}") {
            prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
        }

        #[test]
        fn weighted_distance_bounds_plain(a in "[A-Z]{0,10}", b in "[A-Z]{0,10}") {
            let plain = levenshtein(&a, &b);
            let weighted = token_distance(&a, &b);
            prop_assert!(weighted >= plain);
            prop_assert!(weighted <= 2 * plain);
        }
    }
}

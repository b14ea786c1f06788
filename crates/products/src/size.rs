//! Size inference from free-text product names.

const LETTER_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];

/// Infer a size label from a product name.
///
/// Looks for the first whole word that is a letter size (`XS`..`XXL`, any
/// case) or a two-digit number (`38`, `42`). Returns it uppercased.
pub fn infer_size(name: &str) -> Option<String> {
    name.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .find_map(|token| {
            let upper = token.to_ascii_uppercase();
            let is_letter_size = LETTER_SIZES.contains(&upper.as_str());
            let is_numeric_size = token.len() == 2 && token.bytes().all(|b| b.is_ascii_digit());
            (is_letter_size || is_numeric_size).then_some(upper)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_letter_sizes_case_insensitively() {
        assert_eq!(infer_size("Cotton shirt xl").as_deref(), Some("XL"));
        assert_eq!(infer_size("Dress (S) white").as_deref(), Some("S"));
    }

    #[test]
    fn finds_two_digit_sizes() {
        assert_eq!(infer_size("Jeans slim 32/34").as_deref(), Some("32"));
    }

    #[test]
    fn ignores_sizes_inside_words() {
        assert_eq!(infer_size("Classic Mules"), None);
        assert_eq!(infer_size("Article 123"), None);
        assert_eq!(infer_size("XXXL coat"), None);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(infer_size("M 42 blazer").as_deref(), Some("M"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

            #[test]
            fn inferred_size_is_a_whole_word_of_the_name(name in "[ a-zA-Z0-9()/-]{0,40}") {
                if let Some(size) = infer_size(&name) {
                    let numeric = size.len() == 2 && size.bytes().all(|b| b.is_ascii_digit());
                    prop_assert!(numeric || LETTER_SIZES.contains(&size.as_str()));
                    let upper = name.to_ascii_uppercase();
                    prop_assert!(upper
                        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .any(|token| token == size));
                }
            }
        }
    }
}

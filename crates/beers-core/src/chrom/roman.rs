//! Minimal roman numeral evaluation for chromosome names.

/// Evaluate a roman numeral built from i, v and x (case-insensitive).
///
/// Parsing is permissive: the usual subtractive rule applies (a smaller value
/// before a larger one is subtracted), and any sequence of the three symbols
/// evaluates to something, so yeast-style names like "xii" and sloppy ones
/// like "iix" both order sensibly. Returns `None` if any other character is
/// present.
pub fn roman_to_arabic(numeral: &str) -> Option<u64> {
    let values: Vec<u64> = numeral
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            'i' => Some(1),
            'v' => Some(5),
            'x' => Some(10),
            _ => None,
        })
        .collect::<Option<_>>()?;
    if values.is_empty() {
        return None;
    }
    let mut total: i64 = 0;
    for (index, &value) in values.iter().enumerate() {
        if values[index + 1..].iter().any(|&next| next > value) {
            total -= value as i64;
        } else {
            total += value as i64;
        }
    }
    u64::try_from(total).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_numerals_evaluate() {
        assert_eq!(roman_to_arabic("i"), Some(1));
        assert_eq!(roman_to_arabic("iv"), Some(4));
        assert_eq!(roman_to_arabic("ix"), Some(9));
        assert_eq!(roman_to_arabic("xii"), Some(12));
        assert_eq!(roman_to_arabic("XVI"), Some(16));
    }

    #[test]
    fn non_roman_input_is_rejected() {
        assert_eq!(roman_to_arabic(""), None);
        assert_eq!(roman_to_arabic("xy"), None);
        assert_eq!(roman_to_arabic("12"), None);
    }
}

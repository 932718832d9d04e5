/// Parse an act, scene or sonnet number written in arabic or roman digits.
///
/// Roman numerals use subtractive notation: a symbol followed by a larger one
/// is subtracted, otherwise added. Returns `None` for anything else and for
/// zero.
pub fn parse_numeral(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<u32>().ok().filter(|n| *n > 0);
    }
    roman_to_int(raw)
}

fn roman_value(c: char) -> Option<u32> {
    match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

fn roman_to_int(raw: &str) -> Option<u32> {
    let mut total: i64 = 0;
    let mut prev = 0u32;
    for c in raw.chars().rev() {
        let value = roman_value(c)?;
        if value >= prev {
            total += i64::from(value);
        } else {
            total -= i64::from(value);
        }
        prev = value;
    }
    u32::try_from(total).ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::parse_numeral;

    #[test]
    fn roman_numerals() {
        assert_eq!(parse_numeral("I"), Some(1));
        assert_eq!(parse_numeral("IV"), Some(4));
        assert_eq!(parse_numeral("ix"), Some(9));
        assert_eq!(parse_numeral("XLIV"), Some(44));
        assert_eq!(parse_numeral("CLIV"), Some(154));
        assert_eq!(parse_numeral("MCMXC"), Some(1990));
    }

    #[test]
    fn digits_pass_through() {
        assert_eq!(parse_numeral("18"), Some(18));
        assert_eq!(parse_numeral(" 154 "), Some(154));
        assert_eq!(parse_numeral("0"), None);
    }

    #[test]
    fn rejects_non_numerals() {
        assert_eq!(parse_numeral(""), None);
        assert_eq!(parse_numeral("IVY"), None);
        assert_eq!(parse_numeral("12a"), None);
    }
}

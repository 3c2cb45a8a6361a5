/// Splits a trailing `k`/`m`/`g` size suffix (case-insensitive) off `value`.
fn read_float_and_factor(value: &str) -> Option<(f64, usize)> {
    let value = value.trim();
    let last = value.chars().last()?;

    let factor = match last {
        'g' | 'G' => 1024 * 1024 * 1024,
        'm' | 'M' => 1024 * 1024,
        'k' | 'K' => 1024,
        _ => 1,
    };

    let digits = if factor == 1 {
        value
    } else {
        &value[..value.len() - 1]
    };

    digits.parse::<f64>().ok().map(|x| (x, factor))
}

/// Parses counts such as `4096`, `64k` or `1m`.
pub fn read_uint_from_str(value: &str) -> Option<usize> {
    let (value, factor) = read_float_and_factor(value)?;
    if value < 0.0 || !value.is_finite() {
        return None;
    }

    Some(value as usize * factor)
}

#[cfg(test)]
mod tests {
    use super::read_uint_from_str;

    #[test]
    fn suffixes() {
        assert_eq!(read_uint_from_str("4096"), Some(4096));
        assert_eq!(read_uint_from_str("64k"), Some(64 * 1024));
        assert_eq!(read_uint_from_str("2M"), Some(2 * 1024 * 1024));
        assert_eq!(read_uint_from_str("-3"), None);
        assert_eq!(read_uint_from_str("k"), None);
        assert_eq!(read_uint_from_str(""), None);
    }
}

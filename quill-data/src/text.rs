//! Parsing of the numeric prefix of textual values.
//!
//! Text is converted to a number by reading its longest valid numeric prefix after trimming
//! whitespace; anything after that prefix is a truncation, which the [`StatementContext`] decides
//! how to treat.
//!
//! [`StatementContext`]: crate::StatementContext

/// The longest numeric prefix of some text, split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumericPrefix<'a> {
    /// The whole prefix, exactly as written
    pub(crate) text: &'a str,
    pub(crate) negative: bool,
    pub(crate) int_digits: &'a str,
    pub(crate) frac_digits: &'a str,
    /// Exponent digits including their sign, if any
    pub(crate) exponent: Option<&'a str>,
}

fn digits_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |n| start + n)
}

fn sign_end(bytes: &[u8], start: usize) -> usize {
    match bytes.get(start) {
        Some(b'+' | b'-') => start + 1,
        _ => start,
    }
}

/// Returns the longest prefix of `s` that is an optionally-signed integer, which may be empty.
pub(crate) fn int_prefix(s: &str) -> NumericPrefix<'_> {
    let bytes = s.as_bytes();
    let digits_start = sign_end(bytes, 0);
    let end = digits_end(bytes, digits_start);
    if end == digits_start {
        return NumericPrefix::empty();
    }
    NumericPrefix {
        text: &s[..end],
        negative: bytes[0] == b'-',
        int_digits: &s[digits_start..end],
        frac_digits: "",
        exponent: None,
    }
}

/// Returns the longest prefix of `s` that is an optionally-signed decimal number with an optional
/// fractional part and exponent, which may be empty.
pub(crate) fn float_prefix(s: &str) -> NumericPrefix<'_> {
    let bytes = s.as_bytes();
    let int_start = sign_end(bytes, 0);
    let int_end = digits_end(bytes, int_start);
    let mut end = int_end;

    let mut frac = (int_end, int_end);
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = digits_end(bytes, int_end + 1);
        if frac_end > int_end + 1 || int_end > int_start {
            frac = (int_end + 1, frac_end);
            end = frac_end;
        }
    }
    if int_end == int_start && frac.0 == frac.1 {
        return NumericPrefix::empty();
    }

    let mut exponent = None;
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_digits = sign_end(bytes, end + 1);
        let exp_end = digits_end(bytes, exp_digits);
        if exp_end > exp_digits {
            exponent = Some(&s[end + 1..exp_end]);
            end = exp_end;
        }
    }

    NumericPrefix {
        text: &s[..end],
        negative: bytes[0] == b'-',
        int_digits: &s[int_start..int_end],
        frac_digits: &s[frac.0..frac.1],
        exponent,
    }
}

impl<'a> NumericPrefix<'a> {
    fn empty() -> Self {
        Self {
            text: "",
            negative: false,
            int_digits: "",
            frac_digits: "",
            exponent: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Renders the mantissa as `[-]digits[.digits]`, with a leading zero if the integer part was
    /// omitted.
    pub(crate) fn mantissa(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 1);
        if self.negative {
            out.push('-');
        }
        if self.int_digits.is_empty() {
            out.push('0');
        } else {
            out.push_str(self.int_digits);
        }
        if !self.frac_digits.is_empty() {
            out.push('.');
            out.push_str(self.frac_digits);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_prefixes() {
        assert_eq!(int_prefix("123abc").text, "123");
        assert_eq!(int_prefix("-42").text, "-42");
        assert!(int_prefix("-42").negative);
        assert_eq!(int_prefix("+7.5").int_digits, "7");
        assert!(int_prefix("abc").is_empty());
        assert!(int_prefix("-").is_empty());
        assert!(int_prefix("").is_empty());
    }

    #[test]
    fn float_prefixes() {
        assert_eq!(float_prefix("1.5e3xyz").text, "1.5e3");
        assert_eq!(float_prefix("1.5e3xyz").exponent, Some("3"));
        assert_eq!(float_prefix("1.5e").text, "1.5");
        assert_eq!(float_prefix("1e-2").exponent, Some("-2"));
        assert_eq!(float_prefix(".5").text, ".5");
        assert_eq!(float_prefix(".5").mantissa(), "0.5");
        assert_eq!(float_prefix("-3.").text, "-3.");
        assert_eq!(float_prefix("-3.").mantissa(), "-3");
        assert!(float_prefix(".").is_empty());
        assert!(float_prefix("-.e5").is_empty());
        assert!(float_prefix("abc").is_empty());
    }
}

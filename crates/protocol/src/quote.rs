//! Go-compatible string literals.
//!
//! Names and file paths are written as interpreted string literals so that a
//! Go scanner and this crate read the same log.

/// Quote `value` as a Go interpreted string literal.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode the body of a Go interpreted string literal (without the quotes).
///
/// The error is a human readable reason; the lexer attaches the position.
pub fn unquote(body: &str) -> std::result::Result<String, String> {
    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let escape = chars.next().ok_or("trailing backslash")?;
        match escape {
            'a' => bytes.push(0x07),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0c),
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'v' => bytes.push(0x0b),
            '\\' => bytes.push(b'\\'),
            '"' => bytes.push(b'"'),
            'x' => bytes.push(take_hex(&mut chars, 2)? as u8),
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                let code = take_hex(&mut chars, width)?;
                let c = char::from_u32(code)
                    .ok_or_else(|| format!("escape is not a valid code point: {code:#x}"))?;
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    let digit = chars
                        .next()
                        .and_then(|c| c.to_digit(8))
                        .ok_or("short octal escape")?;
                    value = value * 8 + digit;
                }
                let byte = u8::try_from(value).map_err(|_| "octal escape out of range")?;
                bytes.push(byte);
            }
            other => return Err(format!("unknown escape sequence \\{other}")),
        }
    }
    String::from_utf8(bytes).map_err(|_| "literal is not valid UTF-8".to_string())
}

fn take_hex(chars: &mut std::str::Chars<'_>, width: usize) -> std::result::Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..width {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| format!("expected {width} hex digits"))?;
        value = value * 16 + digit;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quotes_special_characters() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(quote("tab\there"), r#""tab\there""#);
        assert_eq!(quote("\u{1}"), r#""\x01""#);
    }

    #[test]
    fn unquotes_go_escapes() {
        assert_eq!(unquote(r"\x41é\101\n").unwrap(), "Aé\u{41}\n");
    }

    #[test]
    fn rejects_unknown_escape() {
        assert!(unquote(r"\q").is_err());
        assert!(unquote("\\").is_err());
    }

    proptest! {
        #[test]
        fn proptest_quote_is_reversible(value in "\\PC*") {
            let quoted = quote(&value);
            let body = &quoted[1..quoted.len() - 1];
            prop_assert_eq!(unquote(body).unwrap(), value);
        }
    }
}

//! Text escaping for the hand-written XML documents (RSS and sitemaps).

use std::fmt::Write;

/// A character XML 1.0 has no way to represent, not even as a character
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}` contains U+{code:04X}, which XML 1.0 cannot represent")]
pub struct InvalidChar {
    pub field: &'static str,
    pub code: u32,
}

fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{FFFE}' | '\u{FFFF}' => false,
        c => c >= ' ',
    }
}

/// Fails if `input` holds a character XML 1.0 cannot carry. `field` names the
/// offending field in the error.
pub fn check(field: &'static str, input: &str) -> Result<(), InvalidChar> {
    match input.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(InvalidChar {
            field,
            code: c as u32,
        }),
        None => Ok(()),
    }
}

/// Escapes the five XML-reserved characters in `input`.
pub fn escape(field: &'static str, input: &str) -> Result<String, InvalidChar> {
    check(field, input)?;
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Appends `<name>escaped text</name>` with the given indentation.
pub fn element(
    out: &mut String,
    indent: usize,
    name: &str,
    field: &'static str,
    text: &str,
) -> Result<(), InvalidChar> {
    let text = escape(field, text)?;
    // Writing into a `String` can't fail.
    let _ = writeln!(out, "{:indent$}<{name}>{text}</{name}>", "", indent = indent, name = name, text = text);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            Ok("Tom &amp; Jerry &lt;3 &quot;cheese&quot; &apos;n&apos; &gt;".to_owned()),
            escape("title", r#"Tom & Jerry <3 "cheese" 'n' >"#)
        );
        assert_eq!(Ok("改行\nと\tタブ".to_owned()), escape("title", "改行\nと\tタブ"));
    }

    #[test]
    fn test_control_characters_are_rejected() {
        assert_eq!(
            Err(InvalidChar {
                field: "description",
                code: 0x0B
            }),
            escape("description", "vertical\u{0B}tab")
        );
        assert!(check("title", "nul\u{0}").is_err());
    }

    #[test]
    fn test_element() -> Result<(), InvalidChar> {
        let mut out = String::new();
        element(&mut out, 2, "title", "title", "a<b")?;
        assert_eq!("  <title>a&lt;b</title>\n", out);
        Ok(())
    }
}

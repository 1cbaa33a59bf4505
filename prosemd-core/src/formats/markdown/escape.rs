//! Backslash escaping for text written into Markdown.
//!
//! Escaping is conservative: a character is escaped whenever it could start
//! or close a construct, and a few block markers are escaped only where they
//! would take effect, at the start of a line. Line endings inside text are
//! written as character references, since a raw one would end the line.

/// Characters that are always escaped in text.
const ALWAYS: &[char] = &['\\', '`', '*', '_', '[', ']', '<', '~'];

/// Characters that open a block construct when they start a line.
const LINE_START: &[char] = &['#', '>', '-', '+', '=', '|'];

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Escaper {
    /// `#` anywhere would be read as (closing) heading markup.
    pub in_heading: bool,
    /// Text like `:name:` would be read as an emoji shortcode.
    pub shortcodes: bool,
}

impl Escaper {
    /// Appends `text` to `out`, escaped. Whether a character sits at the
    /// start of a line is decided by what `out` already holds.
    pub fn escape_into(&self, text: &str, out: &mut String) {
        let mut line_start = out.is_empty() || out.ends_with('\n');
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            let rest = &chars[i + 1..];

            // `1.` or `1)` would open an ordered list item.
            if line_start && ch.is_ascii_digit() {
                let digits = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
                if let Some(&delimiter @ ('.' | ')')) = chars.get(i + digits) {
                    out.extend(&chars[i..i + digits]);
                    out.push('\\');
                    out.push(delimiter);
                    i += digits + 1;
                    line_start = false;
                    continue;
                }
            }

            if ch == '\n' || ch == '\r' {
                out.push_str(if ch == '\n' { "&#10;" } else { "&#13;" });
                line_start = false;
                i += 1;
                continue;
            }

            let escape = ALWAYS.contains(&ch)
                || (ch == '#' && self.in_heading)
                || (line_start && LINE_START.contains(&ch))
                || (ch == '&' && looks_like_entity(rest))
                || (ch == '!' && rest.is_empty())
                || (ch == ':' && self.shortcodes && looks_like_shortcode(rest));

            if escape {
                out.push('\\');
            }
            out.push(ch);
            line_start = line_start && (ch == ' ' || ch == '\t');
            i += 1;
        }
    }
}

/// `&name;`, `&#123;` or `&#x1F;` follows.
fn looks_like_entity(rest: &[char]) -> bool {
    let Some(end) = rest.iter().position(|&c| c == ';') else {
        return false;
    };
    let body = &rest[..end];
    match body {
        [] => false,
        ['#', 'x' | 'X', hex @ ..] => !hex.is_empty() && hex.iter().all(char::is_ascii_hexdigit),
        ['#', digits @ ..] => !digits.is_empty() && digits.iter().all(char::is_ascii_digit),
        [first, tail @ ..] => {
            first.is_ascii_alphabetic() && tail.iter().all(char::is_ascii_alphanumeric)
        }
    }
}

/// `name:` follows, for a shortcode name made of `[a-z0-9_+-]`.
fn looks_like_shortcode(rest: &[char]) -> bool {
    let name = rest
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
        .count();
    name > 0 && rest.get(name) == Some(&':')
}

/// Escapes a link destination, wrapping it in angle brackets when it holds
/// characters a bare destination cannot.
pub(crate) fn link_destination(href: &str) -> String {
    let needs_angle = href.is_empty()
        || href
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>');
    let mut out = String::with_capacity(href.len() + 2);
    if needs_angle {
        out.push('<');
        for ch in href.chars() {
            if matches!(ch, '<' | '>' | '\\') {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('>');
    } else {
        let chars: Vec<char> = href.chars().collect();
        for (i, &ch) in chars.iter().enumerate() {
            if matches!(ch, '(' | ')' | '\\')
                || (ch == '&' && looks_like_entity(&chars[i + 1..]))
            {
                out.push('\\');
            }
            out.push(ch);
        }
    }
    out
}

/// A quoted link title.
pub(crate) fn link_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len() + 2);
    out.push('"');
    for ch in title.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Length of the longest run of `ch` in `text`.
pub(crate) fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Whether `text` can be written as `<text>` and read back as a link to
/// `text` itself.
pub(crate) fn is_autolink_target(text: &str) -> bool {
    if text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
    {
        return false;
    }
    match text.split_once(':') {
        Some((scheme, _)) => {
            (2..=32).contains(&scheme.len())
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        }
        None => is_email(text),
    }
}

fn is_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c))
                && !domain.is_empty()
                && domain.split('.').all(|label| {
                    !label.is_empty()
                        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                })
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(text: &str) -> String {
        let mut out = String::new();
        Escaper::default().escape_into(text, &mut out);
        out
    }

    #[test]
    fn test_inline_delimiters_are_escaped() {
        assert_eq!(escape("a*b_c`d"), r"a\*b\_c\`d");
        assert_eq!(escape("[x](y)"), r"\[x\](y)");
        assert_eq!(escape("a\\b"), r"a\\b");
    }

    #[test]
    fn test_line_start_markers() {
        assert_eq!(escape("# not a heading"), r"\# not a heading");
        assert_eq!(escape("- item"), r"\- item");
        assert_eq!(escape("> quote"), r"\> quote");
        assert_eq!(escape("1. one"), r"1\. one");
        assert_eq!(escape("12) twelve"), r"12\) twelve");
        assert_eq!(escape("   - item"), r"   \- item");
    }

    #[test]
    fn test_line_endings_become_references() {
        assert_eq!(escape("a\n+ b"), "a&#10;+ b");
        assert_eq!(escape("a\r\nb"), "a&#13;&#10;b");
    }

    #[test]
    fn test_markers_mid_line_are_kept() {
        assert_eq!(escape("a # b - c 1. d"), "a # b - c 1. d");
    }

    #[test]
    fn test_heading_escapes_every_hash() {
        let mut out = String::new();
        Escaper {
            in_heading: true,
            ..Default::default()
        }
        .escape_into("C# and F#", &mut out);
        assert_eq!(out, r"C\# and F\#");
    }

    #[test]
    fn test_entities_and_shortcodes() {
        assert_eq!(escape("a & b"), "a & b");
        assert_eq!(escape("&amp; &#35; &#x41;"), r"\&amp; \&#35; \&#x41;");

        let mut out = String::new();
        Escaper {
            shortcodes: true,
            ..Default::default()
        }
        .escape_into("time: :smile: ok", &mut out);
        assert_eq!(out, r"time: \:smile: ok");
    }

    #[test]
    fn test_trailing_bang() {
        assert_eq!(escape("wow!"), r"wow\!");
        assert_eq!(escape("wow! ok"), "wow! ok");
    }

    #[test]
    fn test_link_destination() {
        assert_eq!(link_destination("https://x.com"), "https://x.com");
        assert_eq!(link_destination("a(b)"), r"a\(b\)");
        assert_eq!(link_destination("with space"), "<with space>");
        assert_eq!(link_destination(""), "<>");
        assert_eq!(link_title(r#"say "hi""#), r#""say \"hi\"""#);
    }

    #[test]
    fn test_autolink_targets() {
        assert!(is_autolink_target("https://x.com"));
        assert!(is_autolink_target("me@example.com"));
        assert!(!is_autolink_target("not a url"));
        assert!(!is_autolink_target("x:y"));
        assert!(!is_autolink_target("plain"));
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("a``b```c", '`'), 3);
        assert_eq!(longest_run("none", '`'), 0);
    }
}

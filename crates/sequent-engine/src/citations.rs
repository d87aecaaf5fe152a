//! Citation scanning
//!
//! Statements may reference definitions as `def:NAME` and externals as
//! `ext:ID`. A citation token starts at a `def:`/`ext:` prefix that is
//! not glued to a preceding word character and extends over
//! `[A-Za-z0-9_.-]`.

/// A reference found inside a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    /// `def:NAME` — a named definition
    Def(String),
    /// `ext:ID` — an external record
    Ext(String),
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Extract every citation from `text`, in order of appearance.
pub fn scan(text: &str) -> Vec<Citation> {
    let mut citations = Vec::new();
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        let rest = &text[index..];
        let (prefix, is_def) = if rest.starts_with("def:") {
            (4, true)
        } else if rest.starts_with("ext:") {
            (4, false)
        } else {
            index += text[index..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            continue;
        };

        // Not a citation when glued to a preceding word character
        // ("undef:x" cites nothing).
        let preceded_by_word = text[..index]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if preceded_by_word {
            index += prefix;
            continue;
        }

        let body: String = rest[prefix..].chars().take_while(|c| is_token_char(*c)).collect();
        if body.is_empty() {
            index += prefix;
            continue;
        }
        let len = body.len();
        citations.push(if is_def {
            Citation::Def(body)
        } else {
            Citation::Ext(body)
        });
        index += prefix + len;
    }
    citations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_def_and_ext_citations() {
        let text = "By def:group and ext:zorn-lemma, every def:chain has a bound.";
        assert_eq!(
            scan(text),
            vec![
                Citation::Def("group".to_string()),
                Citation::Ext("zorn-lemma".to_string()),
                Citation::Def("chain".to_string()),
            ]
        );
    }

    #[test]
    fn token_ends_at_non_token_characters() {
        assert_eq!(
            scan("(def:ring), then"),
            vec![Citation::Def("ring".to_string())]
        );
        assert_eq!(scan("def:a.b-c_d!"), vec![Citation::Def("a.b-c_d".to_string())]);
    }

    #[test]
    fn glued_prefixes_are_not_citations() {
        assert!(scan("undef:x").is_empty());
        assert!(scan("text:y").is_empty());
        assert!(scan("def: (empty name)").is_empty());
    }

    #[test]
    fn plain_text_has_no_citations() {
        assert!(scan("P implies Q").is_empty());
    }
}

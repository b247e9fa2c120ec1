/// One line of search input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Blank line; nothing to do
    Empty,
    /// Every occurrence of a word
    Basic(String),
    /// Occurrences of `word` in `filename`, once that file is indexed
    Advanced { filename: String, word: String },
    /// More than two terms
    Malformed,
}

impl Query {
    /// Parses a line: one term is a basic search, two terms are
    /// `<filename> <word>`, anything more is malformed.
    pub fn parse(line: &str) -> Self {
        let mut terms = line
            .split([' ', '\t', '\r', '\n'])
            .filter(|term| !term.is_empty());

        match (terms.next(), terms.next(), terms.next()) {
            (None, _, _) => Query::Empty,
            (Some(word), None, _) => Query::Basic(word.to_string()),
            (Some(filename), Some(word), None) => Query::Advanced {
                filename: filename.to_string(),
                word: word.to_string(),
            },
            _ => Query::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        assert_eq!(Query::parse("hello"), Query::Basic("hello".to_string()));
        assert_eq!(
            Query::parse("  hello \t\n"),
            Query::Basic("hello".to_string())
        );
    }

    #[test]
    fn test_parse_advanced() {
        assert_eq!(
            Query::parse("file2 world"),
            Query::Advanced {
                filename: "file2".to_string(),
                word: "world".to_string()
            }
        );
        assert_eq!(
            Query::parse("dir/a.txt\tword\r\n"),
            Query::Advanced {
                filename: "dir/a.txt".to_string(),
                word: "word".to_string()
            }
        );
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert_eq!(Query::parse(""), Query::Empty);
        assert_eq!(Query::parse(" \t \n"), Query::Empty);
        assert_eq!(Query::parse("a b c"), Query::Malformed);
        assert_eq!(Query::parse("a b c d"), Query::Malformed);
    }
}

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// The token source could not produce a well-formed next token
/// (malformed bytes, bad encoding, truncated markup mid-token).
///
/// Wraps the underlying cause unchanged; the tree builder aborts the
/// parse as soon as one of these surfaces.
#[derive(Debug, Error)]
#[error("malformed markup: {0}")]
pub struct TokenizeError(Box<dyn std::error::Error + Send + Sync>);

impl TokenizeError {
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(cause.into())
    }
}

impl From<quick_xml::Error> for TokenizeError {
    fn from(err: quick_xml::Error) -> Self {
        Self::new(err)
    }
}

/// One structural unit of the markup stream.
///
/// Attribute pairs keep document order and may contain duplicate names;
/// the tree builder applies last-write-wins when it materializes a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Element start: local tag name plus ordered (name, value) attribute pairs.
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Element end, carrying the closing tag's local name.
    End { name: String },
    /// Anything else (text, comment, CDATA, PI, declaration). Opaque.
    Other,
}

/// A streaming producer of [`Token`]s over a markup document.
///
/// The tree builder consumes a source exactly once, front to back.
/// `Ok(None)` signals exhaustion; tokenization failures must surface as
/// `Err` rather than a silently truncated stream.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError>;
}

/// [`TokenSource`] over an in-memory XML document, backed by `quick-xml`.
///
/// Self-closing elements are expanded into start/end pairs so the tree
/// builder sees one uniform token shape. End-tag name checking is left
/// to the builder, which reports mismatches with the open-element
/// context the tokenizer does not have.
///
/// XXE note: quick-xml (0.37) never parses `<!ENTITY>` declarations, and
/// `decode_and_unescape_value` only resolves the five XML builtins, so
/// custom entities fail instead of expanding.
pub struct XmlTokenSource<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
}

impl<'a> XmlTokenSource<'a> {
    pub fn new(content: &'a str) -> Self {
        let mut reader = Reader::from_str(content);
        let config = reader.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;
        config.check_end_names = false;
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl TokenSource for XmlTokenSource<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let decoder = self.reader.decoder();
                let mut attributes = Vec::new();
                // Unchecked: duplicate attribute names must flow through in
                // document order; the tree builder resolves them last-wins.
                for attr in e.attributes().with_checks(false) {
                    let attr = attr.map_err(TokenizeError::new)?;
                    let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                    let value = attr
                        .decode_and_unescape_value(decoder)
                        .map_err(TokenizeError::new)?
                        .into_owned();
                    attributes.push((key, value));
                }
                Ok(Some(Token::Start { name, attributes }))
            }
            Ok(Event::End(e)) => Ok(Some(Token::End {
                name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            })),
            Ok(Event::Eof) => Ok(None),
            Ok(_) => Ok(Some(Token::Other)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(content: &str) -> Vec<Token> {
        let mut source = XmlTokenSource::new(content);
        let mut tokens = Vec::new();
        while let Some(token) = source.next_token().unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_start_end_pair() {
        let tokens = drain(r#"<outline text="a"></outline>"#);
        assert_eq!(
            tokens,
            vec![
                Token::Start {
                    name: "outline".into(),
                    attributes: vec![("text".into(), "a".into())],
                },
                Token::End {
                    name: "outline".into()
                },
            ]
        );
    }

    #[test]
    fn test_self_closing_expands_to_pair() {
        let tokens = drain(r#"<outline text="a"/>"#);
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[0], Token::Start { .. }));
        assert_eq!(
            tokens[1],
            Token::End {
                name: "outline".into()
            }
        );
    }

    #[test]
    fn test_duplicate_attributes_preserved_in_order() {
        let tokens = drain(r#"<outline x="1" x="2"/>"#);
        match &tokens[0] {
            Token::Start { attributes, .. } => {
                assert_eq!(
                    attributes,
                    &vec![("x".into(), "1".into()), ("x".into(), "2".into())]
                );
            }
            other => panic!("expected start token, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_values_unescaped() {
        let tokens = drain(r#"<outline title="a &amp; b"/>"#);
        match &tokens[0] {
            Token::Start { attributes, .. } => {
                assert_eq!(attributes[0].1, "a & b");
            }
            other => panic!("expected start token, got {:?}", other),
        }
    }

    #[test]
    fn test_namespaced_tag_yields_local_name() {
        let tokens = drain(r#"<x:outline xmlns:x="urn:x" x:type="rss"></x:outline>"#);
        match &tokens[0] {
            Token::Start { name, attributes } => {
                assert_eq!(name, "outline");
                // xmlns declaration and prefixed attribute both reduce to local names
                assert!(attributes.iter().any(|(k, v)| k == "type" && v == "rss"));
            }
            other => panic!("expected start token, got {:?}", other),
        }
    }

    #[test]
    fn test_text_and_comments_are_other() {
        let tokens = drain("<head><!-- c -->text</head>");
        assert_eq!(
            tokens
                .iter()
                .filter(|t| matches!(t, Token::Other))
                .count(),
            2
        );
    }

    #[test]
    fn test_truncated_tag_is_tokenize_error() {
        let mut source = XmlTokenSource::new("<not valid");
        let mut result = source.next_token();
        // The syntax error may surface on the first or second pull depending
        // on how far the tokenizer gets before hitting EOF mid-tag.
        if result.is_ok() {
            result = source.next_token();
        }
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_entity_rejected() {
        let mut source = XmlTokenSource::new(r#"<outline text="&xxe;"/>"#);
        assert!(source.next_token().is_err());
    }
}

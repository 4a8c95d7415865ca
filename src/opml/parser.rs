use std::path::Path;

use thiserror::Error;

use super::model::{Document, Outline};
use super::tokens::{Token, TokenSource, TokenizeError, XmlTokenSource};

/// Default cap on `<outline>` nesting depth. Bounds work on maliciously
/// deep subscription lists; override with [`Parser::with_max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 50;

const OUTLINE_TAG: &str = "outline";

/// Errors produced while building the outline tree.
#[derive(Debug, Error)]
pub enum OpmlError {
    /// The token source failed; the cause is propagated unchanged.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// The stream ended while an outline element was still open.
    #[error("unexpected end of input: <{tag}> was never closed")]
    UnexpectedEof { tag: String },

    /// A closing tag did not name the innermost open element.
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedTag { expected: String, found: String },

    /// Outline nesting depth exceeds the configured limit.
    #[error("outline nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// File I/O error (only from [`parse_file`]).
    #[error("failed to read OPML file: {0}")]
    Io(#[from] std::io::Error),
}

/// One open element on the builder's stack.
///
/// Outline elements materialize nodes; everything else is a pass-through
/// container whose outline descendants attach to the nearest enclosing
/// outline frame (or the document body when there is none).
enum Frame {
    Entry(Outline),
    Container { name: String },
}

impl Frame {
    fn name(&self) -> &str {
        match self {
            Frame::Entry(_) => OUTLINE_TAG,
            Frame::Container { name } => name,
        }
    }
}

/// Streaming outline-tree builder.
///
/// Consumes a [`TokenSource`] front to back in a single pass and returns
/// the [`Document`] tree. The traversal uses an explicit frame stack
/// rather than recursion, so markup nesting depth never drives call
/// stack depth; outline depth is additionally capped by `max_depth`.
///
/// Holds no state across invocations — one `Parser` can serve any
/// number of sequential `parse` calls.
#[derive(Debug, Clone)]
pub struct Parser {
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Build the outline tree, consuming the source fully.
    ///
    /// Only elements named `outline` become nodes. Other elements are
    /// tracked as open containers so their end tags can be verified, but
    /// produce nothing: outlines nested inside them flatten to the
    /// nearest outline ancestor or to the document body.
    ///
    /// # Errors
    ///
    /// - [`OpmlError::Tokenize`] — the source failed to produce a token
    /// - [`OpmlError::UnexpectedEof`] — stream ended inside an open outline
    /// - [`OpmlError::MismatchedTag`] — a close tag named the wrong element
    /// - [`OpmlError::MaxDepthExceeded`] — outline nesting beyond the cap
    pub fn parse<S: TokenSource>(&self, mut source: S) -> Result<Document, OpmlError> {
        let mut body = Outline::default();
        let mut stack: Vec<Frame> = Vec::new();
        // Open outline elements only; containers do not count toward the cap.
        let mut depth: usize = 0;

        while let Some(token) = source.next_token()? {
            match token {
                Token::Start { name, attributes } => {
                    if name == OUTLINE_TAG {
                        depth += 1;
                        if depth > self.max_depth {
                            return Err(OpmlError::MaxDepthExceeded(self.max_depth));
                        }
                        stack.push(Frame::Entry(Outline::with_attributes(attributes)));
                    } else {
                        stack.push(Frame::Container { name });
                    }
                }
                Token::End { name } => match stack.pop() {
                    // Document-level close (opml, body, ...): nothing open, discard.
                    None => {}
                    Some(Frame::Container { name: opened }) => {
                        if opened != name {
                            return Err(OpmlError::MismatchedTag {
                                expected: opened,
                                found: name,
                            });
                        }
                    }
                    Some(Frame::Entry(node)) => {
                        if name != OUTLINE_TAG {
                            return Err(OpmlError::MismatchedTag {
                                expected: OUTLINE_TAG.to_owned(),
                                found: name,
                            });
                        }
                        depth -= 1;
                        attach(&mut stack, &mut body, node);
                    }
                },
                Token::Other => {}
            }
        }

        if depth > 0 {
            if let Some(frame) = stack.last() {
                return Err(OpmlError::UnexpectedEof {
                    tag: frame.name().to_owned(),
                });
            }
        }

        Ok(Document::new(body))
    }

    pub fn parse_str(&self, content: &str) -> Result<Document, OpmlError> {
        self.parse(XmlTokenSource::new(content))
    }
}

/// Append a completed node to the nearest enclosing outline frame, or to
/// the document body when only containers (or nothing) enclose it.
fn attach(stack: &mut [Frame], body: &mut Outline, node: Outline) {
    for frame in stack.iter_mut().rev() {
        if let Frame::Entry(parent) = frame {
            parent.push_child(node);
            return;
        }
    }
    body.push_child(node);
}

/// Parse an OPML document from a string with the default depth limit.
pub fn parse_str(content: &str) -> Result<Document, OpmlError> {
    Parser::new().parse_str(content)
}

/// Read and parse an OPML file with the default depth limit.
pub async fn parse_file(path: &Path) -> Result<Document, OpmlError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_str(&content)
}

//! Minimal XML document reader for ISAPI response bodies.
//!
//! ISAPI replies are small, flat documents. The reader validates that the
//! body is well-formed and records every element with its direct text so
//! callers can look fields up by tag name, ignoring namespaces.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Errors produced while reading a response body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("document has no root element")]
    NoRoot,

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("content after the root element")]
    TrailingContent,

    #[error("text outside the root element")]
    StrayText,
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    text: String,
}

/// A parsed, well-formed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Elements in document order; index 0 is the root.
    elements: Vec<Element>,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut elements: Vec<Element> = Vec::new();
        // (element index, has seen a child element)
        let mut stack: Vec<(usize, bool)> = Vec::new();
        let mut root_closed = false;

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Syntax {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;

            match event {
                Event::Start(_) | Event::Empty(_) if root_closed => {
                    return Err(XmlError::TrailingContent);
                }
                Event::Start(e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.1 = true;
                    }
                    elements.push(Element {
                        name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                        text: String::new(),
                    });
                    stack.push((elements.len() - 1, false));
                }
                Event::Empty(e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.1 = true;
                    }
                    elements.push(Element {
                        name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                        text: String::new(),
                    });
                    if stack.is_empty() {
                        root_closed = true;
                    }
                }
                Event::End(_) => {
                    stack.pop();
                    if stack.is_empty() {
                        root_closed = true;
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| XmlError::Syntax {
                        position: reader.buffer_position(),
                        message: err.to_string(),
                    })?;
                    push_text(&mut elements, &stack, &text)?;
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    push_text(&mut elements, &stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&(open, _)) = stack.last() {
            return Err(XmlError::Unclosed(elements[open].name.clone()));
        }
        if elements.is_empty() {
            return Err(XmlError::NoRoot);
        }

        Ok(Self { elements })
    }

    /// Local name of the root element.
    pub fn root_name(&self) -> &str {
        &self.elements[0].name
    }

    /// Text of the first descendant of the root named `tag`.
    ///
    /// Matches on local name at any depth. Elements with only whitespace
    /// are reported as absent.
    pub fn find_text(&self, tag: &str) -> Option<&str> {
        self.elements
            .iter()
            .skip(1)
            .find(|el| el.name == tag)
            .map(|el| el.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Whether any descendant of the root is named `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.elements.iter().skip(1).any(|el| el.name == tag)
    }
}

fn push_text(
    elements: &mut [Element],
    stack: &[(usize, bool)],
    text: &str,
) -> Result<(), XmlError> {
    match stack.last() {
        // Only text before the first child counts as the element's own text.
        Some(&(idx, false)) => {
            elements[idx].text.push_str(text);
            Ok(())
        }
        Some(_) => Ok(()),
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::StrayText),
    }
}

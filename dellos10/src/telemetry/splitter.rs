//! Splitting of concatenated XML replies.

use memchr::memmem;

/// Declaration re-attached to every document yielded by [`split`].
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

const DECLARATION_START: &[u8] = b"<?xml";

/// Lazy iterator over the XML documents contained in one raw reply.
///
/// Cloning the iterator restarts it from the same position, so a caller can
/// walk the documents more than once without touching the device again.
#[derive(Debug, Clone)]
pub struct XmlDocuments<'a> {
    raw: &'a str,
    pos: usize,
}

/// Split a raw reply into individually parseable documents.
///
/// Each yielded string starts with [`XML_DECLARATION`] followed by the body
/// of one document. Content before the first declaration is kept as a
/// document only if it holds markup.
///
/// ```rust
/// let docs: Vec<String> =
///     dellos10::telemetry::split(r#"<?xml version="1.0"?><a/><?xml version="1.0"?><b/>"#).collect();
/// assert_eq!(docs.len(), 2);
/// ```
pub fn split(raw: &str) -> XmlDocuments<'_> {
    XmlDocuments { raw, pos: 0 }
}

impl XmlDocuments<'_> {
    /// Find the next declaration at or after `from`, returning its start offset.
    fn next_declaration(&self, from: usize) -> Option<usize> {
        let bytes = self.raw.as_bytes();
        let mut search = from;
        while search < bytes.len() {
            let found = memmem::find(&bytes[search..], DECLARATION_START)? + search;
            // `<?xml-stylesheet` and friends are processing instructions, not declarations.
            match bytes.get(found + DECLARATION_START.len()) {
                Some(b) if b.is_ascii_whitespace() || *b == b'?' => return Some(found),
                _ => search = found + DECLARATION_START.len(),
            }
        }
        None
    }

    /// Offset just past the `?>` that closes the declaration starting at `start`.
    fn declaration_end(&self, start: usize) -> usize {
        match memmem::find(&self.raw.as_bytes()[start..], b"?>") {
            Some(offset) => start + offset + 2,
            None => self.raw.len(),
        }
    }
}

impl Iterator for XmlDocuments<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.raw.len() {
            let (body_start, is_leading) = match self.next_declaration(self.pos) {
                Some(start) if start == self.pos || self.raw[self.pos..start].trim().is_empty() => {
                    (self.declaration_end(start), false)
                }
                // Text ahead of the next declaration, or a reply without any.
                _ => (self.pos, true),
            };

            let body_end = self
                .next_declaration(body_start)
                .unwrap_or(self.raw.len());
            self.pos = body_end;

            let body = self.raw[body_start..body_end].trim();
            if body.is_empty() || (is_leading && !body.contains('<')) {
                continue;
            }

            return Some(format!("{XML_DECLARATION}\n{body}"));
        }
        None
    }
}

impl std::iter::FusedIterator for XmlDocuments<'_> {}

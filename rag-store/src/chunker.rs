//! Splits a [`TravelNode`] tree into bounded-size chunks.
//!
//! Greedy packing over the tree in canonical key order: a value is added
//! whole to the current chunk if it fits, otherwise to a fresh chunk, and only
//! when it does not fit even alone does the splitter descend into it. Every
//! chunk keeps the path from the root, so a chunk reads as a partial copy of
//! the document. Arrays that have to be split are rendered as objects keyed
//! by element index.

use std::collections::BTreeMap;

use tracing::debug;

use crate::document::{SourceDocument, TravelNode};
use crate::errors::RagError;

/// One bounded sub-document.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    /// Position in the split output.
    pub ordinal: usize,
    pub node: TravelNode,
    /// Canonical JSON of `node`; this is what gets embedded.
    pub text: String,
}

/// Recursive structure-aware splitter.
#[derive(Clone, Copy, Debug)]
pub struct JsonChunker {
    max_chars: usize,
}

impl JsonChunker {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Splits a loaded document.
    pub fn split_document(&self, doc: &SourceDocument) -> Result<Vec<Chunk>, RagError> {
        self.split(&doc.root)
    }

    /// Splits `root` into chunks whose serialized size is at most `max_chars`.
    ///
    /// # Errors
    /// [`RagError::OversizedLeaf`] if some leaf cannot fit even in a chunk of its own.
    pub fn split(&self, root: &TravelNode) -> Result<Vec<Chunk>, RagError> {
        let nodes = if root.json_len() <= self.max_chars {
            vec![root.clone()]
        } else {
            let mut packer = Packer {
                max: self.max_chars,
                chunks: vec![BTreeMap::new()],
            };
            match root {
                TravelNode::Object(m) if !m.is_empty() => {
                    for (k, v) in m {
                        packer.place(&mut vec![k.clone()], v)?;
                    }
                }
                TravelNode::Array(a) if !a.is_empty() => {
                    for (i, v) in a.iter().enumerate() {
                        packer.place(&mut vec![i.to_string()], v)?;
                    }
                }
                leaf => {
                    return Err(RagError::OversizedLeaf {
                        path: "/".to_string(),
                        size: leaf.json_len(),
                        max: self.max_chars,
                    });
                }
            }
            packer
                .chunks
                .into_iter()
                .filter(|c| !c.is_empty())
                .map(TravelNode::Object)
                .collect()
        };

        let chunks: Vec<Chunk> = nodes
            .into_iter()
            .enumerate()
            .map(|(ordinal, node)| Chunk {
                ordinal,
                text: node.to_json(),
                node,
            })
            .collect();
        debug!(chunks = chunks.len(), max_chars = self.max_chars, "document split");
        Ok(chunks)
    }
}

type ObjectMap = BTreeMap<String, TravelNode>;

struct Packer {
    max: usize,
    /// Object-rooted chunks; the last one is open.
    chunks: Vec<ObjectMap>,
}

impl Packer {
    fn place(&mut self, path: &mut Vec<String>, value: &TravelNode) -> Result<(), RagError> {
        let current = self.chunks.last().cloned().unwrap_or_default();
        let current_empty = current.is_empty();

        let mut with_value = current;
        insert_at(&mut with_value, path, value.clone());
        if json_len(&with_value) <= self.max {
            match self.chunks.last_mut() {
                Some(last) => *last = with_value,
                None => self.chunks.push(with_value),
            }
            return Ok(());
        }

        let mut alone = ObjectMap::new();
        insert_at(&mut alone, path, value.clone());
        let alone_len = json_len(&alone);
        if !current_empty && alone_len <= self.max {
            self.chunks.push(alone);
            return Ok(());
        }

        match value {
            TravelNode::Object(m) if !m.is_empty() => {
                for (k, v) in m {
                    path.push(k.clone());
                    self.place(path, v)?;
                    path.pop();
                }
                Ok(())
            }
            TravelNode::Array(a) if !a.is_empty() => {
                for (i, v) in a.iter().enumerate() {
                    path.push(i.to_string());
                    self.place(path, v)?;
                    path.pop();
                }
                Ok(())
            }
            _ => Err(RagError::OversizedLeaf {
                path: format!("/{}", path.join("/")),
                size: alone_len,
                max: self.max,
            }),
        }
    }
}

fn json_len(map: &ObjectMap) -> usize {
    TravelNode::Object(map.clone()).json_len()
}

/// Sets `value` at `path`, creating intermediate objects.
fn insert_at(map: &mut ObjectMap, path: &[String], value: TravelNode) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.clone())
                .or_insert_with(TravelNode::empty_object);
            if let TravelNode::Object(inner) = child {
                insert_at(inner, rest, value);
            }
        }
    }
}

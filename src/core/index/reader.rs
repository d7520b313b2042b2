// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::core::util::DocId;

/// A single partition of the index, searched independently.
pub trait LeafReader: Send + Sync {
    /// One greater than the largest document id in this partition.
    fn max_doc(&self) -> DocId;
}

/// The top-level view over all the partitions of an index.
pub trait IndexReader: Send + Sync {
    fn leaves(&self) -> Vec<LeafReaderContext<'_>>;

    fn max_doc(&self) -> DocId {
        self.leaves().iter().map(|l| l.reader.max_doc()).sum()
    }
}

/// Handle to one partition, together with its position in the parent.
#[derive(Clone)]
pub struct LeafReaderContext<'a> {
    /// ord in parent
    pub ord: usize,
    /// doc base in parent
    pub doc_base: DocId,
    pub reader: &'a dyn LeafReader,
    pub parent: &'a dyn IndexReader,
}

impl<'a> LeafReaderContext<'a> {
    pub fn new(
        parent: &'a dyn IndexReader,
        reader: &'a dyn LeafReader,
        ord: usize,
        doc_base: DocId,
    ) -> Self {
        Self {
            parent,
            reader,
            ord,
            doc_base,
        }
    }

    #[inline]
    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }

    #[inline]
    pub fn max_doc(&self) -> DocId {
        self.reader.max_doc()
    }
}

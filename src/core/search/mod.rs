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

pub mod aggregations;

mod script;

pub use self::script::*;

use crate::core::util::DocId;
use crate::error::Result;

use std::sync::{Arc, Mutex};

/// Expert: Common scoring functionality for different types of queries.
///
/// Only the part a values source needs is modelled here: the relevance
/// score of the document the scorer is currently positioned on.
pub trait Scorer: Send {
    fn doc_id(&self) -> DocId;

    /// Returns the score of the current document matching the query.
    fn score(&mut self) -> Result<f32>;
}

/// A scorer shared between the collector driving it and the values that
/// read scores from it.
pub type ScorerRef = Arc<Mutex<Box<dyn Scorer>>>;

/// Implemented by per-document values that may read the current score.
pub trait ScorerAware {
    fn set_scorer(&mut self, scorer: ScorerRef);
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::index::LeafReaderContext;
    use crate::core::util::VariantValue;

    pub struct MockScorer {
        doc: DocId,
        score: f32,
    }

    impl MockScorer {
        pub fn new(doc: DocId, score: f32) -> MockScorer {
            MockScorer { doc, score }
        }

        pub fn shared(doc: DocId, score: f32) -> ScorerRef {
            let scorer: Box<dyn Scorer> = Box::new(MockScorer::new(doc, score));
            Arc::new(Mutex::new(scorer))
        }
    }

    impl Scorer for MockScorer {
        fn doc_id(&self) -> DocId {
            self.doc
        }

        fn score(&mut self) -> Result<f32> {
            Ok(self.score)
        }
    }

    type ScriptFn = dyn Fn(DocId, &VariantValue, f32) -> Result<VariantValue> + Send + Sync;

    /// A script computing its result from the current doc, the `_value`
    /// variable and the score of the bound scorer (0 when unbound).
    pub struct MockSearchScript {
        func: Arc<ScriptFn>,
        needs_scores: bool,
    }

    impl MockSearchScript {
        pub fn new<F>(func: F) -> MockSearchScript
        where
            F: Fn(DocId, &VariantValue, f32) -> Result<VariantValue> + Send + Sync + 'static,
        {
            MockSearchScript {
                func: Arc::new(func),
                needs_scores: true,
            }
        }

        pub fn without_scores(mut self) -> MockSearchScript {
            self.needs_scores = false;
            self
        }
    }

    impl SearchScript for MockSearchScript {
        fn get_leaf_search_script(
            &self,
            _context: &LeafReaderContext<'_>,
        ) -> Result<Box<dyn LeafSearchScript>> {
            Ok(Box::new(MockLeafSearchScript {
                func: Arc::clone(&self.func),
                doc: -1,
                value: VariantValue::Null,
                scorer: None,
            }))
        }

        fn needs_scores(&self) -> bool {
            self.needs_scores
        }
    }

    struct MockLeafSearchScript {
        func: Arc<ScriptFn>,
        doc: DocId,
        value: VariantValue,
        scorer: Option<ScorerRef>,
    }

    impl LeafSearchScript for MockLeafSearchScript {
        fn set_document(&mut self, doc: DocId) {
            self.doc = doc;
            self.value = VariantValue::Null;
        }

        fn set_next_var(&mut self, name: &str, value: VariantValue) {
            if name == VALUE_VAR {
                self.value = value;
            }
        }

        fn set_scorer(&mut self, scorer: ScorerRef) {
            self.scorer = Some(scorer);
        }

        fn run(&mut self) -> Result<VariantValue> {
            let score = match self.scorer {
                Some(ref scorer) => scorer.lock()?.score()?,
                None => 0.0,
            };
            (self.func)(self.doc, &self.value, score)
        }
    }
}

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

use crate::core::index::LeafReaderContext;
use crate::core::search::ScorerRef;
use crate::core::util::{DocId, VariantValue};
use crate::error::Result;

/// Name of the variable a value script reads the current value from.
pub const VALUE_VAR: &str = "_value";

/// A compiled script, bound to a partition through
/// `get_leaf_search_script`.
pub trait SearchScript: Send + Sync {
    fn get_leaf_search_script(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn LeafSearchScript>>;

    /// Whether the script reads the relevance score. Scripts that cannot
    /// tell must keep the default.
    fn needs_scores(&self) -> bool {
        true
    }
}

/// The per-partition, stateful evaluator of a script.
pub trait LeafSearchScript: Send {
    /// positions the script on `doc`
    fn set_document(&mut self, doc: DocId);

    fn set_next_var(&mut self, name: &str, value: VariantValue);

    fn set_scorer(&mut self, scorer: ScorerRef);

    fn run(&mut self) -> Result<VariantValue>;

    fn run_as_long(&mut self) -> Result<i64> {
        self.run()?.to_long()
    }

    fn run_as_double(&mut self) -> Result<f64> {
        self.run()?.to_double()
    }

    fn run_as_string(&mut self) -> Result<String> {
        Ok(self.run()?.to_string())
    }
}

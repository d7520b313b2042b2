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

pub type DocId = i32;

mod variant_value;

pub use self::variant_value::*;

mod long_values;

pub use self::long_values::*;

mod bits;

pub use self::bits::*;

mod compute_time;

pub use self::compute_time::*;

pub mod bit_set;

pub use self::bit_set::FixedBitSet;

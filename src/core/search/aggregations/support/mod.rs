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

//! Value sources: the values of a field, or of a script, for every
//! document of a partition, in whichever representation an aggregation
//! asks for.

mod values_source;

pub use self::values_source::*;

mod bytes;

pub use self::bytes::*;

mod numeric;

pub use self::numeric::*;

mod geo_point;

pub use self::geo_point::*;

mod parent_child;

pub use self::parent_child::*;

mod with_script;

pub use self::with_script::*;

mod script_values;

pub use self::script_values::*;

mod config;

pub use self::config::*;

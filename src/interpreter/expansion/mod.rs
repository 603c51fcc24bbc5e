pub mod analysis;
pub mod arith_text_expansion;
pub mod array_pattern_ops;
pub mod array_prefix_suffix;
pub mod array_slice_transform;
pub mod array_word_expansion;
pub mod brace_range;
pub mod command_substitution;
pub mod glob_escape;
pub mod indirect_expansion;
pub mod parameter_ops;
pub mod pattern;
pub mod pattern_expansion;
pub mod pattern_removal;
pub mod positional_params;
pub mod quoting;
pub mod tilde;
pub mod unquoted_expansion;
pub mod variable;
pub mod variable_attrs;
pub mod word_glob_expansion;
pub mod word_split;

pub use analysis::*;
pub use arith_text_expansion::*;
pub use array_pattern_ops::*;
pub use array_prefix_suffix::*;
pub use array_slice_transform::*;
pub use array_word_expansion::*;
pub use brace_range::*;
pub use command_substitution::*;
pub use glob_escape::*;
pub use indirect_expansion::*;
pub use parameter_ops::*;
pub use pattern::*;
pub use pattern_expansion::*;
pub use pattern_removal::*;
pub use positional_params::*;
pub use quoting::*;
pub use tilde::*;
pub use unquoted_expansion::*;
pub use variable::*;
pub use variable_attrs::*;
pub use word_glob_expansion::*;
pub use word_split::*;

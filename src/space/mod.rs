//! Parameter space expansion
//!
//! Building blocks used by `Experiment::populate`:
//!
//! - `key`: namespaced parameter keys (`ep::function::fw::cpu_cores`)
//! - `expand`: value macros (`{"min": 0, "max": 1, "step": 0.5}`) and lists
//! - `builder`: flattening a definition into a `ConfigurationSpace`
//! - `product`: lazy Cartesian product over the space

pub mod builder;
pub mod expand;
pub mod key;
pub mod product;

pub use builder::{ConfigurationSpace, SpaceBuilder};
pub use expand::{expand, try_expand, Expansion};
pub use key::{KeyKind, ParameterKey};
pub use product::{cartesian_product, combination_count, product_iter, Product};

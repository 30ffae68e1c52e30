#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod model;
pub mod rules;
pub mod three_gen;
pub mod two_gen;
pub mod types;

pub mod change_namespace;
pub mod split_property;
pub mod stats;

pub mod compressed;
pub mod exports;
pub mod flat;
pub mod record;
pub mod tree;

use smartstring::{LazyCompact, SmartString};

pub mod search;
pub mod spans;
pub mod styled;
pub mod transaction;

pub type Tendril = SmartString<LazyCompact>;

pub mod collect;
pub mod commands;
pub mod evaluate;
pub mod finder;
pub mod http;
pub mod model;
pub mod runtime;
pub mod source;
pub mod tags;
pub mod version;

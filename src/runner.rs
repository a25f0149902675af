pub mod call;
pub mod ds;
pub mod engine;
pub mod eval;
pub mod plugin;
pub mod std_lib;

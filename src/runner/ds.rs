pub mod array_object;
pub mod error;
pub mod function_object;
pub mod interop;
pub mod lex_env;
pub mod object;
pub mod object_property;
pub mod operations;
pub mod proxy_object;
pub mod realm;
pub mod shape;
pub mod symbol;
pub mod value;

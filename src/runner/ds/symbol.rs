use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use uuid::Uuid;

/// Symbols compare by identity; the description is only for display.
#[derive(Debug, Clone)]
pub struct SymbolData {
    id: Uuid,
    description: Arc<String>,
}

impl SymbolData {
    pub fn new(description: impl Into<String>) -> Self {
        SymbolData {
            id: Uuid::new_v4(),
            description: Arc::new(description.into()),
        }
    }

    pub fn new_empty() -> Self {
        SymbolData::new(String::new())
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
impl PartialEq for SymbolData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for SymbolData {}
impl Hash for SymbolData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl Display for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/* Well known symbols */
lazy_static! {
    pub static ref SYMBOL_HAS_INSTANCE: SymbolData = SymbolData::new("Symbol.hasInstance");
    pub static ref SYMBOL_ITERATOR: SymbolData = SymbolData::new("Symbol.iterator");
    pub static ref SYMBOL_TO_PRIMITIVE: SymbolData = SymbolData::new("Symbol.toPrimitive");
}

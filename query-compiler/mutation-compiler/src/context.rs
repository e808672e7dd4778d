use crate::{Authorizer, CompilerOptions, ConnectionTranslator, WhereCompiler};
use graph_schema::Schema;

/// Everything a translator call reads but never changes.
#[derive(Clone, Copy)]
pub struct TranslationContext<'a> {
    pub schema: &'a Schema,
    pub options: &'a CompilerOptions,
    pub authorizer: &'a dyn Authorizer,
    pub filters: &'a dyn WhereCompiler,
    pub connections: &'a dyn ConnectionTranslator,
}

impl TranslationContext<'_> {
    /// Whether written nodes get their required-relationship checks appended.
    pub fn validates_relationships(&self) -> bool {
        self.options.validate_relationships
    }
}

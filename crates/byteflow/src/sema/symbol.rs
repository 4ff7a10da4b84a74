use crate::ast::Type;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub cell: usize,
    pub scope_depth: usize,
    pub is_param: bool,
    pub is_array: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type, cell: usize, scope_depth: usize) -> Self {
        Self {
            name: name.into(),
            is_array: matches!(ty, Type::Array(..)),
            ty,
            cell,
            scope_depth,
            is_param: false,
        }
    }
}

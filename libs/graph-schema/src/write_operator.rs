use crate::{ScalarField, TypeIdentifier};
use std::fmt;

/// A mutation operator, spelled as a suffix of the input key (`age_INCREMENT`).
/// Keys without a suffix are legacy `SET` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOperator {
    Set,
    Increment,
    Decrement,
    Add,
    Subtract,
    Multiply,
    Divide,
    Push,
    Pop,
}

impl WriteOperator {
    pub const ALL: [WriteOperator; 9] = [
        Self::Set,
        Self::Increment,
        Self::Decrement,
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Push,
        Self::Pop,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Increment => "INCREMENT",
            Self::Decrement => "DECREMENT",
            Self::Add => "ADD",
            Self::Subtract => "SUBTRACT",
            Self::Multiply => "MULTIPLY",
            Self::Divide => "DIVIDE",
            Self::Push => "PUSH",
            Self::Pop => "POP",
        }
    }

    /// Splits `field_OPERATOR` into the field name and the operator.
    pub fn split_key(key: &str) -> Option<(&str, WriteOperator)> {
        Self::ALL.into_iter().find_map(|op| {
            key.strip_suffix(op.suffix())
                .and_then(|rest| rest.strip_suffix('_'))
                .filter(|field_name| !field_name.is_empty())
                .map(|field_name| (field_name, op))
        })
    }

    /// Whether the operator is defined for the given field.
    pub fn applies_to(self, field: &ScalarField) -> bool {
        let typ = field.type_identifier();

        match self {
            Self::Set => true,
            Self::Increment | Self::Decrement => typ.is_integer() && !field.is_list(),
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                typ == TypeIdentifier::Float && !field.is_list()
            }
            Self::Push | Self::Pop => field.is_list(),
        }
    }

    /// The infix Cypher operator for arithmetic updates.
    pub fn arithmetic_symbol(self) -> Option<&'static str> {
        match self {
            Self::Increment | Self::Add => Some("+"),
            Self::Decrement | Self::Subtract => Some("-"),
            Self::Multiply => Some("*"),
            Self::Divide => Some("/"),
            Self::Set | Self::Push | Self::Pop => None,
        }
    }
}

impl fmt::Display for WriteOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

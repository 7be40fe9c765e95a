//! Error types for rtds-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("circuit has no components")]
    EmptyCircuit,

    #[error("unknown component type for {0}")]
    UnknownComponentType(String),

    #[error("duplicate component: {0}")]
    DuplicateComponent(String),

    #[error(
        "component {component}: symbol {symbol} does not start with '{letter}' (rename it to {letter}{symbol})"
    )]
    SymbolMismatch {
        component: String,
        symbol: String,
        letter: char,
    },

    #[error("component {component}: symbol {symbol} is also a state variable")]
    DuplicateSymbol { component: String, symbol: String },

    #[error("component {component} connects node {node} to itself")]
    SelfLoop { component: String, node: String },

    #[error("circuit has no ground node \"0\"")]
    NoGround,

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("expression is not linear in the unknowns: {0}")]
    NonLinear(String),
}

pub type Result<T> = std::result::Result<T, Error>;

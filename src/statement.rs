//! Turning a line of REPL input into something the table can execute.

use thiserror::Error;

use crate::row::Row;
use crate::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};

// Non-SQL statements like .exit are called “meta-commands”.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Unrecognized,
}

impl MetaCommand {
    pub fn parse(input: &str) -> Option<MetaCommand> {
        match input {
            ".exit" => Some(MetaCommand::Exit),
            _ if input.starts_with('.') => Some(MetaCommand::Unrecognized),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String is too long.")]
    StringTooLong,
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,
    #[error("Unrecognized keyword at start of '{0}'.")]
    Unrecognized(String),
}

impl Statement {
    pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
        match input.split_whitespace().next() {
            Some("insert") => prepare_insert(input),
            Some("select") => Ok(Statement::Select),
            _ => Err(PrepareError::Unrecognized(input.to_string())),
        }
    }
}

fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let mut tokens = input.split_whitespace().skip(1);
    let (Some(id), Some(username), Some(email)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::SyntaxError);
    };

    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| PrepareError::SyntaxError)?;

    if username.len() > COLUMN_USERNAME_SIZE || email.len() > COLUMN_EMAIL_SIZE {
        return Err(PrepareError::StringTooLong);
    }
    Ok(Statement::Insert(Row::new(id, username, email)))
}

pub enum InputType {
    Meta(MetaCommand),
    Statement(Result<Statement, PrepareError>),
}

impl InputType {
    pub fn parse(input: &str) -> InputType {
        if let Some(meta) = MetaCommand::parse(input) {
            InputType::Meta(meta)
        } else {
            InputType::Statement(Statement::prepare(input))
        }
    }
}

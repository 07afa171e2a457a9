use std::env;

use log::debug;

use super::error::BuiltinError;
use crate::shell::parser::Program;

/// Commands run inside the shell process. Matching is on the exact program
/// name, so `cdx` or `exit2` are ordinary executables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Cd,
}

impl Builtin {
    pub fn lookup(program: &Program) -> Option<Self> {
        match program.name() {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            _ => None,
        }
    }
}

/// Resolves the directory `cd` should move to: the first argument with a
/// leading `~` expanded, or `home` when there is none.
pub fn cd_target(arguments: &[String], home: Option<&str>) -> Result<String, BuiltinError> {
    match arguments.first() {
        Some(path) => Ok(shellexpand::tilde_with_context(path, || home).into_owned()),
        None => home.map(str::to_string).ok_or(BuiltinError::HomeNotSet),
    }
}

pub fn builtin_cd(program: &Program) -> Result<(), BuiltinError> {
    let home = env::var("HOME").ok();
    let path = cd_target(program.arguments(), home.as_deref())?;
    debug!("cd {}", path);
    env::set_current_dir(&path).map_err(|source| BuiltinError::ChangeDir { path, source })
}

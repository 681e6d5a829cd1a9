//! Per-verb command handlers.
//!
//! # Responsibility
//! - Validate arguments against the entity registry and the record index.
//! - Apply create/show/destroy/all/count/update and flush on mutation.
//! - Report usage and validation problems as fixed literal lines.
//!
//! # Invariants
//! - Each command holds the store lock for its whole read/mutate/flush
//!   sequence; commands never interleave.
//! - A rejected command changes neither the index nor the backing store.
//! - User-facing problems are output lines, not `Err`; `Err` is reserved for
//!   a broken output sink or a poisoned lock.

use super::help::{help_for, write_help_index};
use super::normalizer::normalize;
use super::payload::parse_payload;
use super::tokenizer::{split_verb, tokenize};
use crate::model::record::{composite_key, Record};
use crate::model::registry::{EntityRegistry, EntitySchema};
use crate::model::value::{py_str_repr, AttrValue};
use crate::storage::{FileStorage, RecordStore};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

pub const MSG_CLASS_NAME_MISSING: &str = "** class name missing **";
pub const MSG_CLASS_MISSING: &str = "** class doesn't exist **";
pub const MSG_ID_MISSING: &str = "** instance id missing **";
pub const MSG_NO_INSTANCE: &str = "** no instance found **";
pub const MSG_ATTRIBUTE_MISSING: &str = "** attribute name missing **";
pub const MSG_VALUE_MISSING: &str = "** value missing **";
pub const MSG_INVALID_PAYLOAD: &str = "** invalid payload **";

/// Store handle shared by every command of a session.
pub type SharedStore<S = FileStorage> = Arc<Mutex<S>>;

pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug)]
pub enum ConsoleError {
    Input(io::Error),
    Output(io::Error),
    LockPoisoned,
}

impl Display for ConsoleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(err) => write!(f, "failed to read console input: {err}"),
            Self::Output(err) => write!(f, "failed to write console output: {err}"),
            Self::LockPoisoned => write!(f, "record store lock is poisoned"),
        }
    }
}

impl Error for ConsoleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(err) | Self::Output(err) => Some(err),
            Self::LockPoisoned => None,
        }
    }
}

impl From<io::Error> for ConsoleError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

/// What the session loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Quit,
}

/// Command interpreter over a shared record store.
pub struct Console<'r, S: RecordStore = FileStorage> {
    registry: &'r EntityRegistry,
    store: SharedStore<S>,
}

impl<'r, S: RecordStore> Console<'r, S> {
    pub fn new(registry: &'r EntityRegistry, store: SharedStore<S>) -> Self {
        Self { registry, store }
    }

    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }

    /// Normalizes and executes one input line.
    pub fn execute_line(&self, line: &str, out: &mut dyn Write) -> ConsoleResult<CommandOutcome> {
        let canonical = normalize(line);
        let (verb, rest) = split_verb(&canonical);
        if verb.is_empty() {
            return Ok(CommandOutcome::Continue);
        }

        let args = tokenize(rest);
        debug!("event=command module=console verb={} args={}", verb, args.len());

        match verb {
            "quit" | "EOF" => return Ok(CommandOutcome::Quit),
            "help" => self.do_help(&args, out)?,
            "create" => self.do_create(&args, out)?,
            "show" => self.do_show(&args, out)?,
            "destroy" => self.do_destroy(&args, out)?,
            "all" => self.do_all(&args, out)?,
            "count" => self.do_count(&args, out)?,
            "update" => self.do_update(&args, out)?,
            _ => writeln!(out, "*** Unknown syntax: {}", line.trim())?,
        }
        Ok(CommandOutcome::Continue)
    }

    fn lock(&self) -> ConsoleResult<MutexGuard<'_, S>> {
        self.store.lock().map_err(|_| ConsoleError::LockPoisoned)
    }

    fn do_help(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        match args.first() {
            None => write_help_index(out)?,
            Some(topic) => match help_for(topic) {
                Some(summary) => writeln!(out, "{summary}")?,
                None => writeln!(out, "*** No help on {topic}")?,
            },
        }
        Ok(())
    }

    fn do_create(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        let Some(schema) = self.require_schema(args, out)? else {
            return Ok(());
        };

        let record = Record::new(schema);
        let id = record.id().to_string();
        let mut store = self.lock()?;
        store.register(record);
        info!("event=record_create module=console kind={}", schema.kind);
        persist(&*store, out)?;
        writeln!(out, "{id}")?;
        Ok(())
    }

    fn do_show(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        let Some((_, key)) = self.require_instance_key(args, out)? else {
            return Ok(());
        };

        let store = self.lock()?;
        match store.get(&key) {
            Some(record) => writeln!(out, "{record}")?,
            None => writeln!(out, "{MSG_NO_INSTANCE}")?,
        }
        Ok(())
    }

    fn do_destroy(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        let Some((_, key)) = self.require_instance_key(args, out)? else {
            return Ok(());
        };

        let mut store = self.lock()?;
        if store.remove(&key).is_none() {
            writeln!(out, "{MSG_NO_INSTANCE}")?;
            return Ok(());
        }
        info!("event=record_destroy module=console");
        persist(&*store, out)?;
        Ok(())
    }

    fn do_all(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        let kind = match args.first() {
            Some(kind) if !self.registry.contains(kind) => {
                writeln!(out, "{MSG_CLASS_MISSING}")?;
                return Ok(());
            }
            Some(kind) => Some(kind.as_str()),
            None => None,
        };

        let store = self.lock()?;
        let rendered = store
            .list(kind)
            .into_iter()
            .map(|record| py_str_repr(&record.to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "[{rendered}]")?;
        Ok(())
    }

    fn do_count(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        let Some(kind) = args.first().filter(|kind| !kind.is_empty()) else {
            writeln!(out, "{MSG_CLASS_NAME_MISSING}")?;
            return Ok(());
        };

        let store = self.lock()?;
        writeln!(out, "{}", store.count(kind))?;
        Ok(())
    }

    fn do_update(&self, args: &[String], out: &mut dyn Write) -> ConsoleResult<()> {
        let Some((schema, key)) = self.require_instance_key(args, out)? else {
            return Ok(());
        };

        let mut store = self.lock()?;
        let Some(record) = store.get_mut(&key) else {
            writeln!(out, "{MSG_NO_INSTANCE}")?;
            return Ok(());
        };

        let Some(attribute) = args.get(2).filter(|name| !name.is_empty()) else {
            writeln!(out, "{MSG_ATTRIBUTE_MISSING}")?;
            return Ok(());
        };

        let changes = if attribute.starts_with('{') {
            match parse_payload(attribute) {
                Ok(entries) => entries
                    .into_iter()
                    .map(|(name, value)| {
                        let value = match schema.attribute(&name) {
                            Some(spec) => AttrValue::coerce(spec.ty, value),
                            None => value,
                        };
                        (name, value)
                    })
                    .collect::<Vec<_>>(),
                Err(err) => {
                    warn!("event=record_update module=console status=rejected error={err}");
                    writeln!(out, "{MSG_INVALID_PAYLOAD}")?;
                    return Ok(());
                }
            }
        } else {
            let Some(text) = args.get(3) else {
                writeln!(out, "{MSG_VALUE_MISSING}")?;
                return Ok(());
            };
            let value = match schema.attribute(attribute) {
                Some(spec) => AttrValue::coerce_text(spec.ty, text),
                None => AttrValue::Str(text.clone()),
            };
            vec![(attribute.clone(), value)]
        };

        let mut applied = 0usize;
        for (name, value) in changes {
            if record.set_attribute(name, value) {
                applied += 1;
            }
        }
        record.touch();
        info!(
            "event=record_update module=console kind={} attributes={}",
            schema.kind, applied
        );
        persist(&*store, out)?;
        Ok(())
    }

    /// Resolves `args[0]` to a schema, printing the usage error otherwise.
    fn require_schema(
        &self,
        args: &[String],
        out: &mut dyn Write,
    ) -> ConsoleResult<Option<&'static EntitySchema>> {
        let Some(kind) = args.first().filter(|kind| !kind.is_empty()) else {
            writeln!(out, "{MSG_CLASS_NAME_MISSING}")?;
            return Ok(None);
        };
        match self.registry.lookup(kind) {
            Some(schema) => Ok(Some(schema)),
            None => {
                writeln!(out, "{MSG_CLASS_MISSING}")?;
                Ok(None)
            }
        }
    }

    /// Resolves `args[0..2]` to a schema and composite key.
    fn require_instance_key(
        &self,
        args: &[String],
        out: &mut dyn Write,
    ) -> ConsoleResult<Option<(&'static EntitySchema, String)>> {
        let Some(schema) = self.require_schema(args, out)? else {
            return Ok(None);
        };
        let Some(id) = args.get(1) else {
            writeln!(out, "{MSG_ID_MISSING}")?;
            return Ok(None);
        };
        Ok(Some((schema, composite_key(schema.kind, id))))
    }
}

/// Flushes the store, reporting a failure as an output line.
fn persist<S: RecordStore + ?Sized>(store: &S, out: &mut dyn Write) -> ConsoleResult<()> {
    if let Err(err) = store.flush() {
        writeln!(out, "** storage error: {err} **")?;
    }
    Ok(())
}

//! One-line help strings for console verbs.

use std::io::{self, Write};

/// Help entry for one verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbHelp {
    pub verb: &'static str,
    pub summary: &'static str,
}

/// Documented verbs, sorted the way the help index lists them.
pub const VERBS: &[VerbHelp] = &[
    VerbHelp {
        verb: "EOF",
        summary: "This command exits the program, same as `quit`",
    },
    VerbHelp {
        verb: "all",
        summary: "Prints all instances, or all instances of a class: all [<class>]",
    },
    VerbHelp {
        verb: "count",
        summary: "Prints the number of instances of a class: count <class>",
    },
    VerbHelp {
        verb: "create",
        summary: "Creates an instance, saves it and prints its id: create <class>",
    },
    VerbHelp {
        verb: "destroy",
        summary: "Deletes an instance by class name and id: destroy <class> <id>",
    },
    VerbHelp {
        verb: "help",
        summary: "Lists available commands, or shows help for one: help [<command>]",
    },
    VerbHelp {
        verb: "quit",
        summary: "This command exits the program, same as `EOF`",
    },
    VerbHelp {
        verb: "show",
        summary: "Prints an instance by class name and id: show <class> <id>",
    },
    VerbHelp {
        verb: "update",
        summary: "Updates an instance attribute: update <class> <id> <attribute> \"<value>\" \
                  or update <class> <id> {<attribute>: <value>, ...}",
    },
];

pub fn help_for(verb: &str) -> Option<&'static str> {
    VERBS
        .iter()
        .find(|entry| entry.verb == verb)
        .map(|entry| entry.summary)
}

/// Writes the verb index shown by a bare `help`.
pub fn write_help_index(out: &mut dyn Write) -> io::Result<()> {
    const HEADER: &str = "Documented commands (type help <topic>):";
    let verbs = VERBS
        .iter()
        .map(|entry| entry.verb)
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out)?;
    writeln!(out, "{HEADER}")?;
    writeln!(out, "{}", "=".repeat(HEADER.len()))?;
    writeln!(out, "{verbs}")?;
    writeln!(out)
}

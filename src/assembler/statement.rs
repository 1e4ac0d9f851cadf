//! [Statement] struct and source line preparation

use super::instructions::{BYTE_OP, INVALID_OP, WORD_OP};

/// An instruction parsed from the source code, with its raw argument
/// expression still unevaluated
#[derive(Debug, Clone)]
pub struct Statement {
    opcode: u8,
    argument: Option<String>,
}

impl Statement {
    /// Create a new statement from parsed data
    pub fn new(opcode: u8, argument: Option<String>) -> Statement {
        Statement { opcode, argument }
    }

    /// Create a statement standing in for an unparsable line
    pub fn invalid() -> Statement {
        Statement {
            opcode: INVALID_OP,
            argument: None,
        }
    }

    /// Get the opcode of the statement
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Get the raw argument expression of the statement
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Number of bytes this statement occupies in the output.
    ///
    /// `db` emits only its operand byte and `dw` only its operand word;
    /// every real opcode emits one opcode byte plus, when an argument is
    /// present, a two-byte big-endian operand. Pass 1 and Pass 2 both
    /// advance the address by exactly this amount.
    pub fn size(&self) -> u16 {
        match self.argument {
            None => 1,
            Some(_) => match self.opcode {
                BYTE_OP => 1,
                WORD_OP => 2,
                _ => 3,
            },
        }
    }
}

/// Collapse every run of adjacent whitespace down to its first character
pub(crate) fn collapse_whitespace(line: &str) -> String {
    let mut collapsed = String::with_capacity(line.len());
    let mut in_blank_run = false;
    for ch in line.chars() {
        if ch.is_whitespace() {
            if !in_blank_run {
                collapsed.push(ch);
            }
            in_blank_run = true;
        } else {
            collapsed.push(ch);
            in_blank_run = false;
        }
    }
    collapsed
}

/// Prepare a raw source line for parsing: collapse whitespace, strip the
/// `;` comment, trim, and lowercase. Mnemonics and symbols are
/// case-insensitive; operators and numbers are unaffected by the
/// lowercasing.
pub fn prepare(line: &str) -> String {
    let collapsed = collapse_whitespace(line);
    let code = collapsed.splitn(2, ';').next().unwrap_or("");
    code.trim().to_ascii_lowercase()
}

/// Split a label off the front of a prepared line.
///
/// If the line contains a `:`, the prefix before it is the label name and
/// the re-trimmed remainder is the statement text.
pub fn split_label(line: &str) -> (Option<&str>, &str) {
    match line.split_once(':') {
        Some((label, rest)) => (Some(label), rest.trim()),
        None => (None, line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_collapses_and_lowercases() {
        assert_eq!(prepare("  CLR\t\t "), "clr");
        assert_eq!(prepare("STA   $100"), "sta $100");
    }

    #[test]
    fn prepare_strips_comments() {
        assert_eq!(prepare("inc ; bump a"), "inc");
        assert_eq!(prepare("; whole line comment"), "");
        assert_eq!(prepare("db 1 ; one ; two"), "db 1");
    }

    #[test]
    fn split_label_extracts_prefix() {
        assert_eq!(split_label("start: clr"), (Some("start"), "clr"));
        assert_eq!(split_label("start:"), (Some("start"), ""));
        assert_eq!(split_label("clr"), (None, "clr"));
    }

    #[test]
    fn statement_sizes() {
        assert_eq!(Statement::new(0x28, None).size(), 1);
        assert_eq!(Statement::new(0x00, Some("target".into())).size(), 3);
        assert_eq!(Statement::new(BYTE_OP, Some("1".into())).size(), 1);
        assert_eq!(Statement::new(WORD_OP, Some("1".into())).size(), 2);
        assert_eq!(Statement::invalid().size(), 1);
    }
}

//! Translates Q1 assembly source into machine code in a two-pass manner
//!
//! The preprocessor first resolves `#include` files and captures
//! `#define`/`#end` macro bodies, emitting the expanded text into an
//! in-memory spill buffer. The first pass walks the buffer to resolve
//! labels into the symbol table; the second pass walks it again and emits
//! encoded output. Forward references within a program are legal.
//!
//! Comments start with a semicolon (`;`) and continue to the end of the
//! line. Mnemonics and symbols are case-insensitive. A label is defined
//! with a colon and names the address of the statement it precedes:
//!
//! ```ignore
//! start:  clr
//!         inc
//!         mab
//!         jz done     ; taken while A is zero
//!         sta $100
//! done:   hlt
//! val:    db 2 + 3 * 4
//! addr:   dw start
//! ```
//!
//! Instruction arguments are arithmetic expressions over `+ - * /` and
//! parentheses, with decimal, `$` hexadecimal and `%` binary literals and
//! label symbols. The `db` and `dw` pseudo-instructions emit the low 8
//! bits of their expression and a big-endian 16-bit word respectively.
//!
//! The preprocessor understands the following directives:
//! - `#include PATH`: inline the named file (at most 8 levels deep)
//! - `#define NAME` ... `#end`: capture the enclosed lines into the macro
//!   table
//!
//! Three output formats are supported: an annotated listing, raw machine
//! code bytes, and hex text with one byte per line.
//!
//! Errors are reported to stderr as they are found and counted, and the
//! pipeline keeps going to surface as many of them as possible; callers
//! must skip the second pass (and output creation) when the first pass
//! finishes with a nonzero error count.

pub mod directives;
pub mod expression;
pub mod instructions;
pub mod output;
pub mod statement;

use std::collections::HashMap;
use std::io::{self, Write};
use std::str::Lines;

use crate::logging;
use instructions::{BYTE_OP, WORD_OP};
use output::{Encoded, Operand};
use statement::Statement;

/// A symbol table is a mapping of labels to their addresses
pub type SymbolTable = HashMap<String, u16>;

/// Macro bodies captured by the preprocessor, keyed by macro name
pub type MacroTable = HashMap<String, String>;

/// Output format selected on the assembler command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw machine code bytes
    Raw,
    /// Two uppercase hex digits per output byte, one byte per line
    Hex,
    /// Annotated listing interleaving addresses, bytes and source text
    Listing,
}

/// State for one assembly: the symbol and macro tables plus the error and
/// byte counters, threaded through every pipeline stage
pub struct Assembler {
    pub(crate) symbols: SymbolTable,
    pub(crate) macros: MacroTable,
    errors: u32,
    bytes: u32,
}

impl Assembler {
    /// Create an assembler with empty tables and zeroed counters
    pub fn new() -> Assembler {
        Assembler {
            symbols: SymbolTable::new(),
            macros: MacroTable::new(),
            errors: 0,
            bytes: 0,
        }
    }

    /// Number of errors reported so far
    pub fn error_count(&self) -> u32 {
        self.errors
    }

    /// Number of output bytes counted by the first pass
    pub fn byte_count(&self) -> u32 {
        self.bytes
    }

    /// Get the symbol table
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Get the macro table populated by the preprocessor
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Preprocess the named file (and everything it includes) into a
    /// spill buffer ready for the two passes
    pub fn preprocess_file(&mut self, path: &str) -> String {
        let mut buffer = String::new();
        directives::preprocess_file(self, path, 0, &mut buffer);
        buffer
    }

    /// Preprocess in-memory source text into a spill buffer
    pub fn preprocess(&mut self, source: &str) -> String {
        let mut buffer = String::new();
        directives::preprocess_source(self, source, 0, &mut buffer);
        buffer
    }

    /// Walk the preprocessed buffer, defining every label in the symbol
    /// table and accumulating the total byte count
    pub fn first_pass(&mut self, source: &str) {
        let mut address: u16 = 0;
        let mut lines = source.lines();
        while let Some(statement) = self.next_statement(&mut lines, address, true, None) {
            address = address.wrapping_add(statement.size());
            self.bytes += statement.size() as u32;
        }
    }

    /// Walk the preprocessed buffer again and emit encoded output.
    ///
    /// Address advancement matches the first pass exactly, so expression
    /// errors here still emit placeholder bytes (value 0) and every later
    /// statement keeps its address.
    pub fn second_pass<W: Write>(
        &mut self,
        source: &str,
        format: OutputFormat,
        out: &mut W,
    ) -> io::Result<()> {
        let mut address: u16 = 0;
        let mut lines = source.lines();
        let mut raw_lines = Vec::new();
        loop {
            raw_lines.clear();
            let Some(statement) = self.next_statement(&mut lines, address, false, Some(&mut raw_lines))
            else {
                return Ok(());
            };
            let encoded = self.encode(&statement);
            output::write_statement(out, format, address, &encoded, &raw_lines)?;
            address = address.wrapping_add(statement.size());
        }
    }

    /// Report an error and keep going
    pub(crate) fn report(&mut self, message: String) {
        logging::error(message);
        self.errors += 1;
    }

    /// Read lines until one holds a statement, preparing each and handling
    /// labels on the way.
    ///
    /// When `raw_lines` is given, every line consumed (the statement's own
    /// line last) is recorded verbatim for the listing output.
    fn next_statement<'s>(
        &mut self,
        lines: &mut Lines<'s>,
        address: u16,
        define_symbols: bool,
        mut raw_lines: Option<&mut Vec<&'s str>>,
    ) -> Option<Statement> {
        for line in lines {
            if let Some(raw_lines) = &mut raw_lines {
                raw_lines.push(line);
            }
            let prepared = statement::prepare(line);
            let (label, rest) = statement::split_label(&prepared);
            if let Some(name) = label {
                if define_symbols {
                    self.define_symbol(name, address);
                }
            }
            if !rest.is_empty() {
                return Some(self.parse_statement(rest));
            }
        }
        None
    }

    /// Bind a label to an address, rejecting redefinitions
    fn define_symbol(&mut self, name: &str, address: u16) {
        if self.symbols.contains_key(name) {
            self.report(format!("duplicate symbol: \"{}\"", name));
        } else {
            self.symbols.insert(name.to_string(), address);
        }
    }

    /// Parse one prepared, label-free, non-empty line into a statement
    fn parse_statement(&mut self, line: &str) -> Statement {
        let Some((instruction, argument)) = instructions::lookup(line) else {
            let name = line.split_whitespace().next().unwrap_or(line);
            self.report(format!("invalid instruction: \"{}\"", name));
            return Statement::invalid();
        };
        if argument.is_some() && !instruction.has_argument {
            self.report(format!("argument given for {}", instruction.mnemonic));
            return Statement::invalid();
        }
        if argument.is_none() && instruction.has_argument {
            self.report(format!("no argument given for {}", instruction.mnemonic));
            return Statement::invalid();
        }
        Statement::new(instruction.opcode, argument.map(str::to_owned))
    }

    /// Evaluate a statement's argument and lay out its output bytes
    fn encode(&mut self, statement: &Statement) -> Encoded {
        let opcode = match statement.opcode() {
            BYTE_OP | WORD_OP => None,
            opcode => Some(opcode),
        };
        let operand = match statement.argument() {
            None => Operand::None,
            Some(expr) => {
                let value = expression::evaluate(self, expr);
                if statement.opcode() == BYTE_OP {
                    Operand::Byte(value as u8)
                } else {
                    Operand::Word(value as u16)
                }
            }
        };
        Encoded { opcode, operand }
    }
}

impl Default for Assembler {
    fn default() -> Assembler {
        Assembler::new()
    }
}

/// Assemble in-memory source into raw machine code bytes.
///
/// Returns `Err` with the error count when the source does not assemble
/// cleanly; no bytes are produced in that case.
pub fn assemble(source: &str) -> Result<Vec<u8>, u32> {
    let mut asm = Assembler::new();
    let buffer = asm.preprocess(source);
    asm.first_pass(&buffer);
    if asm.error_count() > 0 {
        return Err(asm.error_count());
    }
    let mut raw = Vec::new();
    if asm.second_pass(&buffer, OutputFormat::Raw, &mut raw).is_err() || asm.error_count() > 0 {
        return Err(asm.error_count().max(1));
    }
    Ok(raw)
}

/// Assemble a file (resolving its includes) into raw machine code bytes
pub fn assemble_from_file(path: &str) -> Result<Vec<u8>, u32> {
    let mut asm = Assembler::new();
    let buffer = asm.preprocess_file(path);
    asm.first_pass(&buffer);
    if asm.error_count() > 0 {
        return Err(asm.error_count());
    }
    let mut raw = Vec::new();
    if asm.second_pass(&buffer, OutputFormat::Raw, &mut raw).is_err() || asm.error_count() > 0 {
        return Err(asm.error_count().max(1));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_pass(source: &str) -> Assembler {
        let mut asm = Assembler::new();
        let buffer = asm.preprocess(source);
        asm.first_pass(&buffer);
        asm
    }

    #[test]
    fn first_pass_counts_bytes_and_addresses() {
        let asm = first_pass("start: clr\n inc\n sta $100\nend: hlt\n");
        assert_eq!(asm.error_count(), 0);
        // clr(1) + inc(1) + sta(3) + hlt(1)
        assert_eq!(asm.byte_count(), 6);
        assert_eq!(asm.symbols().get("start"), Some(&0));
        assert_eq!(asm.symbols().get("end"), Some(&5));
    }

    #[test]
    fn labels_bind_before_the_statement_advances() {
        let asm = first_pass("j next\nnext: hlt\n");
        assert_eq!(asm.symbols().get("next"), Some(&3));
    }

    #[test]
    fn label_only_lines_bind_to_the_next_statement() {
        let asm = first_pass("clr\nloop:\n hlt\n");
        assert_eq!(asm.symbols().get("loop"), Some(&1));
    }

    #[test]
    fn duplicate_symbol_is_reported_once() {
        let asm = first_pass("foo: hlt\nfoo: hlt\n");
        assert_eq!(asm.error_count(), 1);
        assert_eq!(asm.symbols().get("foo"), Some(&0));
    }

    #[test]
    fn invalid_instruction_is_reported() {
        let asm = first_pass("frobnicate 12\n");
        assert_eq!(asm.error_count(), 1);
        // the bad statement still occupies one byte
        assert_eq!(asm.byte_count(), 1);
    }

    #[test]
    fn argument_arity_is_checked() {
        let asm = first_pass("hlt 5\n");
        assert_eq!(asm.error_count(), 1);
        let asm = first_pass("ldb\n");
        assert_eq!(asm.error_count(), 1);
    }

    #[test]
    fn assemble_is_case_insensitive() {
        let source = "start: clr\n inc\n J Start\n";
        let upper = source.to_uppercase();
        assert_eq!(assemble(source), assemble(&upper));
    }

    #[test]
    fn assemble_rejects_errors_before_output() {
        assert!(assemble("foo: hlt\nfoo: hlt\n").is_err());
        assert!(assemble("bogus\n").is_err());
    }

    #[test]
    fn pass_two_emits_placeholder_for_bad_expression() {
        let mut asm = Assembler::new();
        let buffer = asm.preprocess(" j missing\n hlt\n");
        asm.first_pass(&buffer);
        assert_eq!(asm.error_count(), 0);
        let mut raw = Vec::new();
        asm.second_pass(&buffer, OutputFormat::Raw, &mut raw).unwrap();
        // the unknown symbol reads as 0 so later bytes keep their offsets
        assert_eq!(raw, vec![0x00, 0x00, 0x00, 0x38]);
        assert_eq!(asm.error_count(), 1);
    }
}

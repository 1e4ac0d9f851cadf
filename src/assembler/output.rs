//! Encoders for the three assembler output formats

use std::io::{self, Write};

use super::OutputFormat;

/// Byte layout of one encoded statement
#[derive(Debug)]
pub(crate) struct Encoded {
    /// Opcode byte; `None` for the `db`/`dw` pseudo-instructions, which
    /// emit only their operand
    pub opcode: Option<u8>,
    pub operand: Operand,
}

/// The operand bytes following an opcode, if any
#[derive(Debug)]
pub(crate) enum Operand {
    None,
    Byte(u8),
    Word(u16),
}

impl Encoded {
    /// Flatten to raw output bytes, operand high byte first
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(3);
        if let Some(opcode) = self.opcode {
            bytes.push(opcode);
        }
        match self.operand {
            Operand::None => {}
            Operand::Byte(value) => bytes.push(value),
            Operand::Word(value) => bytes.extend(split_u16(value)),
        }
        bytes
    }
}

/// Split a word into big-endian bytes
pub(crate) fn split_u16(value: u16) -> [u8; 2] {
    [(value >> 8) as u8, value as u8]
}

/// Write one statement in the selected output format.
///
/// The listing re-prints every raw line that fed the statement: the lines
/// before the statement's own get a 20-space margin, then the statement's
/// line shows its address, a 16-column byte field, and the source text as
/// read from the preprocessed stream.
pub(crate) fn write_statement<W: Write>(
    out: &mut W,
    format: OutputFormat,
    address: u16,
    encoded: &Encoded,
    raw_lines: &[&str],
) -> io::Result<()> {
    match format {
        OutputFormat::Raw => out.write_all(&encoded.bytes()),
        OutputFormat::Hex => {
            for byte in encoded.bytes() {
                writeln!(out, "{:02X}", byte)?;
            }
            Ok(())
        }
        OutputFormat::Listing => {
            let (statement_line, leading) = raw_lines.split_last().unwrap_or((&"", &[]));
            for line in leading {
                writeln!(out, "{:20}{}", "", line)?;
            }
            let mut field = String::new();
            if let Some(opcode) = encoded.opcode {
                field.push_str(&format!("{:02X}", opcode));
            }
            match encoded.operand {
                Operand::None => {}
                Operand::Byte(value) => field.push_str(&format!("{:02X}", value)),
                Operand::Word(value) => {
                    let [high, low] = split_u16(value);
                    field.push_str(&format!(" {:02X} {:02X}", high, low));
                }
            }
            writeln!(out, "{:04X} {:<16}{}", address, field, statement_line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: OutputFormat, address: u16, encoded: &Encoded, raw: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        write_statement(&mut out, format, address, encoded, raw).unwrap();
        out
    }

    #[test]
    fn raw_emits_big_endian_operand() {
        let encoded = Encoded {
            opcode: Some(0x18),
            operand: Operand::Word(0x0100),
        };
        assert_eq!(render(OutputFormat::Raw, 0, &encoded, &[]), vec![0x18, 0x01, 0x00]);
    }

    #[test]
    fn raw_pseudo_byte_has_no_opcode() {
        let encoded = Encoded {
            opcode: None,
            operand: Operand::Byte(0xAA),
        };
        assert_eq!(render(OutputFormat::Raw, 0, &encoded, &[]), vec![0xAA]);
    }

    #[test]
    fn hex_prints_one_byte_per_line() {
        let encoded = Encoded {
            opcode: Some(0x00),
            operand: Operand::Word(0x0004),
        };
        let out = render(OutputFormat::Hex, 0, &encoded, &[]);
        assert_eq!(String::from_utf8(out).unwrap(), "00\n00\n04\n");
    }

    #[test]
    fn listing_pads_the_byte_field_to_sixteen_columns() {
        let encoded = Encoded {
            opcode: Some(0x38),
            operand: Operand::None,
        };
        let out = render(OutputFormat::Listing, 0x0009, &encoded, &["        hlt"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0009 38                      hlt\n"
        );
    }

    #[test]
    fn listing_prefixes_leading_lines_with_margin() {
        let encoded = Encoded {
            opcode: Some(0x28),
            operand: Operand::None,
        };
        let out = render(
            OutputFormat::Listing,
            0,
            &encoded,
            &["; banner", "start:", "        clr"],
        );
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("                    ; banner"));
        assert_eq!(lines.next(), Some("                    start:"));
        assert_eq!(lines.next(), Some("0000 28                      clr"));
    }

    #[test]
    fn listing_word_operand_layout() {
        let encoded = Encoded {
            opcode: Some(0x00),
            operand: Operand::Word(0x1234),
        };
        let out = render(OutputFormat::Listing, 0x0010, &encoded, &["j far"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0010 00 12 34        j far\n"
        );
    }
}

//! Simple assembler for ROM images.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LOOP:           ; Define a label
//!     LCX 0x23    ; X := 0x23
//!     STX $40     ; ROM[0x40] := X
//!     LDX VAR     ; X := ROM[VAR]
//!     JMP LOOP    ; Jump to label
//!     NOP
//!
//!     ORG 0x40    ; Set origin address
//! VAR: DAT 42     ; Define data byte
//! ```
//!
//! Numbers are decimal, `0x` hex or `$` hex. Labels are case-insensitive.

use crate::clocked::MEMORY_SIZE;
use crate::cpu::microcode::Opcode;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a ROM image.
///
/// The image runs up to the highest address written; unwritten gaps are zero.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// An operand that is either known now or resolved in pass 2.
enum Operand {
    Value(u8),
    Label(String),
}

/// The assembler state.
struct Assembler {
    /// Current address (origin).
    current_addr: usize,
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Pending references: (image index, label, source line).
    pending: Vec<(usize, String, usize)>,
    /// Output image.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        }
        .trim();

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some((label, rest)) = line.split_once(':') {
            let label = label.trim().to_uppercase();
            if !label.is_empty() {
                if self.symbols.contains_key(&label) {
                    return Err(AssemblerError::DuplicateLabel { line: line_num, label });
                }
                let addr = self.address(line_num)?;
                self.symbols.insert(label, addr);
            }

            let rest = rest.trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() > 2 {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected '{}'", parts[2..].join(" ")),
            });
        }

        let mnemonic = parts[0].to_uppercase();
        let operand = parts.get(1).copied();

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let text = Self::require(operand, &mnemonic, line_num)?;
                self.current_addr = Self::parse_number(text, line_num)? as usize;
            }

            "DAT" | "DB" => {
                let text = Self::require(operand, &mnemonic, line_num)?;
                let value = self.parse_operand(text, line_num)?;
                self.emit_operand(value, line_num)?;
            }

            // Instructions
            _ => {
                let op = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.clone() }
                })?;

                if op.size() == 1 {
                    if let Some(extra) = operand {
                        return Err(AssemblerError::SyntaxError {
                            line: line_num,
                            message: format!("{} takes no operand, found '{}'", op, extra),
                        });
                    }
                    self.emit(op as u8, line_num)?;
                } else {
                    let text = Self::require(operand, &mnemonic, line_num)?;
                    let value = self.parse_operand(text, line_num)?;
                    self.emit(op as u8, line_num)?;
                    self.emit_operand(value, line_num)?;
                }
            }
        }

        Ok(())
    }

    fn require<'a>(operand: Option<&'a str>, mnemonic: &str, line_num: usize) -> Result<&'a str, AssemblerError> {
        operand.ok_or_else(|| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} requires an operand", mnemonic),
        })
    }

    fn parse_operand(&self, text: &str, line_num: usize) -> Result<Operand, AssemblerError> {
        let starts_numeric = text.starts_with('$') || text.starts_with(|c: char| c.is_ascii_digit());
        if starts_numeric {
            return Self::parse_number(text, line_num).map(Operand::Value);
        }

        if text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Ok(Operand::Label(text.to_uppercase()));
        }

        Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid operand '{}'", text),
        })
    }

    fn parse_number(text: &str, line_num: usize) -> Result<u8, AssemblerError> {
        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            u32::from_str_radix(hex, 16)
        } else if let Some(hex) = text.strip_prefix('$') {
            u32::from_str_radix(hex, 16)
        } else {
            text.parse::<u32>()
        };

        let value = parsed.map_err(|_| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid number '{}'", text),
        })?;

        u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })
    }

    fn address(&self, line_num: usize) -> Result<u8, AssemblerError> {
        u8::try_from(self.current_addr).map_err(|_| AssemblerError::AddressOverflow { line: line_num })
    }

    fn emit(&mut self, byte: u8, line_num: usize) -> Result<(), AssemblerError> {
        let addr = self.address(line_num)? as usize;
        if self.output.len() <= addr {
            self.output.resize(addr + 1, 0);
        }
        self.output[addr] = byte;
        self.current_addr += 1;
        Ok(())
    }

    fn emit_operand(&mut self, operand: Operand, line_num: usize) -> Result<(), AssemblerError> {
        match operand {
            Operand::Value(value) => self.emit(value, line_num),
            Operand::Label(label) => {
                self.pending.push((self.current_addr, label, line_num));
                // Placeholder, will be resolved in pass 2
                self.emit(0, line_num)
            }
        }
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (index, label, line_num) in &self.pending {
            let addr = self.symbols.get(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;
            self.output[*index] = *addr;
        }
        debug_assert!(self.output.len() <= MEMORY_SIZE);
        Ok(())
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("label defined twice on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program runs past address 0xFF on line {line}")]
    AddressOverflow { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_store_load_program() {
        let source = r#"
            ; Store two constants, then read them back
                    LCX 0x23
                    STX $40
                    LCX 0x56
                    STX $41
                    JMP load
                    NOP
                    NOP
            load:   LDX 0x40
                    LDX 0x41
            done:   NOP
                    JMP done
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(
            result,
            vec![
                0x01, 0x23, 0x03, 0x40, 0x01, 0x56, 0x03, 0x41, 0x04, 0x0C, 0x00, 0x00, 0x02,
                0x40, 0x02, 0x41, 0x00, 0x04, 0x10
            ]
        );
    }

    #[test]
    fn test_assemble_org_and_data() {
        let source = r#"
                LDX value
                JMP 0
            ORG 0x10
            value: DAT 42
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 0x11);
        assert_eq!(&result[..4], &[0x02, 0x10, 0x04, 0x00]);
        assert_eq!(result[0x10], 42);
    }

    #[test]
    fn test_assemble_errors() {
        assert!(matches!(
            assemble("ADD 1"),
            Err(AssemblerError::UnknownMnemonic { line: 1, .. })
        ));
        assert!(matches!(
            assemble("NOP\nJMP nowhere"),
            Err(AssemblerError::UndefinedLabel { line: 2, .. })
        ));
        assert!(matches!(
            assemble("a: NOP\nA: NOP"),
            Err(AssemblerError::DuplicateLabel { line: 2, .. })
        ));
        assert!(matches!(
            assemble("LCX 300"),
            Err(AssemblerError::ValueOutOfRange { line: 1, value: 300 })
        ));
        assert!(matches!(assemble("LCX"), Err(AssemblerError::SyntaxError { line: 1, .. })));
        assert!(matches!(assemble("NOP 1"), Err(AssemblerError::SyntaxError { line: 1, .. })));
        assert!(matches!(
            assemble("ORG 0xFF\nLCX 1"),
            Err(AssemblerError::AddressOverflow { line: 2 })
        ));
    }
}

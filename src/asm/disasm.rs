//! Disassembler for ROM images.
//!
//! Converts bytes back to assembler source. The output assembles back to
//! the same image.

use crate::cpu::microcode::Opcode;

/// Disassemble the instruction at `addr`.
///
/// Returns the text and the number of bytes it occupies. Reserved opcodes
/// come out as `DAT`. An operand past the end of `image` reads as zero.
pub fn disassemble_at(image: &[u8], addr: usize) -> (String, usize) {
    let byte = image.get(addr).copied().unwrap_or(0);
    match Opcode::from_byte(byte) {
        Some(op) if byte <= 0x0F => {
            if op.size() == 1 {
                (op.mnemonic().to_string(), 1)
            } else {
                let operand = image.get(addr + 1).copied().unwrap_or(0);
                (format!("{} 0x{:02X}", op, operand), 2)
            }
        }
        _ => (format!("DAT 0x{:02X}", byte), 1),
    }
}

/// Disassemble an image from address 0 up to its last non-zero byte.
pub fn disassemble(image: &[u8]) -> String {
    let end = image.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);

    let mut output = String::new();
    output.push_str("; Disassembly\n");
    output.push_str("; -----------\n\n");

    let mut addr = 0;
    while addr < end {
        let (text, size) = disassemble_at(image, addr);
        let bytes: Vec<String> = (addr..addr + size)
            .map(|a| format!("{:02X}", image.get(a).copied().unwrap_or(0)))
            .collect();
        output.push_str(&format!("    {:<12}; {:02X}: {}\n", text, addr, bytes.join(" ")));
        addr += size;
    }

    output
}

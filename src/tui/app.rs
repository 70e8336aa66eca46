//! Debugger application state and logic.

use crate::asm::disasm::disassemble_at;
use crate::{Cpu, Cycle};
use std::collections::{HashSet, VecDeque};

/// Number of past cycles kept for the trace panel.
const HISTORY_LEN: usize = 64;

/// Cycles executed per UI tick while running.
const CYCLES_PER_TICK: usize = 4;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Copy of the CPU at load time, for reset.
    initial: Cpu,
    /// Most recent cycles, newest last.
    pub history: VecDeque<Cycle>,
    /// Breakpoints (by PC, checked at instruction boundaries).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl DebuggerApp {
    /// Create a new debugger around a freshly built CPU.
    pub fn new(cpu: Cpu) -> Self {
        Self {
            initial: cpu.clone(),
            cpu,
            history: VecDeque::with_capacity(HISTORY_LEN),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step a cycle, 'i' for an instruction, 'q' to quit.".into(),
        }
    }

    fn record(&mut self, cycle: Cycle) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(cycle);
    }

    /// Step one clock cycle.
    pub fn step_cycle(&mut self) {
        let cycle = self.cpu.step();
        self.status = format!("Cycle {}: {}", cycle.number, cycle.control);
        self.record(cycle);
    }

    /// Step to the end of the instruction in flight.
    pub fn step_instruction(&mut self) {
        let pc = self.cpu.pc();
        for _ in 0..crate::cpu::execute::INSTRUCTION_CYCLE_LIMIT {
            self.step_cycle();
            if self.cpu.useq() == 0 {
                self.status = format!("Instruction from PC={:02X} done, PC={:02X}", pc, self.cpu.pc());
                return;
            }
        }
        self.status = format!("IR={:02X} never reset uSeq (reserved opcode?)", self.cpu.ir());
    }

    /// Run until paused or a breakpoint is reached.
    pub fn run(&mut self) {
        // Leave the current breakpoint before checking for the next one
        self.step_cycle();
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        for _ in 0..CYCLES_PER_TICK {
            let pc = self.cpu.pc();
            if self.cpu.useq() == 0 && self.breakpoints.contains(&pc) {
                self.running = false;
                self.status = format!("Breakpoint at PC={:02X}", pc);
                return;
            }
            self.step_cycle();
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:02X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:02X}", pc);
        }
    }

    /// Reset CPU to the state it was loaded in.
    pub fn reset(&mut self) {
        self.cpu = self.initial.clone();
        self.history.clear();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Linear disassembly starting a little before the current PC.
    ///
    /// Instructions are variable length, so the listing is only exact from
    /// the window start onward.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let pc = self.cpu.pc() as usize;
        let mut addr = pc.saturating_sub(lines / 2);
        let mut out = Vec::with_capacity(lines);

        while out.len() < lines && addr < self.cpu.rom().len() {
            let (text, size) = disassemble_at(self.cpu.rom(), addr);
            out.push((addr as u8, text, addr == pc));
            addr += size;
        }
        out
    }
}

/// Run the debugger on a CPU.
pub fn run_debugger(cpu: Cpu) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(cpu);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step_cycle();
                        }
                        KeyCode::Char('i') => {
                            app.running = false;
                            app.step_instruction();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> DebuggerApp {
        let mut rom = vec![0x01, 0x23, 0x03, 0x40, 0x04, 0x00];
        rom.resize(crate::MEMORY_SIZE, 0);
        DebuggerApp::new(Cpu::with_microcode(&rom).unwrap())
    }

    #[test]
    fn test_step_and_reset() {
        let mut app = app();
        app.step_instruction();
        assert_eq!(app.cpu.x(), 0x23);
        assert_eq!(app.history.len(), 4);

        app.reset();
        assert_eq!(app.cpu.cycles(), 0);
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app();
        app.cpu.run_instruction().unwrap();
        app.breakpoints.insert(0x04);

        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.cpu.pc(), 0x04);
        assert_eq!(app.cpu.useq(), 0);
        assert_eq!(app.cpu.rom_cell(0x40), 0x23);
    }

    #[test]
    fn test_disassembly_marks_pc() {
        let app = app();
        let listing = app.get_disassembly(3);
        assert_eq!(listing[0], (0x00, "LCX 0x23".to_string(), true));
        assert_eq!(listing[1].1, "STX 0x40");
    }
}

//! UI rendering for the debugger.

use super::app::DebuggerApp;
use crate::ControlLines;
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(frame.area());

    // Left side: code, registers, trace and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_trace(frame, left_chunks[2], app);
    draw_status(frame, left_chunks[3], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(18), Constraint::Min(4)])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{} {}{:02X}: {}", bp, prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;
    let opcode = cpu.opcode().map_or("???", |op| op.mnemonic());

    let content = vec![
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:02X}", cpu.pc()), Style::default().fg(Color::Yellow)),
            Span::raw("   IR: "),
            Span::styled(format!("{:02X} ({})", cpu.ir(), opcode), Style::default().fg(Color::White)),
            Span::raw("   uSeq: "),
            Span::styled(format!("{}", cpu.useq()), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("AR: "),
            Span::styled(format!("{:02X}", cpu.ar()), Style::default().fg(Color::Magenta)),
            Span::raw("   X:  "),
            Span::styled(format!("{:02X}", cpu.x()), Style::default().fg(Color::White)),
        ]),
        control_line(cpu.control()),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", cpu.cycles()), Style::default().fg(Color::Cyan)),
            Span::raw("   "),
            if app.running {
                Span::styled("RUNNING", Style::default().fg(Color::Green))
            } else {
                Span::styled("STOPPED", Style::default().fg(Color::Red))
            },
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(paragraph, area);
}

/// One span per control line, lit when asserted.
fn control_line(control: ControlLines) -> Line<'static> {
    let mut spans = vec![Span::raw("Next: ")];
    for (line, name) in ControlLines::NAMES {
        let style = if control.contains(line) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{} ", name), style));
    }
    Line::from(spans)
}

fn draw_trace(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let skip = app.history.len().saturating_sub(visible);

    let items: Vec<ListItem> = app
        .history
        .iter()
        .skip(skip)
        .map(|cycle| {
            let style = if cycle.rom_write {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            ListItem::new(cycle.to_string()).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().title(" Trace ").borders(Borders::ALL));

    frame.render_widget(list, area);
}

/// 16×16 ROM grid with the PC and AR cells highlighted.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rom = app.cpu.rom();
    let pc = app.cpu.pc() as usize;
    let ar = app.cpu.ar() as usize;

    let lines: Vec<Line> = rom
        .chunks(16)
        .enumerate()
        .map(|(row, cells)| {
            let mut spans = vec![Span::styled(
                format!("{:02X}: ", row * 16),
                Style::default().fg(Color::DarkGray),
            )];
            for (col, value) in cells.iter().enumerate() {
                let addr = row * 16 + col;
                let style = if addr == pc {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if addr == ar {
                    Style::default().fg(Color::Magenta)
                } else if *value != 0 {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("{:02X} ", value), style));
            }
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" ROM ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );

    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(" Status ").borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Cycle  i: Instruction  r: Run  p: Pause"),
        Line::from("b: Breakpoint  x: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().title(" Help ").borders(Borders::ALL));

    frame.render_widget(help, area);
}

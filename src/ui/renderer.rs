/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws. The arena is
/// a fixed-size grid anchored at the top-left; rows and columns beyond
/// the terminal edge are simply clipped.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Cell as GridCell;
use crate::domain::entity::{EnemyKind, PowerUpKind};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the SAME explicit RGB for `Clear(ClearType::All)` and every
    /// cell's background keeps the inter-row gap pixels on VTE terminals
    /// the same color as the cells, so no horizontal line artifacts.
    const BASE_BG: Color = Color::Rgb { r: 12, g: 14, b: 24 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position will be diff'd on the next frame.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        // Color::Reset would fall back to the terminal default and break
        // the uniform background, so normalize it away here.
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies one column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each game cell maps to 2 terminal columns, so the arena renders
/// roughly square on common fonts.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const GRID_ROW: usize = 2;

// Palette
const CLAIMED_FG: Color = Color::Rgb { r: 90, g: 170, b: 255 };
const CLAIMED_BG: Color = Color::Rgb { r: 25, g: 55, b: 110 };
const TRAIL_FG: Color = Color::Rgb { r: 255, g: 215, b: 80 };
const TRAIL_BG: Color = Color::Rgb { r: 80, g: 60, b: 10 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const ACCENT: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const DANGER: Color = Color::Rgb { r: 255, g: 60, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        // Phase change → full clear for a clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::LevelIntro => self.compose_level_intro(world),
            Phase::Playing => self.compose_game(world),
            Phase::Victory => {
                self.compose_game(world);
                self.compose_victory_overlay(world);
            }
            Phase::GameOver => self.compose_game_over(world),
        }

        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at frame start. Not ResetColor: that would
        // fall back to the terminal's native default, which may differ
        // from BASE_BG and cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;

                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_grid(w, w.rules.grid_height);
        self.compose_entities(w);
        self.compose_message(w);
        self.compose_help(w);
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let buf_w = self.front.width;
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }

        let pct = w.owned_fraction() * 100.0;
        let target = w.rules.win_fraction * 100.0;
        let hud = format!(
            " Sector {:<2} Score:{:<7} ♥×{} {:>5.1}%/{:.0}% ⏱{:>4.0}",
            w.level + 1,
            w.score,
            w.lives,
            pct,
            target,
            w.time_left.max(0.0),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // Status effects tucked onto the right edge of the HUD
        let mut status = String::new();
        if w.player.cutting {
            status.push_str(" CUT ");
        }
        if w.frozen() {
            status.push_str(&format!(" ❄{:.0} ", w.frozen_until - w.sim_time));
        }
        if w.invincible() {
            status.push_str(&format!(" ☆{:.0} ", w.invincible_until - w.sim_time));
        }
        if !status.is_empty() {
            let x = buf_w.saturating_sub(status.len());
            let fg = if w.player.cutting { GOLD } else { ACCENT };
            self.front.put_str(x, HUD_ROW, &status, fg, HUD_BG);
        }
    }

    /// Draw the bottom `rows_visible` rows of the grid (used in full by
    /// the game view, partially during the intro reveal).
    fn compose_grid(&mut self, w: &WorldState, rows_visible: usize) {
        let gw = w.rules.grid_width;
        let gh = w.rules.grid_height;

        for gy in 0..gh {
            let row = GRID_ROW + gy;
            if row >= self.front.height {
                break;
            }
            let from_bottom = gh - 1 - gy;
            if from_bottom >= rows_visible {
                continue;
            }
            for gx in 0..gw {
                let col = gx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                let (c0, c1, fg, bg) = match w.grid.cell(gx as i32, gy as i32) {
                    Ok(GridCell::Claimed) => ('▓', '▓', CLAIMED_FG, CLAIMED_BG),
                    Ok(GridCell::Trail) => ('░', '░', TRAIL_FG, TRAIL_BG),
                    _ => (' ', ' ', Color::White, Cell::BASE_BG),
                };
                self.front.set(col, row, Cell::new(c0, fg, bg));
                self.front.set(col + 1, row, Cell::new(c1, fg, bg));
            }
        }
    }

    fn compose_entities(&mut self, w: &WorldState) {
        for p in &w.powerups {
            let (ch, fg) = match p.kind {
                PowerUpKind::Freeze => ('❄', Color::Rgb { r: 120, g: 220, b: 255 }),
                PowerUpKind::Invincible => ('☆', GOLD),
                PowerUpKind::ExtraLife => ('♥', Color::Rgb { r: 255, g: 120, b: 160 }),
                PowerUpKind::TimeBonus => ('⏱', ACCENT),
            };
            self.put_at_cell(p.x, p.y, ch, fg);
        }

        for e in &w.enemies {
            let (ex, ey) = e.cell();
            match e.kind {
                EnemyKind::Minion => self.put_at_cell(ex, ey, '●', DANGER),
                EnemyKind::Boss => self.put_at_cell(ex, ey, '◉', Color::Rgb { r: 255, g: 120, b: 40 }),
            }
        }

        let (px, py) = w.player.cell();
        let fg = if w.invincible() {
            // Flicker while the shield is up
            if (w.anim_tick / 3) % 2 == 0 { GOLD } else { Color::White }
        } else if w.player.cutting {
            GOLD
        } else {
            ACCENT
        };
        self.put_at_cell(px, py, '◈', fg);
    }

    /// Draw a single glyph in the left column of a game cell, keeping
    /// whatever background the grid pass already put there.
    fn put_at_cell(&mut self, gx: i32, gy: i32, ch: char, fg: Color) {
        if gx < 0 || gy < 0 {
            return;
        }
        let col = gx as usize * CELL_W;
        let row = GRID_ROW + gy as usize;
        if col + 1 >= self.front.width || row >= self.front.height {
            return;
        }
        let bg = self.front.get(col, row).bg;
        self.front.set(col, row, Cell::new(ch, fg, bg));
        self.front.set(col + 1, row, Cell::new(' ', fg, bg));
    }

    fn compose_message(&mut self, w: &WorldState) {
        let msg_row = GRID_ROW + w.rules.grid_height + 1;
        if msg_row >= self.front.height || w.message.is_empty() {
            return;
        }
        let buf_w = self.front.width;
        let msg = format!(" ◈ {} ", w.message);
        for x in 0..buf_w {
            self.front.set(x, msg_row, Cell::new(' ', Color::Black, GOLD));
        }
        self.front.put_str(0, msg_row, &msg, Color::Black, GOLD);
    }

    fn compose_help(&mut self, w: &WorldState) {
        let help_row = GRID_ROW + w.rules.grid_height + 2;
        if help_row < self.front.height {
            let help = " Arrows/WASD:Move  Space/X:Cut  F1:Pause  R:Restart  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    // ── Static screens ──

    /// Level intro: progressive reveal of the arena from the bottom up,
    /// with the sector name centered while the reveal runs.
    fn compose_level_intro(&mut self, w: &WorldState) {
        self.compose_hud(w);

        let gh = w.rules.grid_height;
        let intro_name_ticks: u32 = 8;
        let reveal_rows_per_tick: u32 = 2;
        let rows_visible = if w.anim_tick <= intro_name_ticks {
            0
        } else {
            ((w.anim_tick - intro_name_ticks) * reveal_rows_per_tick).min(gh as u32) as usize
        };

        self.compose_grid(w, rows_visible);
        if rows_visible >= gh {
            self.compose_entities(w);
        }

        if rows_visible < gh {
            let name = format!(" ◈ SECTOR {} ◈ ", w.level + 1);
            let cols = w.rules.grid_width * CELL_W;
            let name_row = GRID_ROW + gh / 2 - 1;
            let cx = cols.saturating_sub(name.len()) / 2;
            self.front.put_str(cx, name_row, &name, GOLD, Color::Reset);

            let ready = "▸▸▸ GET READY ◂◂◂";
            let rx = cols.saturating_sub(ready.len()) / 2;
            self.front.put_str(rx, name_row + 2, ready, ACCENT, Color::Reset);
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r" __   __     _      _  ___        _   ",
            r" \ \ / /___ (_) ___| |/ __| _  _ | |_ ",
            r"  \ V // _ \| |/ _` | | (__ | || ||  _|",
            r"   \_/ \___/|_|\__,_|  \___| \_,_| \__|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  Reclaim the Grid  ◈◈";
        self.front.put_str(8, 7, subtitle, ACCENT, Color::Reset);

        let menu_base = 10;
        self.front.put_str(8, menu_base, "ENTER   Start", ACCENT, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD    Move",
            "  SPACE / X      Toggle cutting",
            "  F1 Pause   R Restart   ESC Title",
            "",
            "Claim the target share of the sector",
            "before the clock runs out. Don't let",
            "anything touch your open cut.",
        ];
        let help_base = menu_base + 3;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }

        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            let msg = format!(" ◈ {} ", w.message);
            self.front.put_str(0, msg_row, &msg, Color::Black, GOLD);
        }
    }

    fn compose_victory_overlay(&mut self, w: &WorldState) {
        let box_art = [
            "╔═══════════════════════════════╗",
            "║     ★ SECTOR SECURED ★       ║",
            "║  ENTER: Next   ESC: Title     ║",
            "╚═══════════════════════════════╝",
        ];
        let cols = w.rules.grid_width * CELL_W;
        let cx = cols.saturating_sub(box_art[0].chars().count()) / 2;
        let cy = GRID_ROW + w.rules.grid_height / 2 - 1;
        let bg = Color::Rgb { r: 20, g: 60, b: 20 };
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(cx, cy + i, l, GOLD, bg);
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let box_art = [
            "╔════════════════════════════════╗",
            "║       ✕ SIGNAL LOST ✕         ║",
            "╚════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, DANGER, Color::Reset);
        }
        let score = format!("◈ Final Score: {}", w.score);
        let level = format!("◈ Reached Sector: {}", w.level + 1);
        self.front.put_str(8, 9, &score, Color::White, Color::Reset);
        self.front.put_str(8, 10, &level, Color::White, Color::Reset);
        self.front.put_str(8, 12, "▸ ENTER: Retry from Sector 1", ACCENT, Color::Reset);
        self.front.put_str(8, 13, "▸ ESC:   Back to Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (w.anim_tick / 8) % 2 == 0;

        let cols = w.rules.grid_width * CELL_W;
        let rows = w.rules.grid_height;
        let box_w = 28usize.min(cols);
        let box_h = 7usize.min(rows);
        let box_x = cols.saturating_sub(box_w) / 2;
        let box_y = GRID_ROW + rows.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, dim));
            }
        }

        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + 8, box_y + 1, label, GOLD, dim);
        self.front.put_str(box_x + 4, box_y + 3, "F1   Resume", Color::Rgb { r: 100, g: 200, b: 255 }, dim);
        self.front.put_str(box_x + 4, box_y + 4, "R    Restart Sector", Color::Rgb { r: 100, g: 200, b: 255 }, dim);
        self.front.put_str(box_x + 4, box_y + 5, "ESC  Back to Title", Color::Rgb { r: 100, g: 200, b: 255 }, dim);
    }
}

/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World coordinates are scaled down to terminal cells by the `[display]`
/// config (16×24 world units per cell by default, so 1280×720 → 80×30).
/// The top rows cover the arena's status strip and carry the HUD.
/// Everything drawn comes from a `FrameSnapshot`.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::{ArenaConfig, DisplayConfig};
use crate::domain::entity::PlayerId;
use crate::domain::geom::{Point, Rect};
use crate::domain::guard::HazardStyle;
use crate::domain::links::{LinkId, Signal};
use crate::sim::snapshot::{FrameSnapshot, SwitchKind};
use crate::sim::world::Phase;

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const WALL: Color = Color::Rgb { r: 110, g: 110, b: 130 };
const GATE: Color = Color::Rgb { r: 200, g: 120, b: 255 };
const P1_C: Color = Color::Rgb { r: 70, g: 140, b: 255 };
const P2_C: Color = Color::Rgb { r: 80, g: 220, b: 110 };
const GUARD_C: Color = Color::Rgb { r: 230, g: 60, b: 60 };
const FIRE_C: Color = Color::Rgb { r: 255, g: 140, b: 30 };
const OFF_C: Color = Color::Rgb { r: 90, g: 90, b: 90 };
const CONE_BG: Color = Color::Rgb { r: 70, g: 30, b: 35 };
const FIRE_CONE_BG: Color = Color::Rgb { r: 80, g: 45, b: 20 };
const SWITCH_C: Color = Color::Rgb { r: 240, g: 220, b: 60 };
const ZONE_C: Color = Color::Rgb { r: 60, g: 200, b: 230 };
const PLATE_C: Color = Color::Rgb { r: 255, g: 165, b: 0 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const CHEST_C: Color = Color::Rgb { r: 170, g: 110, b: 50 };
const DIM: Color = Color::Rgb { r: 180, g: 180, b: 180 };

/// Rows at the bottom for the control help line.
const HELP_ROWS: usize = 1;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
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

    /// Recolor the background only, keeping glyph and foreground.
    fn tint(&mut self, x: usize, y: usize, bg: Color) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].bg = bg;
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, BASE_BG);
    }
}

// ── Scale: world units → terminal cells ──

#[derive(Clone, Copy)]
struct Scale {
    cw: f32,
    ch: f32,
    cols: usize,
    rows: usize,
}

impl Scale {
    fn new(display: &DisplayConfig, arena: &ArenaConfig) -> Self {
        Scale {
            cw: display.cell_width,
            ch: display.cell_height,
            cols: (arena.width / display.cell_width).ceil() as usize,
            rows: (arena.height / display.cell_height).ceil() as usize,
        }
    }

    /// Cells covered by `[start, start + len)`; never empty.
    fn span(start: f32, len: f32, unit: f32) -> Range<usize> {
        let a = (start / unit).floor().max(0.0) as usize;
        let b = ((start + len) / unit).ceil().max(0.0) as usize;
        a..b.max(a + 1)
    }

    fn cols_of(&self, r: &Rect) -> Range<usize> {
        Self::span(r.x, r.w, self.cw)
    }

    fn rows_of(&self, r: &Rect) -> Range<usize> {
        Self::span(r.y, r.h, self.ch)
    }

    fn cell_center(&self, col: usize, row: usize) -> Point {
        Point::new((col as f32 + 0.5) * self.cw, (row as f32 + 0.5) * self.ch)
    }

    /// Rows of the status strip, reserved for the HUD.
    fn hud_rows(&self, arena: &ArenaConfig) -> usize {
        (arena.status_bar / self.ch).floor() as usize
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    scale: Scale,
    arena: ArenaConfig,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new(display: &DisplayConfig, arena: &ArenaConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            scale: Scale::new(display, arena),
            arena: *arena,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// reports key releases (needed for smooth two-player input).
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        log::debug!("keyboard enhancement: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        if self.term_w < self.scale.cols || self.term_h < self.scale.rows + HELP_ROWS {
            log::warn!(
                "terminal is {}x{}, arena needs {}x{}; the view will be cropped",
                self.term_w, self.term_h, self.scale.cols, self.scale.rows + HELP_ROWS,
            );
        }

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snap: &FrameSnapshot) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(snap.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(snap.phase);
        }

        self.front.clear();

        match snap.phase {
            Phase::Menu => self.compose_menu(snap),
            Phase::Playing => self.compose_game(snap),
            Phase::Victory => {
                self.compose_game(snap);
                self.compose_banner(&[
                    "LEVEL CLEARED",
                    "",
                    "SPACE / R: next level",
                ]);
            }
            Phase::CampaignComplete => self.compose_banner(&[
                "PROTOCOL COMPLETE: SUCCESSFUL SYNC",
                "",
                "All levels cleared. Interdependence achieved.",
                "",
                "R: restart campaign    Q: quit",
            ]),
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(BASE_BG),
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

    fn fill_rect(&mut self, r: &Rect, cell: Cell) {
        for row in self.scale.rows_of(r) {
            for col in self.scale.cols_of(r) {
                self.front.set(col, row, cell);
            }
        }
    }

    fn compose_game(&mut self, snap: &FrameSnapshot) {
        self.compose_cones(snap);

        for w in &snap.walls {
            self.fill_rect(w, Cell::new('█', WALL, BASE_BG));
        }
        for w in &snap.dynamic_walls {
            let cell = if w.open {
                Cell::new('·', GATE, BASE_BG)
            } else {
                Cell::new('▓', GATE, BASE_BG)
            };
            self.fill_rect(&w.rect, cell);
        }

        for s in &snap.switches {
            let color = match (s.kind, s.signal) {
                (_, Some(Signal::Trap)) => GUARD_C,
                (_, Some(Signal::Cure)) => P2_C,
                (SwitchKind::SyncZone, None) => ZONE_C,
                (SwitchKind::Plate, None) => PLATE_C,
                (SwitchKind::Switch | SwitchKind::Fake, None) => SWITCH_C,
            };
            let glyph = match s.kind {
                SwitchKind::SyncZone | SwitchKind::Plate => if s.lit { '▒' } else { '░' },
                SwitchKind::Switch | SwitchKind::Fake => if s.lit { '●' } else { '○' },
            };
            self.fill_rect(&s.rect, Cell::new(glyph, color, BASE_BG));
            if let Some(LinkId(n)) = s.link {
                let (col, row) = (self.scale.cols_of(&s.rect).start, self.scale.rows_of(&s.rect).start);
                if let Some(digit) = char::from_digit(n % 10, 10) {
                    self.front.set(col, row, Cell::new(digit, Color::Black, color));
                }
            }
        }

        let goal = &snap.goal;
        if let Some(key) = goal.key {
            self.fill_rect(&key, Cell::new('⚷', GOLD, BASE_BG));
        }
        let chest = if goal.chest_opened { '□' } else { '■' };
        self.fill_rect(&goal.chest, Cell::new(chest, CHEST_C, BASE_BG));
        if let Some(pod) = goal.pod {
            self.fill_rect(&pod, Cell::new('◎', Color::White, BASE_BG));
        }

        for g in snap.guards.iter().filter(|g| g.active) {
            if let Some(wp) = g.waypoint {
                let col = (wp.x / self.scale.cw) as usize;
                let row = (wp.y / self.scale.ch) as usize;
                self.front.set(col, row, Cell::new('+', GUARD_C, BASE_BG));
            }
        }

        for g in &snap.guards {
            let cell = match (g.active, g.style) {
                (false, _) => Cell::new('g', OFF_C, BASE_BG),
                (true, HazardStyle::Guard) => Cell::new('G', Color::White, GUARD_C),
                (true, HazardStyle::Fire) => Cell::new('^', Color::White, FIRE_C),
            };
            self.fill_rect(&g.rect, cell);
        }

        for p in &snap.players {
            let (glyph, color) = match p.id {
                PlayerId::P1 => ('1', P1_C),
                PlayerId::P2 => ('2', P2_C),
            };
            let fg = if p.frozen { ZONE_C } else { Color::White };
            self.fill_rect(&p.rect, Cell::new(glyph, fg, color));
        }

        self.compose_hud(snap);

        if snap.tick < 240 && !snap.briefing.is_empty() {
            let lines: Vec<&str> = snap.briefing.iter().map(String::as_str).collect();
            self.compose_banner(&lines);
        }
    }

    /// Tint every cell whose center an active guard can see.
    fn compose_cones(&mut self, snap: &FrameSnapshot) {
        for g in snap.guards.iter().filter(|g| g.active) {
            let cone = &g.cone;
            let reach = Rect::new(
                cone.apex.x - cone.range,
                cone.apex.y - cone.range,
                cone.range * 2.0,
                cone.range * 2.0,
            );
            let bg = match g.style {
                HazardStyle::Guard => CONE_BG,
                HazardStyle::Fire => FIRE_CONE_BG,
            };
            for row in self.scale.rows_of(&reach) {
                for col in self.scale.cols_of(&reach) {
                    let c = self.scale.cell_center(col, row);
                    if cone.sees_point(c) {
                        self.front.tint(col, row, bg);
                    }
                }
            }
        }
    }

    fn compose_hud(&mut self, snap: &FrameSnapshot) {
        let hud_rows = self.scale.hud_rows(&self.arena).max(2);
        for row in 0..hud_rows {
            for col in 0..self.scale.cols.min(self.front.width) {
                self.front.set(col, row, Cell::BLANK);
            }
        }

        let title = format!(
            " {}  [{}/{}]  resets:{}",
            snap.level_name, snap.level_index + 1, snap.total_levels, snap.resets,
        );
        self.front.put_str(0, 0, &title, GOLD, BASE_BG);

        let line2 = if snap.message.is_empty() {
            format!(" {}", snap.description)
        } else {
            format!(" {}", snap.message)
        };
        let fg = if snap.message.is_empty() { DIM } else { Color::White };
        self.front.put_str(0, 1, &line2, fg, BASE_BG);

        let status = format!(
            "{}  P1:{}  P2:{} ",
            snap.objective(),
            snap.status_tags(PlayerId::P1),
            snap.status_tags(PlayerId::P2),
        );
        let x = self.scale.cols.saturating_sub(status.chars().count());
        self.front.put_str(x, 0, &status, DIM, BASE_BG);

        let help = " P1: WASD   P2: arrows   R: restart   Shift+R: campaign   F1-F9: level   Q: quit";
        self.front.put_str(0, self.scale.rows, help, OFF_C, BASE_BG);
    }

    fn compose_menu(&mut self, snap: &FrameSnapshot) {
        let mid = self.front.height / 2;
        let top = mid.saturating_sub(5);
        self.front.put_centered(top, "DUOS & DON'TS", P1_C);
        self.front.put_centered(top + 1, "Protocol Sync", DIM);
        self.front.put_centered(top + 4, "Press SPACE to start", Color::White);
        self.front.put_centered(
            top + 6,
            "P1 (blue, WASD) navigates hazards. P2 (green, arrows) opens the path.",
            DIM,
        );
        let count = format!("{} levels", snap.total_levels);
        self.front.put_centered(top + 8, &count, OFF_C);
    }

    /// Centered box with one line of text per entry.
    fn compose_banner(&mut self, lines: &[&str]) {
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let box_w = inner.min(self.front.width);
        let box_h = lines.len() + 2;
        let x0 = self.front.width.saturating_sub(box_w) / 2;
        let y0 = self.front.height.saturating_sub(box_h) / 2;
        let bg = Color::Rgb { r: 40, g: 40, b: 60 };

        for y in y0..y0 + box_h {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
        for (i, line) in lines.iter().enumerate() {
            let x = x0 + box_w.saturating_sub(line.chars().count()) / 2;
            let fg = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(x, y0 + 1 + i, line, fg, bg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn default_arena_fits_eighty_by_thirty() {
        let cfg = GameConfig::default();
        let s = Scale::new(&cfg.display, &cfg.arena);
        assert_eq!((s.cols, s.rows), (80, 30));
        assert_eq!(s.hud_rows(&cfg.arena), 2);
    }

    #[test]
    fn spans_cover_partial_cells() {
        assert_eq!(Scale::span(0.0, 10.0, 16.0), 0..1);
        assert_eq!(Scale::span(635.0, 10.0, 16.0), 39..41);
        assert_eq!(Scale::span(-20.0, 10.0, 16.0), 0..1);
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut buf = FrameBuffer::new(4, 1);
        buf.put_str(2, 0, "abc", Color::White, BASE_BG);
        assert_eq!(buf.get(3, 0).ch, 'b');
        buf.tint(3, 0, CONE_BG);
        assert_eq!(buf.get(3, 0), Cell::new('b', Color::White, CONE_BG));
    }
}

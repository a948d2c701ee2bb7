//! # Clock Window Host
//!
//! Owns the lifecycle of the single clock window:
//!
//! 1. the application is ready → the window is created, hidden;
//! 2. [`WindowEvent::ReadyToShow`] → the window is shown;
//! 3. [`WindowEvent::Closed`] → the window is dropped and nothing is drawn;
//! 4. [`WindowEvent::Activate`] with no window → a new one is created.
//!
//! Drawing goes through the [`Surface`] trait. [`TerminalSurface`] redraws the
//! frame in place on an ANSI terminal.

use crate::config::WindowConfig;
use log::debug;
use std::io::{self, Stdout, Write};

/// Terminal cell width used to turn pixel widths into columns.
pub const PIXELS_PER_COLUMN: u32 = 10;

/// Geometry and decoration of the clock window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub resizable: bool,
    pub hide_title_bar: bool,
}

impl From<&WindowConfig> for WindowOptions {
    fn from(config: &WindowConfig) -> Self {
        WindowOptions {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            x: config.x,
            y: config.y,
            resizable: config.resizable,
            hide_title_bar: config.hide_title_bar,
        }
    }
}

impl WindowOptions {
    /// Width in terminal columns, at least one.
    pub fn columns(&self) -> usize {
        (self.width / PIXELS_PER_COLUMN).max(1) as usize
    }
}

/// Events delivered to the window host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEvent {
    /// The window has content and may be shown
    ReadyToShow,
    /// The window was closed
    Closed,
    /// The application was re-activated
    Activate,
}

/// Something a clock frame can be drawn on.
pub trait Surface {
    /// Create the (still hidden) window.
    fn open(&mut self, options: &WindowOptions) -> io::Result<()>;
    fn show(&mut self) -> io::Result<()>;
    fn draw(&mut self, lines: &[String]) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

#[derive(Debug)]
struct Window {
    visible: bool,
}

/// Drives a [`Surface`] through the window lifecycle.
pub struct WindowHost<S: Surface> {
    options: WindowOptions,
    surface: S,
    window: Option<Window>,
}

impl<S: Surface> WindowHost<S> {
    pub fn new(options: WindowOptions, surface: S) -> Self {
        WindowHost {
            options,
            surface,
            window: None,
        }
    }

    /// Create the window unless one already exists. Returns true if created.
    pub fn create(&mut self) -> io::Result<bool> {
        if self.window.is_some() {
            return Ok(false);
        }
        self.surface.open(&self.options)?;
        self.window = Some(Window { visible: false });
        debug!(
            "Window created ({}x{} at {},{})",
            self.options.width, self.options.height, self.options.x, self.options.y
        );
        Ok(true)
    }

    pub fn handle(&mut self, event: WindowEvent) -> io::Result<()> {
        match event {
            WindowEvent::ReadyToShow => {
                if let Some(window) = self.window.as_mut().filter(|w| !w.visible) {
                    self.surface.show()?;
                    window.visible = true;
                }
            }
            WindowEvent::Closed => {
                if self.window.take().is_some() {
                    self.surface.close()?;
                    debug!("Window closed");
                }
            }
            WindowEvent::Activate => {
                self.create()?;
            }
        }
        Ok(())
    }

    /// Draw a frame if the window is shown. Returns true if drawn.
    pub fn draw(&mut self, lines: &[String]) -> io::Result<bool> {
        match &self.window {
            Some(window) if window.visible => {
                self.surface.draw(lines)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.window.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.visible)
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// ANSI terminal surface; every frame replaces the previous one.
pub struct TerminalSurface<W: Write = Stdout> {
    out: W,
    columns: usize,
}

impl TerminalSurface<Stdout> {
    pub fn stdout() -> Self {
        TerminalSurface::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        TerminalSurface { out, columns: 1 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Center `line` in the window width, truncating when it does not fit.
    fn fit(&self, line: &str) -> String {
        let width = line.chars().count();
        if width >= self.columns {
            return line.chars().take(self.columns).collect();
        }
        let pad = (self.columns - width) / 2;
        format!("{}{}", " ".repeat(pad), line)
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn open(&mut self, options: &WindowOptions) -> io::Result<()> {
        self.columns = options.columns();
        if !options.hide_title_bar {
            write!(self.out, "\x1b]0;{}\x07", options.title)?;
        }
        self.out.flush()
    }

    fn show(&mut self) -> io::Result<()> {
        write!(self.out, "{HIDE_CURSOR}{CLEAR_AND_HOME}")?;
        self.out.flush()
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        write!(self.out, "{CLEAR_AND_HOME}")?;
        for line in lines {
            writeln!(self.out, "{}", self.fit(line))?;
        }
        self.out.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        write!(self.out, "{CLEAR_AND_HOME}{SHOW_CURSOR}")?;
        self.out.flush()
    }
}

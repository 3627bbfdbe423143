use core::fmt::Display;
use core::fmt::Write;
use std::io::{self, IsTerminal};
use log::{Level, LevelFilter, Log};
use owo_colors::OwoColorize;
use unicode_segmentation::UnicodeSegmentation;

struct Inner {
    color: bool,
}

impl Inner {
    fn write_with_color(&mut self, color: Color, string: impl Display) {
        let string: &dyn Display = match (self.color, color) {
            (false, _) | (_, Color::Default) => &string,
            (true, Color::Gray) => &string.dimmed(),
            (true, Color::BrightRed) => &string.bright_red(),
            (true, Color::BrightYellow) => &string.bright_yellow(),
            (true, Color::BrightBlue) => &string.bright_blue(),
            (true, Color::BrightCyan) => &string.bright_cyan(),
            (true, Color::BrightMagenta) => &string.bright_magenta(),
        };
        let mut writer = WriterWithCr::new(Console(io::stdout().lock()));
        // Nowhere left to report a failing console.
        let _ = write!(writer, "{string}");
    }
}

struct ConsoleLogger {
    inner: spin::Mutex<Inner>,
}

static LOGGER: ConsoleLogger = ConsoleLogger {
    inner: spin::Mutex::new(Inner { color: false }),
};

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut inner = self.inner.lock();
        let level = record.level();
        inner.write_with_color(
            match level {
                Level::Error => Color::BrightRed,
                Level::Warn => Color::BrightYellow,
                Level::Info => Color::BrightBlue,
                Level::Debug => Color::BrightCyan,
                Level::Trace => Color::BrightMagenta,
            },
            format_args!("{level:5} "),
        );
        inner.write_with_color(Color::Gray, format_args!("[{}] ", record.target()));
        inner.write_with_color(Color::Default, record.args());
        inner.write_with_color(Color::Default, "\n");
    }

    fn flush(&self) {
        let _ = io::Write::flush(&mut io::stdout());
    }
}

/// Install the console logger. Colours are only used when stdout is a terminal.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    LOGGER.inner.lock().color = io::stdout().is_terminal();
    log::set_max_level(level);
    log::set_logger(&LOGGER)
}

/// `fmt::Write` over a locked stdout.
struct Console<W>(W);

impl<W: io::Write> Write for Console<W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}

/// Serial consoles want CRLF line endings.
struct WriterWithCr<T> {
    writer: T,
}

impl<T> WriterWithCr<T> {
    pub const fn new(writer: T) -> Self {
        Self { writer }
    }
}

impl<T: Write> Write for WriterWithCr<T> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.graphemes(true) {
            match c {
                "\n" => self.writer.write_str("\r\n")?,
                s => self.writer.write_str(s)?,
            }
        }
        Ok(())
    }
}

enum Color {
    Default,
    Gray,
    BrightRed,
    BrightYellow,
    BrightBlue,
    BrightCyan,
    BrightMagenta,
}

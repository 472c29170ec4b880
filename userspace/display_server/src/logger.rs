use core::fmt::Display;
use log::{Level, LevelFilter, Log};
use owo_colors::OwoColorize;
use std::io::Write;

struct Inner {
    name: heapless::String<32>,
}

impl Inner {
    fn write_with_color(out: &mut impl Write, color: Color, string: impl Display) {
        let string: &dyn Display = match color {
            Color::Default => &string,
            Color::Gray => &string.dimmed(),
            Color::BrightRed => &string.bright_red(),
            Color::BrightYellow => &string.bright_yellow(),
            Color::BrightBlue => &string.bright_blue(),
            Color::BrightCyan => &string.bright_cyan(),
            Color::BrightMagenta => &string.bright_magenta(),
        };
        // Nowhere left to report a failed write to stderr.
        let _ = write!(out, "{string}");
    }
}

struct ServerLogger {
    inner: spin::Mutex<Inner>,
}

static LOGGER: ServerLogger = ServerLogger {
    inner: spin::Mutex::new(Inner {
        name: heapless::String::new(),
    }),
};

impl Log for ServerLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let inner = self.inner.lock();
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        let level = record.level();
        Inner::write_with_color(
            &mut out,
            match level {
                Level::Error => Color::BrightRed,
                Level::Warn => Color::BrightYellow,
                Level::Info => Color::BrightBlue,
                Level::Debug => Color::BrightCyan,
                Level::Trace => Color::BrightMagenta,
            },
            format_args!("{level:5} "),
        );
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("?");
        Inner::write_with_color(
            &mut out,
            Color::Gray,
            format_args!("[{}/{thread}] ", inner.name),
        );
        Inner::write_with_color(&mut out, Color::Default, record.args());
        Inner::write_with_color(&mut out, Color::Default, "\n");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the logger. `name` prefixes every line and is cut to 32 bytes.
pub fn init(name: &str, level: LevelFilter) -> Result<(), log::SetLoggerError> {
    {
        let mut inner = LOGGER.inner.lock();
        inner.name.clear();
        for c in name.chars() {
            if inner.name.push(c).is_err() {
                break;
            }
        }
    }
    log::set_max_level(level);
    log::set_logger(&LOGGER)
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

use display_api_types::MouseButtons;
use display_api_types::input::{InputEvent, MouseEvent};
use display_api_types::window::{Request, ResponseData, WindowResponse, WindowStyle, WindowTitle};
use display_server_lib::backend::HeadlessBackend;
use display_server_lib::config::{Config, USAGE};
use display_server_lib::frame_buffer::FrameBuffer;
use display_server_lib::manager::WindowManager;
use display_server_lib::{logger, server};
use embedded_graphics::Drawable;
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::Primitive;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type Manager = WindowManager<HeadlessBackend>;

const TITLE_BAR_HEIGHT: u32 = 12;
const CUBE_SIZE: u32 = 16;
const FRAMES: usize = 60;

fn main() {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("display_server: {err}\n{USAGE}");
            std::process::exit(1);
        }
    };
    if let Err(err) = logger::init(&config.name, config.log_level) {
        eprintln!("display_server: logger already installed: {err}");
    }

    let manager = match WindowManager::new(HeadlessBackend::new(), &config) {
        Ok(manager) => Arc::new(manager),
        Err(err) => {
            log::error!("cannot bring up the screen: {err}");
            std::process::exit(1);
        }
    };
    log::info!("{} ready", config.name);

    let workers = [
        spawn("input", {
            let manager = Arc::clone(&manager);
            move || run_input(&manager)
        }),
        spawn("demo-client", {
            let manager = Arc::clone(&manager);
            move || run_demo_client(manager)
        }),
    ];
    for worker in workers.into_iter().flatten() {
        if worker.join().is_err() {
            log::error!("worker thread panicked");
        }
    }

    let backend = manager.backend();
    log::info!(
        "shutting down after {} dirty notifications, cursor at {:?}",
        backend.dirty_count(),
        backend.cursor()
    );
}

fn spawn(name: &str, f: impl FnOnce() + Send + 'static) -> Option<thread::JoinHandle<()>> {
    match thread::Builder::new().name(name.into()).spawn(f) {
        Ok(handle) => Some(handle),
        Err(err) => {
            log::error!("cannot start {name} thread: {err}");
            None
        }
    }
}

/// Stand-in for the PS/2 decoder: wander onto the demo window, then press
/// and drag across it.
fn run_input(manager: &Manager) {
    let step = |dx, dy, buttons| MouseEvent {
        dx,
        dy,
        dz: 0,
        buttons,
    };
    let mut script = Vec::new();
    script.extend((0..10).map(|_| step(-12, 8, MouseButtons::empty())));
    script.push(step(0, 0, MouseButtons::LEFT));
    script.extend((0..10).map(|_| step(4, -2, MouseButtons::LEFT)));
    script.push(step(0, 0, MouseButtons::empty()));

    for event in script {
        thread::sleep(Duration::from_millis(10));
        if let Err(err) = manager.handle_input(&InputEvent::Mouse(event)) {
            log::warn!("input: {err}");
        }
    }
}

fn run_demo_client(manager: Arc<Manager>) {
    let (client, session) = match server::connect(Arc::clone(&manager)) {
        Ok(connection) => connection,
        Err(err) => {
            log::error!("cannot connect demo client: {err}");
            return;
        }
    };
    if let ResponseData::Modes { count, .. } = client.call(Request::GetModes { max: 0 }).data {
        log::debug!("demo client: {count} modes on offer");
    }
    let title = "bouncing cube";
    let response = client.call(Request::CreateWindow {
        x: 160,
        y: 120,
        width: 200,
        height: 150,
        style: WindowStyle::Default,
        title_bar_height: TITLE_BAR_HEIGHT,
        title: WindowTitle::try_from(title).unwrap_or_default(),
    });
    if !response.result.is_ok() {
        log::error!("demo window refused: {:?}", response.result);
        return;
    }
    let id = response.window_id;

    let (mut x, mut y) = (0i32, TITLE_BAR_HEIGHT as i32);
    let (mut dx, mut dy) = (3i32, 2i32);
    for _ in 0..FRAMES {
        let drawn = manager.with_window_buffer(client.client(), id, |fb| {
            draw_frame(fb, title, Point::new(x, y));
            fb.bounds()
        });
        let bounds = match drawn {
            Ok(bounds) => bounds,
            Err(err) => {
                log::warn!("demo window is gone: {err}");
                break;
            }
        };
        let response = client.call(Request::Update {
            window: id,
            x: 0,
            y: 0,
            width: bounds.width,
            height: bounds.height,
        });
        log_failure("update", response);

        x += dx;
        y += dy;
        if x < 0 || x + CUBE_SIZE as i32 > bounds.width as i32 {
            dx = -dx;
            x += 2 * dx;
        }
        if y < TITLE_BAR_HEIGHT as i32 || y + CUBE_SIZE as i32 > bounds.height as i32 {
            dy = -dy;
            y += 2 * dy;
        }

        for event in client.events().try_iter() {
            log::trace!("demo client got {event:?}");
        }
        thread::sleep(Duration::from_millis(5));
    }

    for finished in [false, true] {
        let response = client.call(Request::Move {
            window: id,
            x: 40,
            y: 40,
            finished,
        });
        log_failure("move", response);
    }
    drop(client);
    if session.join().is_err() {
        log::error!("demo client session panicked");
    }
}

fn draw_frame(fb: &mut FrameBuffer, title: &str, cube: Point) {
    let width = fb.width();
    let body = Rectangle::new(Point::zero(), Size::new(width, fb.height()));
    let Ok(()) = body
        .into_styled(PrimitiveStyle::with_fill(Rgb888::new(0x20, 0x20, 0x28)))
        .draw(fb);
    let bar = Rectangle::new(Point::zero(), Size::new(width, TITLE_BAR_HEIGHT));
    let Ok(()) = bar
        .into_styled(PrimitiveStyle::with_fill(Rgb888::new(0x40, 0x60, 0x90)))
        .draw(fb);
    let style = MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(Rgb888::WHITE)
        .build();
    let Ok(_) = Text::with_baseline(title, Point::new(2, 1), style, Baseline::Top).draw(fb);
    let Ok(()) = Rectangle::new(cube, Size::new(CUBE_SIZE, CUBE_SIZE))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
        .draw(fb);
}

fn log_failure(what: &str, response: WindowResponse) {
    if !response.result.is_ok() {
        log::warn!("demo client: {what} failed with {:?}", response.result);
    }
}

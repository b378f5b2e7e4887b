use crate::browser;
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use futures::channel::oneshot::channel;
use futures::future::try_join_all;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - because we control the closure creation and specify the expected type,
    // in principle this should be generally safe (unsafe) code
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Minimum frame delta, in seconds, before entities advance and a new
/// frame is rendered. Frames arriving faster than this (over ~100 fps)
/// neither move enemies nor reset the frame timer.
pub const FRAME_THRESHOLD: f64 = 0.01;

/// Named directional action derived from an arrow-key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Commands the UI layer and keyboard wiring dispatch into the game.
/// Keeps the core decoupled from any particular DOM layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Reset,
    SetDifficulty(u8),
    SetCharacter(String),
}

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn handle_command(&mut self, command: Command);
    fn update(&mut self, dt: f64);
    fn draw(&mut self, renderer: &Renderer);
}

pub struct GameLoop {
    last_frame: f64,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(
        game: impl Game + 'static,
        mut commands: UnboundedReceiver<Command>,
    ) -> Result<()> {
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
        };
        let renderer = Renderer {
            // moving this outside of request_animation_frame closure no longer
            // requires us to use the expect() syntax ... nice
            context: browser::context()?,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            // input and settings commands interleave between frames; the
            // channel preserves the order they arrived in
            while let Ok(Some(command)) = commands.try_next() {
                game.handle_command(command);
            }
            let dt = (perf - game_loop.last_frame) / 1000.0;
            game.update(dt);
            // last_frame only advances on rendered frames, so dt keeps
            // accumulating across frames faster than the threshold
            if dt >= FRAME_THRESHOLD {
                game.draw(&renderer);
                game_loop.last_frame = perf;
            }
            let _ = browser::request_animation_frame(f.borrow().as_ref().unwrap());
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x, rect.y, rect.width, rect.height);
    }

    pub fn draw_image(&self, image: &HtmlImageElement, x: f64, y: f64) {
        self.context
            .draw_image_with_html_image_element(image, x, y)
            .expect("Drawing is throwing exceptions! Unrecoverable error");
    }
}

/// Image store keyed by sprite identifier. All sprites load in parallel;
/// total load time is the slowest resource, not the sum.
pub struct Assets {
    images: HashMap<String, HtmlImageElement>,
}

impl Assets {
    pub async fn load(sources: &[&str]) -> Result<Assets> {
        let images = try_join_all(sources.iter().map(|source| load_image(source))).await?;
        let images = sources
            .iter()
            .map(|source| source.to_string())
            .zip(images)
            .collect();
        Ok(Assets { images })
    }

    pub fn get(&self, sprite: &str) -> Result<&HtmlImageElement> {
        self.images
            .get(sprite)
            .ok_or_else(|| anyhow!("Sprite not loaded : '{}'", sprite))
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - double unwrap because Result<Result<(), Error>, oneshot::Canceled>
    // - first unwrap yields channel result : Result<(), Error>
    // - second unwrap yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

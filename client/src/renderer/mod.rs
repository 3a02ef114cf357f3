mod frame;
mod window;

use std::{
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use frame::{CellLayout, PIXEL_BYTES, RenderFrame};
use liblife::{board::TileState, pos::Position};
use rand::seq::IndexedRandom;
use window::{Renderer, RendererWindowConfig};
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{Key, ModifiersState, NamedKey},
};

use crate::{
    settings::CellColor,
    state::{State, read_state, write_state},
};

const TARGET_FPS: u64 = 30;
const HALF_TILE_MARGIN: u32 = 1;
const BACKGROUND_COLOR: [u8; PIXEL_BYTES] = [10, 10, 10, 255];

/// Largest window edge the grid asks for, in logical pixels.
const MAX_WINDOW_EDGE: u32 = 1200;

/// Opens the window and runs it on the calling thread until it is closed.
///
/// Left click toggles a cell and dragging toggles every cell entered. Space
/// pauses, N single-steps, Ctrl+S quick-saves, Ctrl+L loads the newest pattern,
/// Ctrl+R randomizes and Ctrl+C clears.
pub fn run(state_arc: Arc<RwLock<State>>) -> anyhow::Result<()> {
    let (title, (width, height)) = {
        let state = read_state(&state_arc);
        (state.status_line(), window_size(&state))
    };

    let renderer_state = RendererState {
        global_state: state_arc.clone(),
        layout: None,
        mouse: MouseTracker::default(),
        modifiers: ModifiersState::empty(),
        random_colors: RandomColors::default(),
    };

    let renderer_state_arc = Arc::new(Mutex::new(renderer_state));
    let draw_state_arc = renderer_state_arc.clone();
    let event_state_arc = renderer_state_arc.clone();
    let size_state_arc = state_arc.clone();

    let renderer = Renderer::new(RendererWindowConfig {
        title,
        width,
        height,
        target_fps: TARGET_FPS,
        draw_callback: Box::new(move |frame| {
            draw(&mut lock(&draw_state_arc), frame);
        }),
        event_callback: Some(Box::new(move |event| {
            on_event(&mut lock(&event_state_arc), event);
        })),
        title_callback: Some(Box::new(move || read_state(&state_arc).status_line())),
        size_callback: Some(Box::new(move || window_size(&read_state(&size_state_arc)))),
    })?;

    renderer.run()
}

/// Logical window size showing every cell at the configured cell size.
fn window_size(state: &State) -> (u32, u32) {
    let grid = state.simulation.grid();
    let cell_pixels = state.settings.cell_pixels();

    (
        (grid.columns() as u32 * cell_pixels).min(MAX_WINDOW_EDGE),
        (grid.rows() as u32 * cell_pixels).min(MAX_WINDOW_EDGE),
    )
}

fn lock(renderer_state: &Mutex<RendererState>) -> MutexGuard<'_, RendererState> {
    renderer_state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn draw(state: &mut RendererState, mut frame: RenderFrame) {
    let global_state = read_state(&state.global_state);
    let grid = global_state.simulation.grid();
    let settings = &global_state.settings;

    let layout = CellLayout::new(frame.width, frame.height, grid.columns(), grid.rows());
    state.layout = Some(layout);

    let dead_color = settings
        .dead_color
        .rgba()
        .unwrap_or(BACKGROUND_COLOR);

    frame.fill(BACKGROUND_COLOR);

    state.random_colors.fit(grid.columns() * grid.rows());

    for (index, (tile_pos, tile)) in grid.enumerate_tiles().enumerate() {
        let color = match (*tile, settings.live_color.rgba()) {
            (TileState::Alive, Some(live_color)) => live_color,
            (TileState::Alive, None) => state.random_colors.alive(index),
            (TileState::Dead, _) => {
                state.random_colors.dead(index);
                dead_color
            }
        };

        let (tile_screen_x, tile_screen_y) = layout.cell_origin(tile_pos);

        frame.fill_rect(
            tile_screen_x + HALF_TILE_MARGIN,
            tile_screen_y + HALF_TILE_MARGIN,
            layout.cell_width.saturating_sub(HALF_TILE_MARGIN * 2),
            layout.cell_height.saturating_sub(HALF_TILE_MARGIN * 2),
            color,
        );
    }
}

fn on_event(state: &mut RendererState, event: &WindowEvent) {
    let toggle_pos = match event {
        WindowEvent::ModifiersChanged(modifiers) => {
            state.modifiers = modifiers.state();
            None
        }
        WindowEvent::KeyboardInput {
            event: key_event, ..
        } => {
            if key_event.state == ElementState::Pressed && !key_event.repeat {
                let ctrl = state.modifiers.control_key();

                if let Some(action) = key_action(key_event.logical_key.as_ref(), ctrl) {
                    if let Err(e) = action.apply(&mut write_state(&state.global_state)) {
                        log::error!("{e:#}");
                    }
                }
            }
            None
        }
        WindowEvent::MouseInput {
            state: mouse_state,
            button: MouseButton::Left,
            ..
        } => state.mouse.press(mouse_state.is_pressed()),
        WindowEvent::CursorMoved { position, .. } => {
            let tile_pos = state
                .layout
                .and_then(|layout| layout.cell_at(position.x, position.y));

            state.mouse.moved(tile_pos)
        }
        WindowEvent::CursorLeft { .. } => {
            state.mouse.left();
            None
        }
        _ => None,
    };

    if let Some(Position { x, y }) = toggle_pos {
        // The grid may have been resized since the layout was computed.
        if let Err(e) = write_state(&state.global_state).simulation.toggle_cell(x, y) {
            log::debug!("Ignoring click: {e}");
        }
    }
}

/// Follows the cursor across cells. A held left button toggles the cell it
/// is pressed on and every cell entered afterwards, each once per entry.
#[derive(Debug, Default)]
struct MouseTracker {
    tile_pos: Option<Position>,
    pressed: bool,
}

impl MouseTracker {
    /// Returns the cell to toggle, if any.
    fn press(&mut self, pressed: bool) -> Option<Position> {
        self.pressed = pressed;
        self.tile_pos.filter(|_| pressed)
    }

    /// Returns the cell to toggle, if any.
    fn moved(&mut self, tile_pos: Option<Position>) -> Option<Position> {
        let prev_tile_pos = mem::replace(&mut self.tile_pos, tile_pos);
        tile_pos.filter(|_| self.pressed && prev_tile_pos != tile_pos)
    }

    fn left(&mut self) {
        self.tile_pos = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    TogglePause,
    Step,
    Reset,
    Clear,
    QuickSave,
    QuickLoad,
}

fn key_action(key: Key<&str>, ctrl: bool) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Space) => Some(KeyAction::TogglePause),
        Key::Character(character) => match (ctrl, character.to_ascii_lowercase().as_str()) {
            (false, "n") => Some(KeyAction::Step),
            (true, "r") => Some(KeyAction::Reset),
            (true, "c") => Some(KeyAction::Clear),
            (true, "s") => Some(KeyAction::QuickSave),
            (true, "l") => Some(KeyAction::QuickLoad),
            _ => None,
        },
        _ => None,
    }
}

impl KeyAction {
    fn apply(self, state: &mut State) -> anyhow::Result<()> {
        match self {
            KeyAction::TogglePause => {
                state.simulation.toggle_pause();
            }
            KeyAction::Step => state.simulation.step_once(),
            KeyAction::Reset => state.simulation.reset(true),
            KeyAction::Clear => state.simulation.clear(),
            KeyAction::QuickSave => {
                let path = state.quick_save()?;
                log::info!("Saved pattern to {}", path.display());
            }
            KeyAction::QuickLoad => {
                let path = state.load_latest()?;
                log::info!("Loaded pattern from {}", path.display());
            }
        }

        Ok(())
    }
}

struct RendererState {
    global_state: Arc<RwLock<State>>,
    layout: Option<CellLayout>,
    mouse: MouseTracker,
    modifiers: ModifiersState,
    random_colors: RandomColors,
}

/// Per-cell colors for the `random` live color. A cell picks a new palette
/// color each time it comes alive and keeps it while it survives.
#[derive(Default)]
struct RandomColors {
    colors: Vec<Option<[u8; PIXEL_BYTES]>>,
}

impl RandomColors {
    /// Forgets all assignments when the grid size changes.
    fn fit(&mut self, tile_count: usize) {
        if self.colors.len() != tile_count {
            self.colors = vec![None; tile_count];
        }
    }

    fn alive(&mut self, index: usize) -> [u8; PIXEL_BYTES] {
        *self.colors[index].get_or_insert_with(|| {
            let palette = CellColor::palette()
                .filter_map(CellColor::rgba)
                .collect::<Vec<_>>();

            palette
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or([255; PIXEL_BYTES])
        })
    }

    fn dead(&mut self, index: usize) {
        self.colors[index] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    fn at(x: usize, y: usize) -> Option<Position> {
        Some(Position { x, y })
    }

    #[test]
    fn click_toggles_the_cell_under_the_cursor() {
        let mut mouse = MouseTracker::default();

        assert_eq!(mouse.press(true), None);
        assert_eq!(mouse.press(false), None);

        assert_eq!(mouse.moved(at(2, 3)), None);
        assert_eq!(mouse.press(true), at(2, 3));
        assert_eq!(mouse.press(false), None);
    }

    #[test]
    fn drag_toggles_each_entered_cell_once() {
        let mut mouse = MouseTracker::default();
        mouse.moved(at(0, 0));
        assert_eq!(mouse.press(true), at(0, 0));

        // Moving inside the same cell doesn't toggle it again.
        assert_eq!(mouse.moved(at(0, 0)), None);
        assert_eq!(mouse.moved(at(1, 0)), at(1, 0));
        assert_eq!(mouse.moved(at(1, 0)), None);
        assert_eq!(mouse.moved(at(1, 1)), at(1, 1));

        // Leftover pixels outside the grid, then back in.
        assert_eq!(mouse.moved(None), None);
        assert_eq!(mouse.moved(at(1, 1)), at(1, 1));

        mouse.press(false);
        assert_eq!(mouse.moved(at(2, 1)), None);
    }

    #[test]
    fn drag_toggles_again_after_leaving_the_window() {
        let mut mouse = MouseTracker::default();
        mouse.moved(at(4, 4));
        mouse.press(true);

        mouse.left();
        assert_eq!(mouse.moved(at(4, 4)), at(4, 4));
        assert_eq!(mouse.moved(at(4, 4)), None);
    }

    #[test]
    fn shortcuts_map_to_actions() {
        let cases = [
            (Key::Named(NamedKey::Space), false, Some(KeyAction::TogglePause)),
            (Key::Character("n"), false, Some(KeyAction::Step)),
            (Key::Character("N"), false, Some(KeyAction::Step)),
            (Key::Character("r"), true, Some(KeyAction::Reset)),
            (Key::Character("c"), true, Some(KeyAction::Clear)),
            (Key::Character("S"), true, Some(KeyAction::QuickSave)),
            (Key::Character("l"), true, Some(KeyAction::QuickLoad)),
            (Key::Character("n"), true, None),
            (Key::Character("s"), false, None),
            (Key::Character("r"), false, None),
            (Key::Named(NamedKey::Escape), false, None),
        ];

        for (key, ctrl, expected) in cases {
            assert_eq!(key_action(key.clone(), ctrl), expected, "{key:?} ctrl={ctrl}");
        }
    }

    #[test]
    fn actions_drive_the_simulation() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());

        KeyAction::TogglePause.apply(&mut state).unwrap();
        assert!(!state.simulation.is_paused());
        KeyAction::TogglePause.apply(&mut state).unwrap();

        KeyAction::Step.apply(&mut state).unwrap();
        assert_eq!(state.simulation.generation(), 1);

        state.simulation.toggle_cell(3, 2).unwrap();
        let saved = state.simulation.grid().clone();
        KeyAction::QuickSave.apply(&mut state).unwrap();

        KeyAction::Clear.apply(&mut state).unwrap();
        assert_eq!(state.simulation.grid().alive_count(), 0);

        KeyAction::QuickLoad.apply(&mut state).unwrap();
        assert_eq!(state.simulation.grid(), &saved);

        KeyAction::Reset.apply(&mut state).unwrap();
        assert!(state.simulation.is_paused());
        assert_eq!(state.simulation.generation(), 0);
    }

    #[test]
    fn quick_load_without_patterns_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());

        assert!(KeyAction::QuickLoad.apply(&mut state).is_err());
    }

    #[test]
    fn window_size_follows_cell_size_and_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        assert_eq!(window_size(&state), (80, 60));

        state
            .update_settings(|settings| settings.cell_size = 3)
            .unwrap();
        assert_eq!(window_size(&state), (240, 180));

        state.simulation.resize(100, 20, false).unwrap();
        assert_eq!(window_size(&state), (600, MAX_WINDOW_EDGE));
    }

    #[test]
    fn random_colors_stick_while_alive() {
        let mut colors = RandomColors::default();
        colors.fit(4);

        let first = colors.alive(2);
        for _ in 0..10 {
            assert_eq!(colors.alive(2), first);
        }

        colors.dead(2);
        assert_eq!(colors.colors[2], None);
    }

    #[test]
    fn random_colors_reset_on_resize() {
        let mut colors = RandomColors::default();
        colors.fit(4);
        colors.alive(0);

        colors.fit(4);
        assert!(colors.colors[0].is_some());

        colors.fit(9);
        assert_eq!(colors.colors.len(), 9);
        assert!(colors.colors.iter().all(Option::is_none));
    }
}

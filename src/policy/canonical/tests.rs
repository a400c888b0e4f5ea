use super::*;
use crate::input::{InputEvent, InputTargeter, PointerButtons, TouchPoint};
use crate::report::NullShellReport;
use crate::session::{ClientSink, NullSessionEventSink};
use crate::shell::{Shell, ShellCollaborators};
use crate::stack::InMemorySurfaceStack;
use crate::surface::{EdgeAttachment, SurfaceType};

#[derive(Debug, Clone, PartialEq, Eq)]
enum DragAndDrop {
    Set(Vec<u8>),
    Cleared,
}

#[derive(Default)]
struct DndTargeter {
    calls: Mutex<Vec<DragAndDrop>>,
}

impl InputTargeter for DndTargeter {
    fn set_focus(&self, _surface: &Arc<Surface>) {}

    fn clear_focus(&self) {}

    fn set_drag_and_drop_handle(&self, handle: &[u8]) {
        self.calls.lock().push(DragAndDrop::Set(handle.to_vec()));
    }

    fn clear_drag_and_drop_handle(&self) {
        self.calls.lock().push(DragAndDrop::Cleared);
    }
}

#[derive(Default)]
struct ClosingClient {
    closed: Mutex<Vec<SurfaceId>>,
}

impl ClientSink for ClosingClient {
    fn handle_close_request(&self, surface: SurfaceId) {
        self.closed.lock().push(surface);
    }
}

struct Desktop {
    shell: Arc<Shell>,
    stack: Arc<InMemorySurfaceStack>,
    targeter: Arc<DndTargeter>,
    client: Arc<ClosingClient>,
}

impl Desktop {
    fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    fn with_config(config: ShellConfig) -> Self {
        let stack = Arc::new(InMemorySurfaceStack::new());
        let targeter = Arc::new(DndTargeter::default());
        let shell = Shell::new(
            ShellCollaborators {
                input_targeter: targeter.clone(),
                surface_stack: stack.clone(),
                session_event_sink: Arc::new(NullSessionEventSink),
                report: Arc::new(NullShellReport),
            },
            CanonicalWindowManagerPolicy::factory(config),
        );
        Self {
            shell,
            stack,
            targeter,
            client: Arc::new(ClosingClient::default()),
        }
    }

    fn open(&self, name: &str) -> Arc<Session> {
        self.shell.open_session(1000, name, self.client.clone())
    }

    fn window(&self, session: &Arc<Session>, width: i32, height: i32) -> Arc<Surface> {
        self.shell
            .create_surface(
                session,
                SurfaceCreationParameters::new("window", Size::new(width, height)),
            )
            .unwrap()
    }

    fn move_to(&self, session: &Arc<Session>, surface: &Arc<Surface>, x: i32, y: i32) {
        let spec = SurfaceSpecification {
            top_left: Some(Point::new(x, y)),
            ..Default::default()
        };
        self.shell.modify_surface(session, surface, &spec).unwrap();
    }

    fn key(&self, scan_code: u32, modifiers: Modifiers) -> bool {
        self.shell
            .handle(&InputEvent::Keyboard(KeyboardEvent::down(scan_code, modifiers)))
    }

    fn pointer(
        &self,
        action: PointerAction,
        x: i32,
        y: i32,
        buttons: PointerButtons,
        modifiers: Modifiers,
    ) -> bool {
        self.shell.handle(&InputEvent::Pointer(PointerEvent {
            action,
            position: Point::new(x, y),
            buttons,
            modifiers,
        }))
    }

    fn rect(surface: &Surface) -> Rectangle {
        Rectangle::new(surface.top_left(), surface.window_size())
    }
}

const PRIMARY: PointerButtons = PointerButtons {
    primary: true,
    secondary: false,
    tertiary: false,
};

const TERTIARY: PointerButtons = PointerButtons {
    primary: false,
    secondary: false,
    tertiary: true,
};

const NO_BUTTONS: PointerButtons = PointerButtons {
    primary: false,
    secondary: false,
    tertiary: false,
};

fn rect(x: i32, y: i32, width: i32, height: i32) -> Rectangle {
    Rectangle::from_loc_and_size((x, y), (width, height))
}

#[test]
fn test_first_window_is_centred_above_middle() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    assert_eq!(Desktop::rect(&window), rect(760, 260, 400, 300));
}

#[test]
fn test_tall_window_is_clamped_to_display_top() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 1500);

    assert_eq!(window.top_left(), Point::new(760, 0));
}

#[test]
fn test_additional_windows_cascade() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let first = desktop.window(&session, 400, 300);
    let second = desktop.window(&session, 400, 300);

    assert_eq!(second.top_left(), first.top_left() + Displacement::new(10, 10));

    let other = desktop.open("other");
    let unrelated = desktop.window(&other, 400, 300);
    assert_eq!(unrelated.top_left(), first.top_left());
}

#[test]
fn test_cascade_follows_configured_title_bar_height() {
    let mut config = ShellConfig::default();
    config.placement.title_bar_height = 32;
    let desktop = Desktop::with_config(config);
    let session = desktop.open("app");
    let first = desktop.window(&session, 400, 300);
    let second = desktop.window(&session, 400, 300);

    assert_eq!(second.top_left(), first.top_left() + Displacement::new(32, 32));
}

#[test]
fn test_child_is_placed_beside_its_anchor() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let parent = desktop.window(&session, 400, 300);

    let beside = desktop
        .shell
        .create_surface(
            &session,
            SurfaceCreationParameters::new("menu", Size::new(100, 50))
                .of_type(SurfaceType::Menu)
                .with_parent(&parent)
                .with_aux_rect(rect(10, 20, 30, 10), EdgeAttachment::Vertical),
        )
        .unwrap();
    assert_eq!(beside.top_left(), Point::new(800, 280));

    let below = desktop
        .shell
        .create_surface(
            &session,
            SurfaceCreationParameters::new("menu", Size::new(100, 50))
                .of_type(SurfaceType::Menu)
                .with_parent(&parent)
                .with_aux_rect(rect(10, 20, 30, 10), EdgeAttachment::Horizontal),
        )
        .unwrap();
    assert_eq!(below.top_left(), Point::new(770, 290));
}

#[test]
fn test_child_flips_left_at_display_edge() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let parent = desktop.window(&session, 200, 300);
    desktop.move_to(&session, &parent, 1700, 260);

    let menu = desktop
        .shell
        .create_surface(
            &session,
            SurfaceCreationParameters::new("menu", Size::new(300, 50))
                .of_type(SurfaceType::Menu)
                .with_parent(&parent)
                .with_aux_rect(rect(10, 20, 30, 10), EdgeAttachment::Vertical),
        )
        .unwrap();

    assert_eq!(menu.top_left(), Point::new(1410, 280));
}

#[test]
fn test_new_surfaces_take_focus() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let first = desktop.window(&session, 400, 300);
    assert!(Arc::ptr_eq(&desktop.shell.focused_surface().unwrap(), &first));

    let second = desktop.window(&session, 400, 300);
    assert!(Arc::ptr_eq(&desktop.shell.focused_surface().unwrap(), &second));
}

#[test]
fn test_new_surfaces_stay_unfocused_when_disabled() {
    let mut config = ShellConfig::default();
    config.focus.focus_new_surfaces = false;
    let desktop = Desktop::with_config(config);
    let session = desktop.open("app");
    desktop.window(&session, 400, 300);

    assert!(desktop.shell.focused_surface().is_none());
}

#[test]
fn test_alt_f11_toggles_maximized() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    assert!(desktop.key(keys::KEY_F11, Modifiers::ALT));
    assert_eq!(Desktop::rect(&window), rect(0, 0, 1920, 1080));
    assert_eq!(window.state(), SurfaceState::Maximized);

    assert!(desktop.key(keys::KEY_F11, Modifiers::ALT));
    assert_eq!(Desktop::rect(&window), rect(760, 260, 400, 300));
    assert_eq!(window.state(), SurfaceState::Restored);
}

#[test]
fn test_shift_and_ctrl_f11_maximize_one_axis() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    assert!(desktop.key(keys::KEY_F11, Modifiers::SHIFT));
    assert_eq!(Desktop::rect(&window), rect(760, 0, 400, 1080));
    assert_eq!(window.state(), SurfaceState::VertMaximized);

    assert!(desktop.key(keys::KEY_F11, Modifiers::CTRL));
    assert_eq!(Desktop::rect(&window), rect(0, 260, 1920, 300));
    assert_eq!(window.state(), SurfaceState::HorizMaximized);

    assert!(!desktop.key(keys::KEY_F11, Modifiers::NONE));
}

#[test]
fn test_ctrl_f4_closes_default_surface_and_alt_f4_closes_all() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let first = desktop.window(&session, 400, 300);
    let second = desktop.window(&session, 400, 300);

    assert!(desktop.key(keys::KEY_F4, Modifiers::CTRL));
    assert_eq!(*desktop.client.closed.lock(), vec![first.id()]);

    assert!(desktop.key(keys::KEY_F4, Modifiers::ALT));
    assert_eq!(
        *desktop.client.closed.lock(),
        vec![first.id(), first.id(), second.id()]
    );
}

#[test]
fn test_f4_without_focused_session_is_not_consumed() {
    let desktop = Desktop::new();
    assert!(!desktop.key(keys::KEY_F4, Modifiers::ALT));
}

#[test]
fn test_alt_tab_cycles_sessions_and_raises() {
    let desktop = Desktop::new();
    let first_session = desktop.open("first");
    let second_session = desktop.open("second");
    let first = desktop.window(&first_session, 400, 300);
    let second = desktop.window(&second_session, 400, 300);
    assert_eq!(desktop.stack.top().unwrap().id(), second.id());

    assert!(desktop.key(keys::KEY_TAB, Modifiers::ALT));
    assert!(Arc::ptr_eq(&desktop.shell.focused_session().unwrap(), &first_session));
    assert_eq!(desktop.stack.top().unwrap().id(), first.id());

    let alt_shift = Modifiers {
        alt: true,
        shift: true,
        ..Modifiers::NONE
    };
    assert!(desktop.key(keys::KEY_TAB, alt_shift));
    assert!(Arc::ptr_eq(&desktop.shell.focused_session().unwrap(), &second_session));

    assert!(!desktop.key(keys::KEY_TAB, Modifiers::NONE));
}

#[test]
fn test_click_focuses_surface_under_cursor() {
    let desktop = Desktop::new();
    let first_session = desktop.open("first");
    let second_session = desktop.open("second");
    let first = desktop.window(&first_session, 400, 300);
    let second = desktop.window(&second_session, 400, 300);
    desktop.move_to(&second_session, &second, 0, 0);

    desktop.pointer(PointerAction::ButtonDown, 1000, 400, PRIMARY, Modifiers::NONE);

    assert!(Arc::ptr_eq(&desktop.shell.focused_surface().unwrap(), &first));
    assert_eq!(desktop.stack.top().unwrap().id(), first.id());
}

#[test]
fn test_click_does_not_focus_when_disabled() {
    let mut config = ShellConfig::default();
    config.focus.click_to_focus = false;
    let desktop = Desktop::with_config(config);
    let first_session = desktop.open("first");
    let second_session = desktop.open("second");
    desktop.window(&first_session, 400, 300);
    let second = desktop.window(&second_session, 400, 300);
    desktop.move_to(&second_session, &second, 0, 0);

    desktop.pointer(PointerAction::ButtonDown, 1000, 400, PRIMARY, Modifiers::NONE);

    assert!(Arc::ptr_eq(&desktop.shell.focused_surface().unwrap(), &second));
}

#[test]
fn test_alt_drag_moves_window_within_display() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    assert!(!desktop.pointer(PointerAction::Motion, 800, 300, NO_BUTTONS, Modifiers::NONE));
    assert!(desktop.pointer(PointerAction::Motion, 700, 100, PRIMARY, Modifiers::ALT));
    assert_eq!(window.top_left(), Point::new(660, 60));

    desktop.pointer(PointerAction::Motion, -2000, -2000, PRIMARY, Modifiers::ALT);
    assert_eq!(window.top_left(), Point::new(0, 0));
}

#[test]
fn test_alt_tertiary_drag_resizes_from_nearest_corner() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    desktop.pointer(PointerAction::Motion, 1150, 550, NO_BUTTONS, Modifiers::NONE);
    assert!(desktop.pointer(PointerAction::Motion, 1250, 600, TERTIARY, Modifiers::ALT));

    assert_eq!(Desktop::rect(&window), rect(760, 260, 500, 350));
}

#[test]
fn test_touch_tap_focuses_and_three_finger_drag_moves() {
    let desktop = Desktop::new();
    let first_session = desktop.open("first");
    let second_session = desktop.open("second");
    let first = desktop.window(&first_session, 400, 300);
    let second = desktop.window(&second_session, 400, 300);
    desktop.move_to(&second_session, &second, 0, 0);

    let tap = TouchEvent {
        points: vec![TouchPoint {
            action: TouchAction::Down,
            position: Point::new(800, 300),
        }],
    };
    assert!(!desktop.shell.handle(&InputEvent::Touch(tap)));
    assert!(Arc::ptr_eq(&desktop.shell.focused_surface().unwrap(), &first));

    let swipe = TouchEvent {
        points: [840, 850, 860]
            .iter()
            .map(|&x| TouchPoint {
                action: TouchAction::Change,
                position: Point::new(x, 300),
            })
            .collect(),
    };
    assert!(desktop.shell.handle(&InputEvent::Touch(swipe)));
    assert_eq!(first.top_left(), Point::new(810, 260));
}

#[test]
fn test_modify_surface_honours_size_limits() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    let spec = SurfaceSpecification {
        width: Some(900),
        max_width: Some(500),
        name: Some("renamed".to_string()),
        ..Default::default()
    };
    desktop.shell.modify_surface(&session, &window, &spec).unwrap();

    assert_eq!(window.window_size(), Size::new(500, 300));
    assert_eq!(window.name(), "renamed");

    let spec = SurfaceSpecification {
        height: Some(100),
        min_height: Some(200),
        ..Default::default()
    };
    desktop.shell.modify_surface(&session, &window, &spec).unwrap();
    assert_eq!(window.window_size(), Size::new(500, 200));
}

#[test]
fn test_resize_is_clipped_to_display_area() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    desktop
        .shell
        .modify_surface(&session, &window, &SurfaceSpecification::resize(Size::new(1500, 300)))
        .unwrap();

    assert_eq!(window.window_size(), Size::new(1160, 300));
}

#[test]
fn test_fullscreen_fills_the_output_holding_the_window() {
    let desktop = Desktop::new();
    desktop.shell.add_display(rect(0, 0, 1920, 1080));
    desktop.shell.add_display(rect(1920, 0, 1280, 1024));
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);
    desktop.move_to(&session, &window, 2000, 100);

    let effective = desktop
        .shell
        .set_surface_attribute(
            &session,
            &window,
            SurfaceAttribute::State,
            SurfaceState::Fullscreen.as_raw(),
        )
        .unwrap();

    assert_eq!(effective, SurfaceState::Fullscreen.as_raw());
    assert_eq!(Desktop::rect(&window), rect(1920, 0, 1280, 1024));

    desktop
        .shell
        .set_surface_attribute(
            &session,
            &window,
            SurfaceAttribute::State,
            SurfaceState::Restored.as_raw(),
        )
        .unwrap();
    assert_eq!(Desktop::rect(&window), rect(2000, 100, 400, 300));
}

#[test]
fn test_minimized_hides_and_restored_shows() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    let set_state = |state: SurfaceState| {
        desktop
            .shell
            .set_surface_attribute(&session, &window, SurfaceAttribute::State, state.as_raw())
            .unwrap()
    };

    set_state(SurfaceState::Minimized);
    assert!(!window.is_visible());
    assert_eq!(Desktop::rect(&window), rect(760, 260, 400, 300));

    set_state(SurfaceState::Restored);
    assert!(window.is_visible());

    // Unknown keeps whatever is in effect
    assert_eq!(
        set_state(SurfaceState::Unknown),
        SurfaceState::Restored.as_raw()
    );
}

#[test]
fn test_removing_last_surface_of_focused_session_moves_focus() {
    let desktop = Desktop::new();
    let first_session = desktop.open("first");
    let second_session = desktop.open("second");
    let first = desktop.window(&first_session, 400, 300);
    let second = desktop.window(&second_session, 400, 300);
    assert!(Arc::ptr_eq(&desktop.shell.focused_session().unwrap(), &second_session));

    desktop.shell.destroy_surface(&second_session, &second).unwrap();

    assert!(Arc::ptr_eq(&desktop.shell.focused_session().unwrap(), &first_session));
    assert!(Arc::ptr_eq(&desktop.shell.focused_surface().unwrap(), &first));
    assert_eq!(desktop.stack.top().unwrap().id(), first.id());
}

#[test]
fn test_client_move_request_follows_pointer_until_release() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    desktop
        .shell
        .request_move(&session, &window, Point::new(800, 300))
        .unwrap();
    assert!(desktop.pointer(PointerAction::Motion, 850, 320, PRIMARY, Modifiers::NONE));
    assert_eq!(window.top_left(), Point::new(810, 280));

    assert!(desktop.pointer(PointerAction::ButtonUp, 850, 320, NO_BUTTONS, Modifiers::NONE));
    assert!(!desktop.pointer(PointerAction::Motion, 900, 400, PRIMARY, Modifiers::NONE));
    assert_eq!(window.top_left(), Point::new(810, 280));
}

#[test]
fn test_client_resize_request_grows_window() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    desktop
        .shell
        .request_resize(&session, &window, Point::new(1150, 550))
        .unwrap();
    assert!(desktop.pointer(PointerAction::Motion, 1170, 570, PRIMARY, Modifiers::NONE));

    assert_eq!(window.window_size(), Size::new(420, 320));
}

#[test]
fn test_drag_and_drop_handle_cleared_on_release() {
    let desktop = Desktop::new();
    let session = desktop.open("app");
    let window = desktop.window(&session, 400, 300);

    desktop
        .shell
        .request_drag_and_drop(&session, &window, b"payload")
        .unwrap();
    desktop.pointer(PointerAction::ButtonUp, 0, 0, NO_BUTTONS, Modifiers::NONE);
    desktop.pointer(PointerAction::ButtonUp, 0, 0, NO_BUTTONS, Modifiers::NONE);

    assert_eq!(
        *desktop.targeter.calls.lock(),
        vec![DragAndDrop::Set(b"payload".to_vec()), DragAndDrop::Cleared]
    );
}

#[test]
fn test_display_area_tracks_displays() {
    let policy = CanonicalWindowManagerPolicy::new(
        Weak::<Shell>::new() as Weak<dyn FocusController>,
        &ShellConfig::default(),
    );
    assert_eq!(policy.display_area(), rect(0, 0, 1920, 1080));

    policy.add_display(rect(0, 0, 1280, 1024));
    policy.add_display(rect(1280, 0, 1920, 1080));
    assert_eq!(policy.display_area(), rect(0, 0, 3200, 1080));

    policy.remove_display(rect(1280, 0, 1920, 1080));
    assert_eq!(policy.display_area(), rect(0, 0, 1280, 1024));

    policy.remove_display(rect(0, 0, 1280, 1024));
    assert_eq!(policy.display_area(), rect(0, 0, 1920, 1080));
}

#[test]
fn test_policy_without_shell_ignores_bindings() {
    let policy = CanonicalWindowManagerPolicy::new(
        Weak::<Shell>::new() as Weak<dyn FocusController>,
        &ShellConfig::default(),
    );
    assert!(!policy.handle_keyboard_event(&KeyboardEvent::down(keys::KEY_F4, Modifiers::ALT)));
    assert!(policy.handle_keyboard_event(&KeyboardEvent::down(keys::KEY_TAB, Modifiers::ALT)));
}

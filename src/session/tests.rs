use super::*;
use crate::geometry::Size;
use crate::stack::InMemorySurfaceStack;
use crate::surface::SurfaceType;

struct Fixture {
    session: Arc<Session>,
    stack: InMemorySurfaceStack,
    listeners: Multiplexer<dyn SessionListener>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            session: Arc::new(Session::new(4242, "app", Arc::new(NullClientSink))),
            stack: InMemorySurfaceStack::new(),
            listeners: Multiplexer::new(),
        }
    }

    fn create(&self, name: &str, surface_type: SurfaceType) -> Arc<Surface> {
        let params =
            SurfaceCreationParameters::new(name, Size::new(100, 100)).of_type(surface_type);
        self.session
            .create_surface(&params, &self.stack, &self.listeners)
    }

    fn destroy(&self, surface: &Arc<Surface>) -> ShellResult<()> {
        self.session
            .destroy_surface(surface, &self.stack, &self.listeners)
    }
}

/// Records whether the session still owned the surface when told about it
#[derive(Default)]
struct OwnershipProbe {
    created: Mutex<Vec<SurfaceId>>,
    destroying_while_owned: Mutex<Vec<bool>>,
}

impl SessionListener for OwnershipProbe {
    fn surface_created(&self, session: &Session, surface: &Arc<Surface>) {
        assert!(session.contains(surface));
        self.created.lock().push(surface.id());
    }

    fn destroying_surface(&self, session: &Session, surface: &Arc<Surface>) {
        self.destroying_while_owned
            .lock()
            .push(session.contains(surface));
    }
}

#[test]
fn test_default_surface_is_oldest_survivor() {
    let fx = Fixture::new();
    assert!(fx.session.default_surface().is_none());

    let first = fx.create("first", SurfaceType::Normal);
    let second = fx.create("second", SurfaceType::Normal);
    assert!(Arc::ptr_eq(&fx.session.default_surface().unwrap(), &first));

    fx.destroy(&first).unwrap();
    assert!(Arc::ptr_eq(&fx.session.default_surface().unwrap(), &second));
}

#[test]
fn test_created_surfaces_join_the_stack() {
    let fx = Fixture::new();
    let surface = fx.create("s", SurfaceType::Normal);

    assert!(fx.stack.contains(surface.id()));
    assert_eq!(surface.session_id(), fx.session.id());
    assert!(Arc::ptr_eq(&fx.session.surface(surface.id()).unwrap(), &surface));
}

#[test]
fn test_surface_after_wraps_and_skips_unfocusable() {
    let fx = Fixture::new();
    let a = fx.create("a", SurfaceType::Normal);
    let _tip = fx.create("tip", SurfaceType::Tip);
    let b = fx.create("b", SurfaceType::Dialog);

    assert!(Arc::ptr_eq(&fx.session.surface_after(&a).unwrap().unwrap(), &b));
    assert!(Arc::ptr_eq(&fx.session.surface_after(&b).unwrap().unwrap(), &a));
}

#[test]
fn test_surface_after_only_surface_is_none() {
    let fx = Fixture::new();
    let a = fx.create("a", SurfaceType::Normal);
    assert!(fx.session.surface_after(&a).unwrap().is_none());
}

#[test]
fn test_surface_after_foreign_surface_is_an_error() {
    let fx = Fixture::new();
    let other = Fixture::new();
    fx.create("a", SurfaceType::Normal);
    let foreign = other.create("foreign", SurfaceType::Normal);

    assert_eq!(
        fx.session.surface_after(&foreign).unwrap_err(),
        ShellError::SurfaceNotFound {
            session: fx.session.id(),
            surface: foreign.id(),
        }
    );
}

#[test]
fn test_listeners_see_surface_while_still_owned() {
    let fx = Fixture::new();
    let probe = Arc::new(OwnershipProbe::default());
    fx.listeners.add(probe.clone());

    let surface = fx.create("s", SurfaceType::Normal);
    fx.destroy(&surface).unwrap();

    assert_eq!(probe.created.lock().as_slice(), &[surface.id()]);
    assert_eq!(probe.destroying_while_owned.lock().as_slice(), &[true]);
    assert!(!fx.session.contains(&surface));
    assert!(!fx.stack.contains(surface.id()));
}

#[test]
fn test_destroying_twice_fails() {
    let fx = Fixture::new();
    let surface = fx.create("s", SurfaceType::Normal);

    fx.destroy(&surface).unwrap();
    assert_eq!(
        fx.destroy(&surface),
        Err(ShellError::SurfaceNotFound {
            session: fx.session.id(),
            surface: surface.id(),
        })
    );
}

#[test]
fn test_hide_and_show_all_surfaces() {
    let fx = Fixture::new();
    let a = fx.create("a", SurfaceType::Normal);
    let b = fx.create("b", SurfaceType::Normal);

    fx.session.hide();
    assert!(!a.is_visible() && !b.is_visible());
    fx.session.show();
    assert!(a.is_visible() && b.is_visible());
}
